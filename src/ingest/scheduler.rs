// src/ingest/scheduler.rs
use std::sync::{Arc, RwLock};

use metrics::counter;
use tokio::task::JoinHandle;

use crate::ingest::sink::OutputSink;
use crate::ingest::{Pipeline, RunOutput};

/// Shared slot holding the most recent run for the HTTP surface.
#[derive(Clone, Default)]
pub struct LatestRun {
    inner: Arc<RwLock<Option<Arc<RunOutput>>>>,
}

impl LatestRun {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<Arc<RunOutput>> {
        self.inner
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn store(&self, output: RunOutput) -> Arc<RunOutput> {
        let output = Arc::new(output);
        *self.inner.write().unwrap_or_else(|p| p.into_inner()) = Some(Arc::clone(&output));
        output
    }
}

/// One scheduled run: execute, emit, publish. A sink failure is logged and
/// the in-memory output is still published.
pub async fn run_tick(pipeline: &Pipeline, sink: &dyn OutputSink, latest: &LatestRun) -> Arc<RunOutput> {
    let output = match pipeline.run_and_emit(sink).await {
        Ok(output) => output,
        Err(err) => {
            tracing::error!(target: "ingest", error = %err, "run output not persisted");
            err.into_output()
        }
    };
    counter!("ingest_runs_total").increment(1);
    tracing::info!(
        target: "ingest",
        total_features = output.summary.total_features(),
        "ingest tick"
    );
    latest.store(output)
}

/// Run the pipeline now and then every `schedule_interval`.
pub fn spawn_scheduler(
    pipeline: Arc<Pipeline>,
    sink: Arc<dyn OutputSink>,
    latest: LatestRun,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(pipeline.config().schedule_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            run_tick(&pipeline, sink.as_ref(), &latest).await;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::DataMode;
    use crate::ingest::config::PipelineConfig;
    use crate::ingest::fallback::NoSnapshots;
    use crate::ingest::sink::{OutputDocument, SinkError};
    use std::sync::Mutex;
    use crate::ingest::types::{FetchError, RawFetcher, SourceId, SourceRequest};

    struct Offline;

    #[async_trait::async_trait]
    impl RawFetcher for Offline {
        async fn fetch_raw(&self, _request: &SourceRequest) -> Result<Vec<u8>, FetchError> {
            Err(FetchError::Transport("offline".into()))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        names: Mutex<Vec<String>>,
    }

    #[async_trait::async_trait]
    impl OutputSink for RecordingSink {
        async fn emit(&self, name: &str, _document: &OutputDocument<'_>) -> Result<(), SinkError> {
            self.names.lock().unwrap().push(name.to_string());
            Ok(())
        }
    }

    struct BrokenSink;

    #[async_trait::async_trait]
    impl OutputSink for BrokenSink {
        async fn emit(&self, name: &str, _document: &OutputDocument<'_>) -> Result<(), SinkError> {
            Err(SinkError::Io {
                path: name.into(),
                source: std::io::Error::other("disk full"),
            })
        }
    }

    fn pipeline() -> Pipeline {
        let config = PipelineConfig {
            per_call_delay_ms: 0,
            ..PipelineConfig::default()
        };
        Pipeline::new(config, Arc::new(Offline), Arc::new(NoSnapshots))
    }

    #[tokio::test]
    async fn tick_publishes_and_emits() {
        let latest = LatestRun::new();
        assert!(latest.get().is_none());
        let sink = RecordingSink::default();
        let out = run_tick(&pipeline(), &sink, &latest).await;
        assert_eq!(sink.names.lock().unwrap().len(), SourceId::ALL.len() + 1);
        assert_eq!(
            latest.get().unwrap().summary.total_features(),
            out.summary.total_features()
        );
    }

    #[tokio::test]
    async fn sink_failure_still_publishes_the_run() {
        let latest = LatestRun::new();
        run_tick(&pipeline(), &BrokenSink, &latest).await;
        let run = latest.get().unwrap();
        assert_eq!(
            run.collection(SourceId::UsgsEarthquakes).unwrap().data_mode(),
            DataMode::Synthetic
        );
    }
}
