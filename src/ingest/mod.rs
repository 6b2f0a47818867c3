// src/ingest/mod.rs
pub mod assembler;
pub mod config;
pub mod fallback;
pub mod fetch;
pub mod providers;
pub mod scheduler;
pub mod seeds;
pub mod sink;
pub mod synthetic;
pub mod types;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use thiserror::Error;
use tokio::task::JoinSet;

use crate::feature::{DataMode, FeatureCollection};
use crate::ingest::assembler::{assemble_collection, RunSummary};
use crate::ingest::config::PipelineConfig;
use crate::ingest::fallback::{FallbackChain, SnapshotStore};
use crate::ingest::sink::{OutputDocument, OutputSink, SinkError, SUMMARY_NAME};
use crate::ingest::synthetic::SyntheticGenerator;
use crate::ingest::types::{
    FetchError, IngestError, ParseOutcome, RawFetcher, RawPayload, SourceAdapter, SourceId,
};

/// One-time metrics registration (so series show up on /metrics).
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "ingest_features_total",
            "Features emitted per source, any data mode."
        );
        describe_counter!(
            "ingest_skipped_records_total",
            "Malformed records dropped by adapters."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Sources served from a fallback step instead of live data."
        );
        describe_counter!(
            "ingest_fetch_errors_total",
            "Upstream fetch failures (transport, timeout, HTTP status)."
        );
        describe_counter!("ingest_runs_total", "Completed scheduled pipeline runs.");
        describe_histogram!("ingest_parse_ms", "Adapter parse time in milliseconds.");
        describe_gauge!(
            "ingest_pipeline_last_run_ts",
            "Unix ts when ingest pipeline last ran."
        );
    });
}

/// Clean upstream free text: decode entities, strip tags, normalize curly
/// quotes, collapse whitespace.
pub fn clean_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: OnceCell<regex::Regex> = OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
    out = re_tags.replace_all(&out, " ").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: OnceCell<regex::Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").expect("whitespace regex"));
    re_ws.replace_all(&out, " ").trim().to_string()
}

/// First `max` characters (not bytes) of `s`.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// What happened to one source in a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub source: SourceId,
    pub outcome: DataMode,
    pub record_count: usize,
    pub skipped: usize,
    pub filtered: usize,
    /// Why the live attempt was not used; `None` for live outcomes.
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SourceRun {
    pub source: SourceId,
    pub collection: FeatureCollection,
    pub report: SourceReport,
}

/// Everything one run produced, in fixed source order.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<SourceRun>,
    pub summary: RunSummary,
}

impl RunOutput {
    pub fn collection(&self, source: SourceId) -> Option<&FeatureCollection> {
        self.entry(source).map(|e| &e.collection)
    }

    pub fn report(&self, source: SourceId) -> Option<&SourceReport> {
        self.entry(source).map(|e| &e.report)
    }

    fn entry(&self, source: SourceId) -> Option<&SourceRun> {
        self.entries.iter().find(|e| e.source == source)
    }
}

#[derive(Debug, Error)]
pub enum RunError {
    /// The run itself completed; only persisting it failed.
    #[error("emitting run output: {source}")]
    Sink {
        #[source]
        source: SinkError,
        output: Box<RunOutput>,
    },
}

impl RunError {
    pub fn into_output(self) -> RunOutput {
        match self {
            RunError::Sink { output, .. } => *output,
        }
    }
}

/// Live attempt for one source, before any fallback.
#[derive(Debug, Default)]
struct LiveAttempt {
    parsed: ParseOutcome,
    failure: Option<IngestError>,
}

/// Sequences adapters, isolates their failures and assembles the run.
pub struct Pipeline {
    config: PipelineConfig,
    adapters: Vec<Arc<dyn SourceAdapter>>,
    fetcher: Arc<dyn RawFetcher>,
    fallback: FallbackChain,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        fetcher: Arc<dyn RawFetcher>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        let adapters = providers::all(&config);
        Self::with_adapters(config, adapters, fetcher, snapshots)
    }

    pub fn with_adapters(
        config: PipelineConfig,
        mut adapters: Vec<Arc<dyn SourceAdapter>>,
        fetcher: Arc<dyn RawFetcher>,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Self {
        adapters.sort_by_key(|a| a.id());
        adapters.dedup_by_key(|a| a.id());
        let synthetic = config
            .synthetic_fallback
            .then(|| SyntheticGenerator::from_config(&config));
        Self {
            fallback: FallbackChain::new(snapshots, synthetic),
            config,
            adapters,
            fetcher,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub async fn run(&self) -> RunOutput {
        self.run_at(Utc::now()).await
    }

    /// One full run. Sources are fetched concurrently; results are keyed by
    /// source id so the output never depends on completion order.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunOutput {
        ensure_metrics_described();

        let timeout = self.config.fetch_timeout();
        let delay = self.config.per_call_delay();
        let mut tasks = JoinSet::new();
        for adapter in &self.adapters {
            let adapter = Arc::clone(adapter);
            let fetcher = Arc::clone(&self.fetcher);
            tasks.spawn(async move {
                let id = adapter.id();
                (id, live_attempt(adapter, fetcher, timeout, delay, now).await)
            });
        }

        let mut attempts: BTreeMap<SourceId, LiveAttempt> = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((id, attempt)) => {
                    attempts.insert(id, attempt);
                }
                Err(e) => tracing::error!(target: "ingest", error = %e, "adapter task failed"),
            }
        }

        let mut entries = Vec::with_capacity(self.adapters.len());
        for adapter in &self.adapters {
            let id = adapter.id();
            let attempt = attempts.remove(&id).unwrap_or_else(|| LiveAttempt {
                parsed: ParseOutcome::default(),
                failure: Some(IngestError::Parse("adapter task aborted".into())),
            });
            entries.push(self.resolve(adapter.as_ref(), attempt, now).await);
        }

        let summary =
            RunSummary::from_collections(now, entries.iter().map(|e| (e.source, &e.collection)));
        gauge!("ingest_pipeline_last_run_ts").set(now.timestamp().max(0) as f64);
        tracing::info!(
            target: "ingest",
            total_features = summary.total_features(),
            sources = entries.len(),
            "pipeline run complete"
        );

        RunOutput {
            generated_at: now,
            entries,
            summary,
        }
    }

    /// Run, then emit every collection and the summary through `sink`.
    pub async fn run_and_emit(&self, sink: &dyn OutputSink) -> Result<RunOutput, RunError> {
        let output = self.run().await;
        match emit_run(&output, sink).await {
            Ok(()) => Ok(output),
            Err(source) => Err(RunError::Sink {
                source,
                output: Box::new(output),
            }),
        }
    }

    async fn resolve(
        &self,
        adapter: &dyn SourceAdapter,
        attempt: LiveAttempt,
        now: DateTime<Utc>,
    ) -> SourceRun {
        let id = adapter.id();
        let LiveAttempt { parsed, failure } = attempt;
        let (skipped, filtered) = (parsed.skipped, parsed.filtered);
        counter!("ingest_skipped_records_total", "source" => id.collection_name())
            .increment(skipped as u64);

        let (collection, reason) = match failure {
            None => (assemble_collection(adapter, parsed.features, now), None),
            Some(err) => {
                let c = self.fallback.recover(id, adapter.trust_tier(), now).await;
                tracing::warn!(
                    target: "ingest",
                    source = %id,
                    reason = %err,
                    outcome = c.data_mode().as_str(),
                    "live data unavailable, using fallback"
                );
                counter!(
                    "ingest_fallback_total",
                    "source" => id.collection_name(),
                    "outcome" => c.data_mode().as_str()
                )
                .increment(1);
                (c, Some(err.to_string()))
            }
        };

        counter!("ingest_features_total", "source" => id.collection_name())
            .increment(collection.len() as u64);
        tracing::info!(
            target: "ingest",
            source = %id,
            outcome = collection.data_mode().as_str(),
            record_count = collection.len(),
            skipped,
            "source complete"
        );

        SourceRun {
            source: id,
            report: SourceReport {
                source: id,
                outcome: collection.data_mode(),
                record_count: collection.len(),
                skipped,
                filtered,
                reason,
            },
            collection,
        }
    }
}

/// Fetch and parse every request of one source. Calls within a source run
/// sequentially with `delay` between them; a failed call in a multi-call
/// source only costs that call.
async fn live_attempt(
    adapter: Arc<dyn SourceAdapter>,
    fetcher: Arc<dyn RawFetcher>,
    timeout: Duration,
    delay: Duration,
    now: DateTime<Utc>,
) -> LiveAttempt {
    let id = adapter.id();
    let requests = match adapter.requests() {
        Ok(r) => r,
        Err(e) => {
            return LiveAttempt {
                failure: Some(e),
                ..LiveAttempt::default()
            }
        }
    };

    let multi = requests.len() > 1;
    let mut parsed = ParseOutcome::default();
    let mut last_error = None;
    for (i, request) in requests.iter().enumerate() {
        if i > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let fetched = tokio::time::timeout(timeout, fetcher.fetch_raw(request))
            .await
            .unwrap_or(Err(FetchError::Timeout));
        let body = match fetched {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(target: "ingest", source = %id, label = ?request.label, error = %e, "fetch failed");
                counter!("ingest_fetch_errors_total", "source" => id.collection_name()).increment(1);
                if multi {
                    parsed.skip();
                }
                last_error = Some(IngestError::from(e));
                continue;
            }
        };

        let t0 = Instant::now();
        let payload = RawPayload {
            request,
            body: &body,
            ingested_at: now,
        };
        let result = adapter.parse(&payload);
        histogram!("ingest_parse_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        match result {
            Ok(outcome) => parsed.absorb(outcome),
            Err(e) => {
                tracing::warn!(target: "ingest", source = %id, error = %e, "payload rejected");
                if multi {
                    parsed.skip();
                }
                last_error = Some(e);
            }
        }
    }

    let failure = if parsed.features.is_empty() {
        Some(last_error.unwrap_or(IngestError::NoRecords))
    } else {
        None
    };
    LiveAttempt { parsed, failure }
}

/// Emit each collection under its name, then the summary. Stops at the
/// first sink error; `output` is left untouched either way.
pub async fn emit_run(output: &RunOutput, sink: &dyn OutputSink) -> Result<(), SinkError> {
    for entry in &output.entries {
        sink.emit(
            entry.source.collection_name(),
            &OutputDocument::Collection(&entry.collection),
        )
        .await?;
    }
    sink.emit(SUMMARY_NAME, &OutputDocument::Summary(&output.summary))
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::TrustTier;
    use crate::ingest::fallback::NoSnapshots;
    use crate::ingest::types::SourceRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn clean_text_decodes_strips_and_collapses() {
        let s = "  <b>Flood&nbsp;&nbsp;Warning</b>\n\n for “Lower” river.  ";
        assert_eq!(clean_text(s), "Flood Warning for \"Lower\" river.");
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate_chars("São Paulo", 3), "São");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 0), "");
    }

    struct CountingFetcher {
        calls: AtomicUsize,
        fail_label: Option<&'static str>,
    }

    #[async_trait::async_trait]
    impl RawFetcher for CountingFetcher {
        async fn fetch_raw(&self, request: &SourceRequest) -> Result<Vec<u8>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if request.label.as_deref() == self.fail_label {
                return Err(FetchError::HttpStatus(503));
            }
            Ok(request.label.clone().unwrap_or_default().into_bytes())
        }
    }

    /// Three calls; each payload becomes one volcano named after the label.
    struct LabelAdapter;

    impl SourceAdapter for LabelAdapter {
        fn id(&self) -> SourceId {
            SourceId::SmithsonianVolcanoes
        }
        fn source_name(&self) -> &'static str {
            "Smithsonian GVP"
        }
        fn trust_tier(&self) -> TrustTier {
            TrustTier::ScientificInstitution
        }
        fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
            Ok(["a", "b", "c"]
                .into_iter()
                .map(|l| SourceRequest::get("https://volcano.test").with_label(l))
                .collect())
        }
        fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
            use crate::feature::*;
            let name = String::from_utf8_lossy(payload.body).to_string();
            if name == "c" {
                return Err(IngestError::Parse("bad".into()));
            }
            let mut out = ParseOutcome::default();
            out.push(CanonicalFeature::new(
                Attributes::Volcano(VolcanoAttributes {
                    name,
                    status: "active".into(),
                    country: "Italy".into(),
                    hazard_level: HazardLevel::Moderate,
                    verification_status: VerificationStatus::ExpertVerified,
                }),
                Location::Point { lon: 15.0, lat: 37.7 },
                payload.ingested_at,
                "Smithsonian GVP",
                Lineage::new(["Smithsonian"]),
            ));
            Ok(out)
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            per_call_delay_ms: 0,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn failed_calls_in_a_multi_call_source_only_cost_that_call() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail_label: Some("b"),
        });
        let pipeline = Pipeline::with_adapters(
            config(),
            vec![Arc::new(LabelAdapter)],
            fetcher.clone(),
            Arc::new(NoSnapshots),
        );
        let out = pipeline.run().await;
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        let report = out.report(SourceId::SmithsonianVolcanoes).unwrap();
        assert_eq!(report.outcome, DataMode::Live);
        assert_eq!(report.record_count, 1);
        assert_eq!(report.skipped, 2);
        assert_eq!(out.summary.total_features(), 1);
    }

    #[tokio::test]
    async fn configuration_gap_skips_the_live_call() {
        let fetcher = Arc::new(CountingFetcher {
            calls: AtomicUsize::new(0),
            fail_label: None,
        });
        let pipeline = Pipeline::new(config(), fetcher.clone(), Arc::new(NoSnapshots));
        let out = pipeline.run().await;
        // No FIRMS key: the fire source never reaches the fetcher.
        let report = out.report(SourceId::NasaFirms).unwrap();
        assert_eq!(report.outcome, DataMode::Synthetic);
        assert!(report.reason.as_deref().unwrap().contains("FIRMS_API_KEY"));
        assert_eq!(out.entries.len(), SourceId::ALL.len());
        let order: Vec<_> = out.entries.iter().map(|e| e.source).collect();
        assert_eq!(order, SourceId::ALL.to_vec());
    }
}
