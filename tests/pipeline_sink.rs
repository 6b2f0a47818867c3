// tests/pipeline_sink.rs

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::{test_config, FakeFetcher, MemorySink};
use geohazard_ingest::feature::FeatureCollection;
use geohazard_ingest::ingest::fallback::NoSnapshots;
use geohazard_ingest::ingest::sink::{FileSink, OutputDocument, OutputSink, SinkError};
use geohazard_ingest::ingest::types::SourceId;
use geohazard_ingest::{Pipeline, RunError};

#[tokio::test]
async fn file_sink_receives_every_collection_and_the_summary() {
    let dir = tempfile::tempdir().unwrap();
    let sink = FileSink::new(dir.path().join("public/data"));
    let pipeline = Pipeline::new(test_config(), Arc::new(FakeFetcher::healthy()), Arc::new(NoSnapshots));
    let out = pipeline.run_and_emit(&sink).await.expect("emit");

    for id in SourceId::ALL {
        let path = sink.dir().join(format!("{}.json", id.collection_name()));
        let text = std::fs::read_to_string(&path).unwrap();
        let back: FeatureCollection = serde_json::from_str(&text).unwrap();
        assert_eq!(&back, out.collection(id).unwrap());
    }

    let summary: serde_json::Value =
        serde_json::from_slice(&std::fs::read(sink.dir().join("data-summary.json")).unwrap()).unwrap();
    assert_eq!(summary["type"], "RunSummary");
    assert_eq!(summary["total_features"], out.summary.total_features());
    assert_eq!(summary["metadata"]["count"], out.summary.total_features());
    assert_eq!(summary["sources"]["usgs-earthquakes"]["feature_count"], 2);
    assert_eq!(summary["sources"]["usgs-earthquakes"]["data_mode"], "live");
}

#[tokio::test]
async fn emission_order_is_sources_then_summary() {
    let sink = MemorySink::new();
    let pipeline = Pipeline::new(test_config(), Arc::new(FakeFetcher::offline()), Arc::new(NoSnapshots));
    pipeline.run_and_emit(&sink).await.unwrap();

    let mut expected: Vec<String> = SourceId::ALL
        .iter()
        .map(|s| s.collection_name().to_string())
        .collect();
    expected.push("data-summary".into());
    assert_eq!(sink.names(), expected);

    let summary = sink.get("data-summary").expect("summary emitted");
    assert_eq!(summary["type"], "RunSummary");
    let quakes = sink.get("usgs-earthquakes").expect("collection emitted");
    assert_eq!(quakes["metadata"]["data_mode"], "synthetic");
}

/// Accepts the first `ok` documents, then fails.
struct FlakySink {
    ok: usize,
    seen: std::sync::Mutex<usize>,
}

#[async_trait]
impl OutputSink for FlakySink {
    async fn emit(&self, name: &str, _document: &OutputDocument<'_>) -> Result<(), SinkError> {
        let mut seen = self.seen.lock().unwrap();
        *seen += 1;
        if *seen > self.ok {
            return Err(SinkError::Io {
                path: name.into(),
                source: std::io::Error::other("read-only filesystem"),
            });
        }
        Ok(())
    }
}

#[tokio::test]
async fn sink_failure_is_surfaced_with_the_run_intact() {
    let pipeline = Pipeline::new(test_config(), Arc::new(FakeFetcher::healthy()), Arc::new(NoSnapshots));
    let sink = FlakySink {
        ok: 3,
        seen: Default::default(),
    };
    let err = pipeline.run_and_emit(&sink).await.unwrap_err();
    assert!(err.to_string().contains("read-only filesystem"));

    let RunError::Sink { source, .. } = &err;
    assert!(matches!(source, SinkError::Io { .. }));

    let output = err.into_output();
    assert_eq!(output.entries.len(), SourceId::ALL.len());
    assert_eq!(output.collection(SourceId::OpenAq).unwrap().len(), 2);
    assert_eq!(*sink.seen.lock().unwrap(), 4);
}
