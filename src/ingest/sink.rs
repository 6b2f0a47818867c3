// src/ingest/sink.rs
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::feature::FeatureCollection;
use crate::ingest::assembler::RunSummary;

/// Name the run summary is emitted under.
pub const SUMMARY_NAME: &str = "data-summary";

/// A document handed to the sink; serializes to its wire shape.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(untagged)]
pub enum OutputDocument<'a> {
    Collection(&'a FeatureCollection),
    Summary(&'a RunSummary),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing {name}: {source}")]
    Serialize {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Output capability: accepts one named document at a time.
#[async_trait::async_trait]
pub trait OutputSink: Send + Sync {
    async fn emit(&self, name: &str, document: &OutputDocument<'_>) -> Result<(), SinkError>;
}

/// Writes pretty JSON to `<dir>/<name>.json`, via a temp file and rename so
/// readers never see a half-written document.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait::async_trait]
impl OutputSink for FileSink {
    async fn emit(&self, name: &str, document: &OutputDocument<'_>) -> Result<(), SinkError> {
        let body = serde_json::to_vec_pretty(document).map_err(|source| SinkError::Serialize {
            name: name.to_string(),
            source,
        })?;
        let io = |path: &Path| {
            let path = path.to_path_buf();
            move |source| SinkError::Io { path, source }
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io(&self.dir))?;
        let target = self.dir.join(format!("{name}.json"));
        let tmp = self.dir.join(format!(".{name}.json.tmp"));
        tokio::fs::write(&tmp, &body).await.map_err(io(&tmp))?;
        tokio::fs::rename(&tmp, &target).await.map_err(io(&target))?;

        tracing::debug!(target: "ingest", name, path = %target.display(), bytes = body.len(), "document written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{DataMode, TrustTier};
    use chrono::Utc;

    fn empty() -> FeatureCollection {
        FeatureCollection::new("USGS", TrustTier::OfficialGovernment, DataMode::Empty, Utc::now(), Vec::new())
    }

    #[tokio::test]
    async fn file_sink_writes_pretty_json_and_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path().join("public/data"));
        let c = empty();
        sink.emit("usgs-earthquakes", &OutputDocument::Collection(&c)).await.unwrap();

        let path = dir.path().join("public/data/usgs-earthquakes.json");
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\n  \"type\": \"FeatureCollection\""));
        let back: FeatureCollection = serde_json::from_str(&text).unwrap();
        assert_eq!(back, c);
        assert!(!dir.path().join("public/data/.usgs-earthquakes.json.tmp").exists());
    }

    #[tokio::test]
    async fn file_sink_surfaces_io_errors() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"x").unwrap();
        let sink = FileSink::new(&blocker);
        let err = sink
            .emit("volcanoes", &OutputDocument::Collection(&empty()))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Io { .. }));
    }
}
