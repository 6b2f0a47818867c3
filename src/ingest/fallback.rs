// src/ingest/fallback.rs
//! Recovery for a source whose live attempt produced nothing usable.
//!
//! The chain is ordered and each step is callable on its own:
//! 1. [`FallbackChain::snapshot_step`]: last good collection from a [`SnapshotStore`]
//! 2. [`FallbackChain::synthetic_step`]: seeded synthetic data (if enabled)
//! 3. [`FallbackChain::empty_step`]: an empty, correctly tagged collection

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::feature::{DataMode, FeatureCollection, TrustTier};
use crate::ingest::synthetic::SyntheticGenerator;
use crate::ingest::types::SourceId;

/// Source of cached or demo collections.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load(&self, source: SourceId) -> Option<FeatureCollection>;
}

/// Store with nothing in it.
pub struct NoSnapshots;

#[async_trait]
impl SnapshotStore for NoSnapshots {
    async fn load(&self, _source: SourceId) -> Option<FeatureCollection> {
        None
    }
}

/// Reads `<dir>/<collection-name>.json`, the layout the file sink writes.
#[derive(Debug, Clone)]
pub struct DirSnapshotStore {
    dir: PathBuf,
}

impl DirSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl SnapshotStore for DirSnapshotStore {
    async fn load(&self, source: SourceId) -> Option<FeatureCollection> {
        let path = self.dir.join(format!("{}.json", source.collection_name()));
        let bytes = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) => {
                tracing::debug!(target: "ingest", source = %source, path = %path.display(), error = %e, "no snapshot");
                return None;
            }
        };
        match serde_json::from_slice::<FeatureCollection>(&bytes) {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!(target: "ingest", source = %source, path = %path.display(), error = %e, "unreadable snapshot");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct FallbackChain {
    snapshots: Arc<dyn SnapshotStore>,
    synthetic: Option<SyntheticGenerator>,
}

impl FallbackChain {
    pub fn new(snapshots: Arc<dyn SnapshotStore>, synthetic: Option<SyntheticGenerator>) -> Self {
        Self { snapshots, synthetic }
    }

    /// A usable snapshot relabelled as `snapshot`. Empty snapshots, synthetic
    /// ones and snapshots holding another category are ignored.
    pub async fn snapshot_step(&self, source: SourceId) -> Option<FeatureCollection> {
        let snap = self.snapshots.load(source).await?;
        let usable = !snap.is_empty()
            && snap.trust_tier() != TrustTier::Synthetic
            && snap.data_mode() != DataMode::Synthetic
            && snap.features().iter().all(|f| f.category() == source.category());
        if !usable {
            tracing::debug!(target: "ingest", source = %source, "snapshot not usable");
            return None;
        }
        Some(snap.relabeled(DataMode::Snapshot))
    }

    pub fn synthetic_step(&self, source: SourceId, now: DateTime<Utc>) -> Option<FeatureCollection> {
        self.synthetic
            .as_ref()
            .map(|g| g.generate(source, now))
            .filter(|c| !c.is_empty())
    }

    pub fn empty_step(source: SourceId, trust: TrustTier, now: DateTime<Utc>) -> FeatureCollection {
        FeatureCollection::new(source.display_name(), trust, DataMode::Empty, now, Vec::new())
    }

    /// Walk the chain; always returns a collection.
    pub async fn recover(&self, source: SourceId, trust: TrustTier, now: DateTime<Utc>) -> FeatureCollection {
        if let Some(c) = self.snapshot_step(source).await {
            return c;
        }
        if let Some(c) = self.synthetic_step(source, now) {
            return c;
        }
        Self::empty_step(source, trust, now)
    }
}
