// src/ingest/assembler.rs
//! Per-source collection assembly and the cross-source run summary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::feature::{CanonicalFeature, DataMode, FeatureCollection, TrustTier};
use crate::ingest::types::{SourceAdapter, SourceId};

/// Tag an adapter's features as one live collection.
pub fn assemble_collection(
    adapter: &dyn SourceAdapter,
    features: Vec<CanonicalFeature>,
    generated_at: DateTime<Utc>,
) -> FeatureCollection {
    FeatureCollection::new(
        adapter.source_name(),
        adapter.trust_tier(),
        DataMode::Live,
        generated_at,
        features,
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceBreakdown {
    pub feature_count: usize,
    pub trust_level: TrustTier,
    pub data_mode: DataMode,
}

impl From<&FeatureCollection> for SourceBreakdown {
    fn from(c: &FeatureCollection) -> Self {
        Self {
            feature_count: c.len(),
            trust_level: c.trust_tier(),
            data_mode: c.data_mode(),
        }
    }
}

/// Derived view over one run's collections. Holds nothing the collections
/// don't; the total is always recomputed.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    generated_at: DateTime<Utc>,
    sources: BTreeMap<SourceId, SourceBreakdown>,
}

impl RunSummary {
    pub fn from_collections<'a, I>(generated_at: DateTime<Utc>, collections: I) -> Self
    where
        I: IntoIterator<Item = (SourceId, &'a FeatureCollection)>,
    {
        let sources = collections
            .into_iter()
            .map(|(id, c)| (id, SourceBreakdown::from(c)))
            .collect();
        Self { generated_at, sources }
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    pub fn total_features(&self) -> usize {
        self.sources.values().map(|b| b.feature_count).sum()
    }

    pub fn source(&self, id: SourceId) -> Option<&SourceBreakdown> {
        self.sources.get(&id)
    }

    /// Breakdowns in fixed source order.
    pub fn sources(&self) -> impl Iterator<Item = (SourceId, &SourceBreakdown)> {
        self.sources.iter().map(|(id, b)| (*id, b))
    }
}

struct SourcesByName<'a>(&'a BTreeMap<SourceId, SourceBreakdown>);

impl Serialize for SourcesByName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, b) in self.0 {
            map.serialize_entry(id.collection_name(), b)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct SummaryMetadata {
    source: &'static str,
    timestamp: DateTime<Utc>,
    count: usize,
}

impl Serialize for RunSummary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let total = self.total_features();
        let mut s = serializer.serialize_struct("RunSummary", 5)?;
        s.serialize_field("type", "RunSummary")?;
        s.serialize_field("generated_at", &self.generated_at)?;
        s.serialize_field("total_features", &total)?;
        s.serialize_field("sources", &SourcesByName(&self.sources))?;
        s.serialize_field(
            "metadata",
            &SummaryMetadata {
                source: "pipeline",
                timestamp: self.generated_at,
                count: total,
            },
        )?;
        s.end()
    }
}
