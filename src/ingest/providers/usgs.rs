// src/ingest/providers/usgs.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::feature::{
    Attributes, CanonicalFeature, Category, EarthquakeAttributes, Lineage, Location, TrustTier,
};
use crate::ingest::config::PipelineConfig;
use crate::ingest::providers::{decode_record, parse_json};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const USGS_SUMMARY_FEED: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary";
const SOURCE_NAME: &str = "USGS";

/// Events at or below this magnitude are dropped.
pub const MIN_MAGNITUDE: f64 = 2.5;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    features: Vec<Value>,
}

#[derive(Deserialize)]
struct QuakeRecord {
    id: Option<String>,
    properties: QuakeProperties,
    geometry: QuakeGeometry,
}

#[derive(Deserialize)]
struct QuakeProperties {
    mag: Option<f64>,
    place: Option<String>,
    /// Epoch milliseconds.
    time: Option<i64>,
    alert: Option<String>,
    tsunami: Option<u8>,
}

#[derive(Deserialize)]
struct QuakeGeometry {
    coordinates: Vec<Option<f64>>,
}

/// USGS summary GeoJSON feed.
pub struct UsgsAdapter {
    days_back: u32,
}

impl UsgsAdapter {
    pub fn new(days_back: u32) -> Self {
        Self { days_back }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(cfg.earthquake_days_back)
    }

    fn feed_url(&self) -> String {
        let window = match self.days_back {
            0 | 1 => "day",
            2..=7 => "week",
            _ => "month",
        };
        format!("{USGS_SUMMARY_FEED}/all_{window}.geojson")
    }
}

impl SourceAdapter for UsgsAdapter {
    fn id(&self) -> SourceId {
        SourceId::UsgsEarthquakes
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::OfficialGovernment
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        Ok(vec![SourceRequest::get(self.feed_url())])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let env: Envelope = parse_json(payload.body, "USGS geojson")?;
        let strategy = QualityStrategy::for_category(Category::Earthquake);
        let mut out = ParseOutcome::with_capacity(env.features.len());

        for raw in env.features {
            let Some(rec) = decode_record::<QuakeRecord>(raw, SOURCE_NAME) else {
                out.skip();
                continue;
            };
            // A missing magnitude is never above the threshold.
            let magnitude = match rec.properties.mag {
                Some(m) if m > MIN_MAGNITUDE => m,
                _ => {
                    out.filter();
                    continue;
                }
            };
            let coords = &rec.geometry.coordinates;
            let location = match (coords.first().copied().flatten(), coords.get(1).copied().flatten()) {
                (Some(lon), Some(lat)) => Location::checked(lon, lat),
                _ => None,
            };
            let Some(location) = location else {
                out.skip();
                continue;
            };

            let observed_at = rec
                .properties
                .time
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .unwrap_or(payload.ingested_at);
            let confidence = crate::feature::DEFAULT_CONFIDENCE;

            let attrs = EarthquakeAttributes {
                event_id: rec.id,
                magnitude,
                depth: coords.get(2).copied().flatten(),
                place: rec
                    .properties
                    .place
                    .filter(|p| !p.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                alert: rec.properties.alert,
                tsunami: rec.properties.tsunami.unwrap_or(0),
            };

            out.push(
                CanonicalFeature::new(
                    Attributes::Earthquake(attrs),
                    location,
                    observed_at,
                    SOURCE_NAME,
                    Lineage::new(["USGS", "Seismic Network", "Real-time"]),
                )
                .with_confidence(confidence)
                .with_quality(strategy.unit_score(confidence, Some(magnitude))),
            );
        }
        Ok(out)
    }
}
