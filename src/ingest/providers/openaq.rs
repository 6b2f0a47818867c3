// src/ingest/providers/openaq.rs
use serde::Deserialize;
use serde_json::Value;

use crate::feature::{
    AirQualityAttributes, AqiCategory, Attributes, CanonicalFeature, Category, Lineage, Location,
    TrustTier, VerificationStatus, DEFAULT_CONFIDENCE,
};
use crate::ingest::providers::{decode_record, parse_json, parse_timestamp};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const OPENAQ_LATEST: &str = "https://api.openaq.org/v2/latest";
const SOURCE_NAME: &str = "OpenAQ";

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Deserialize)]
struct StationRecord {
    location: Option<String>,
    city: Option<String>,
    country: Option<String>,
    coordinates: Option<Coordinates>,
    #[serde(default)]
    measurements: Vec<Measurement>,
}

#[derive(Deserialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

#[derive(Deserialize)]
struct Measurement {
    parameter: String,
    value: Option<f64>,
    unit: Option<String>,
    #[serde(rename = "lastUpdated")]
    last_updated: Option<String>,
}

/// Latest PM2.5 readings from the OpenAQ sensor network.
#[derive(Default)]
pub struct OpenAqAdapter;

impl OpenAqAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn or_unknown(v: Option<String>) -> String {
    v.filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

impl SourceAdapter for OpenAqAdapter {
    fn id(&self) -> SourceId {
        SourceId::OpenAq
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::CommunitySensors
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        Ok(vec![SourceRequest::get(OPENAQ_LATEST)
            .with_query("limit", 100)
            .with_query("parameter", "pm25")
            .with_query("order_by", "value")
            .with_query("sort", "desc")])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let env: Envelope = parse_json(payload.body, "OpenAQ latest")?;
        let quality =
            QualityStrategy::for_category(Category::AirQuality).unit_score(DEFAULT_CONFIDENCE, None);
        let mut out = ParseOutcome::with_capacity(env.results.len());

        for raw in env.results {
            let Some(rec) = decode_record::<StationRecord>(raw, SOURCE_NAME) else {
                out.skip();
                continue;
            };
            // Both a position and a PM2.5 reading are required.
            let (Some(coords), Some((pm25, value))) = (
                rec.coordinates,
                rec.measurements
                    .into_iter()
                    .filter(|m| m.parameter == "pm25")
                    .find_map(|m| m.value.map(|v| (m, v))),
            ) else {
                out.filter();
                continue;
            };
            let Some(location) = Location::checked(coords.longitude, coords.latitude) else {
                out.skip();
                continue;
            };

            let aqi = AqiCategory::from_pm25(value);
            let observed_at = pm25
                .last_updated
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(payload.ingested_at);

            let attrs = AirQualityAttributes {
                location: or_unknown(rec.location),
                city: or_unknown(rec.city),
                country: or_unknown(rec.country),
                parameter: "PM2.5".to_string(),
                value,
                unit: pm25.unit.unwrap_or_else(|| "µg/m³".to_string()),
                aqi_category: aqi,
                aqi_color: aqi.color().to_string(),
                last_updated: pm25.last_updated,
                verification_status: VerificationStatus::SensorNetwork,
            };

            out.push(
                CanonicalFeature::new(
                    Attributes::AirQuality(attrs),
                    location,
                    observed_at,
                    SOURCE_NAME,
                    Lineage::new(["OpenAQ", "Ground Sensors", "Real-time"]),
                )
                .with_quality(quality),
            );
        }
        Ok(out)
    }
}
