// src/ingest/providers/eonet.rs
use serde::Deserialize;
use serde_json::Value;

use crate::feature::{
    Attributes, CanonicalFeature, Category, Lineage, NaturalEventAttributes, TrustTier,
    VerificationStatus, DEFAULT_CONFIDENCE,
};
use crate::ingest::providers::{decode_record, locate, parse_json, parse_timestamp};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const EONET_EVENTS: &str = "https://eonet.gsfc.nasa.gov/api/v3/events";
const SOURCE_NAME: &str = "NASA EONET";

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Deserialize)]
struct EventRecord {
    id: String,
    title: Option<String>,
    link: Option<String>,
    closed: Option<String>,
    #[serde(default)]
    categories: Vec<CategoryRef>,
    #[serde(default)]
    geometry: Vec<Value>,
}

#[derive(Deserialize)]
struct CategoryRef {
    title: Option<String>,
}

/// Open natural events tracked by the Earth Observatory.
#[derive(Default)]
pub struct EonetAdapter;

impl EonetAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// The geometry with the latest `date`; among equal or missing dates the
/// last one listed wins.
fn latest_geometry(geometries: &[Value]) -> Option<&Value> {
    geometries
        .iter()
        .max_by_key(|g| g.get("date").and_then(Value::as_str).and_then(parse_timestamp))
}

impl SourceAdapter for EonetAdapter {
    fn id(&self) -> SourceId {
        SourceId::NasaEonet
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::OfficialSpaceAgency
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        Ok(vec![SourceRequest::get(EONET_EVENTS)
            .with_query("limit", 100)
            .with_query("status", "open")])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let env: Envelope = parse_json(payload.body, "EONET events")?;
        let quality =
            QualityStrategy::for_category(Category::NaturalEvent).unit_score(DEFAULT_CONFIDENCE, None);
        let mut out = ParseOutcome::with_capacity(env.events.len());

        for raw in env.events {
            let Some(ev) = decode_record::<EventRecord>(raw, SOURCE_NAME) else {
                out.skip();
                continue;
            };
            let Some(geom) = latest_geometry(&ev.geometry) else {
                out.skip();
                continue;
            };
            let Some(location) = locate(geom) else {
                out.skip();
                continue;
            };

            let date = geom.get("date").and_then(Value::as_str).map(str::to_string);
            let observed_at = date
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(payload.ingested_at);

            let attrs = NaturalEventAttributes {
                event_id: ev.id,
                title: ev
                    .title
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                categories: ev.categories.into_iter().filter_map(|c| c.title).collect(),
                link: ev.link,
                closed: ev.closed,
                magnitude: geom.get("magnitudeValue").and_then(Value::as_f64),
                magnitude_unit: geom
                    .get("magnitudeUnit")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                date,
                verification_status: VerificationStatus::SatelliteConfirmed,
            };

            out.push(
                CanonicalFeature::new(
                    Attributes::NaturalEvent(attrs),
                    location,
                    observed_at,
                    SOURCE_NAME,
                    Lineage::new(["NASA", "EONET", "Satellite Observation"]),
                )
                .with_quality(quality),
            );
        }
        Ok(out)
    }
}
