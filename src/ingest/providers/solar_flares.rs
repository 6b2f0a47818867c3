// src/ingest/providers/solar_flares.rs
use std::cmp::Reverse;

use serde::Deserialize;
use serde_json::Value;

use crate::feature::{
    Attributes, CanonicalFeature, Category, Lineage, Location, SolarFlareAttributes, TrustTier,
    VerificationStatus, DEFAULT_CONFIDENCE,
};
use crate::ingest::providers::{decode_record, parse_json, parse_timestamp};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const SWPC_XRAY_FLARES: &str =
    "https://services.swpc.noaa.gov/json/goes/primary/xray-flares-latest.json";
const SOURCE_NAME: &str = "NOAA SWPC";

/// Only the most recent flares are kept.
pub const MAX_FLARES: usize = 20;

#[derive(Deserialize)]
struct FlareRecord {
    max_class: Option<String>,
    begin_time: Option<String>,
    max_time: Option<String>,
    end_time: Option<String>,
    #[serde(default)]
    active_region: Value,
}

/// GOES X-ray flare list. Flares have no Earth position.
#[derive(Default)]
pub struct SolarFlareAdapter;

impl SolarFlareAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn region_label(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl SourceAdapter for SolarFlareAdapter {
    fn id(&self) -> SourceId {
        SourceId::SwpcSolarFlares
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::OfficialSpaceAgency
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        Ok(vec![SourceRequest::get(SWPC_XRAY_FLARES)])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let records: Vec<Value> = parse_json(payload.body, "SWPC x-ray flares")?;
        let mut out = ParseOutcome::with_capacity(records.len().min(MAX_FLARES));

        let mut flares: Vec<FlareRecord> = Vec::with_capacity(records.len());
        for raw in records {
            match decode_record::<FlareRecord>(raw, SOURCE_NAME) {
                Some(f) => flares.push(f),
                None => out.skip(),
            }
        }
        // Newest first; undated flares sort last. The sort is stable, so feed
        // order breaks ties.
        flares.sort_by_key(|f| Reverse(f.begin_time.as_deref().and_then(parse_timestamp)));
        out.filtered += flares.len().saturating_sub(MAX_FLARES);
        flares.truncate(MAX_FLARES);

        let quality =
            QualityStrategy::for_category(Category::SolarFlare).unit_score(DEFAULT_CONFIDENCE, None);
        for f in flares {
            let observed_at = f
                .max_time
                .as_deref()
                .or(f.begin_time.as_deref())
                .and_then(parse_timestamp)
                .unwrap_or(payload.ingested_at);
            let attrs = SolarFlareAttributes {
                flare_class: f
                    .max_class
                    .filter(|c| !c.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                active_region: region_label(&f.active_region),
                begin_time: f.begin_time,
                max_time: f.max_time,
                end_time: f.end_time,
                verification_status: VerificationStatus::SatelliteConfirmed,
            };
            out.push(
                CanonicalFeature::new(
                    Attributes::SolarFlare(attrs),
                    Location::Unlocated,
                    observed_at,
                    SOURCE_NAME,
                    Lineage::new(["NOAA", "GOES Satellite", "Real-time"]),
                )
                .with_quality(quality),
            );
        }
        Ok(out)
    }
}
