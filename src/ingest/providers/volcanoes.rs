// src/ingest/providers/volcanoes.rs
use serde::Deserialize;
use serde_json::Value;

use crate::feature::{
    Attributes, CanonicalFeature, Category, HazardLevel, Lineage, Location, TrustTier,
    VerificationStatus, VolcanoAttributes, DEFAULT_CONFIDENCE,
};
use crate::ingest::providers::{decode_record, parse_json};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const GVP_VOLCANOES: &str = "https://volcano.si.edu/api/v1/volcanoes";
const SOURCE_NAME: &str = "Smithsonian GVP";

#[derive(Deserialize)]
struct VolcanoRecord {
    name: String,
    lat: f64,
    lon: f64,
    status: Option<String>,
    country: Option<String>,
}

/// Volcano status list from the Global Volcanism Program.
#[derive(Default)]
pub struct VolcanoAdapter;

impl VolcanoAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl SourceAdapter for VolcanoAdapter {
    fn id(&self) -> SourceId {
        SourceId::SmithsonianVolcanoes
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::ScientificInstitution
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        Ok(vec![SourceRequest::get(GVP_VOLCANOES)])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let records: Vec<Value> = parse_json(payload.body, "GVP volcanoes")?;
        let quality =
            QualityStrategy::for_category(Category::Volcano).unit_score(DEFAULT_CONFIDENCE, None);
        let mut out = ParseOutcome::with_capacity(records.len());

        for raw in records {
            let Some(v) = decode_record::<VolcanoRecord>(raw, SOURCE_NAME) else {
                out.skip();
                continue;
            };
            let Some(location) = Location::checked(v.lon, v.lat) else {
                out.skip();
                continue;
            };
            let status = v
                .status
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "unknown".to_string());

            let attrs = VolcanoAttributes {
                name: v.name,
                hazard_level: HazardLevel::from_status(&status),
                status,
                country: v.country.unwrap_or_else(|| "Unknown".to_string()),
                verification_status: VerificationStatus::ExpertVerified,
            };

            out.push(
                CanonicalFeature::new(
                    Attributes::Volcano(attrs),
                    location,
                    payload.ingested_at,
                    SOURCE_NAME,
                    Lineage::new(["Smithsonian", "Global Volcanism Program", "Expert Review"]),
                )
                .with_quality(quality),
            );
        }
        Ok(out)
    }
}
