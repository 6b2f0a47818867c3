// src/ingest/providers/noaa_alerts.rs
use serde::Deserialize;
use serde_json::Value;

use crate::feature::{
    AlertSeverity, Attributes, CanonicalFeature, Category, Lineage, Location, TrustTier,
    VerificationStatus, WeatherAlertAttributes, DEFAULT_CONFIDENCE,
};
use crate::ingest::providers::{decode_record, locate, parse_json, parse_timestamp};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::ingest::{clean_text, truncate_chars};
use crate::quality::QualityStrategy;

pub const NOAA_ACTIVE_ALERTS: &str = "https://api.weather.gov/alerts/active";
const SOURCE_NAME: &str = "NOAA";

/// Alert descriptions are cut to this many characters.
pub const DESCRIPTION_LIMIT: usize = 200;

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    features: Vec<Value>,
}

#[derive(Deserialize)]
struct AlertRecord {
    properties: AlertProperties,
    #[serde(default)]
    geometry: Value,
}

#[derive(Deserialize)]
struct AlertProperties {
    event: Option<String>,
    severity: Option<String>,
    urgency: Option<String>,
    certainty: Option<String>,
    headline: Option<String>,
    description: Option<String>,
    sent: Option<String>,
    effective: Option<String>,
    expires: Option<String>,
}

/// National Weather Service active alerts (CAP over GeoJSON).
#[derive(Default)]
pub struct NoaaAlertsAdapter;

impl NoaaAlertsAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn or_unknown(v: Option<String>) -> String {
    v.map(|s| clean_text(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "Unknown".to_string())
}

impl SourceAdapter for NoaaAlertsAdapter {
    fn id(&self) -> SourceId {
        SourceId::NoaaAlerts
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::OfficialGovernment
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        Ok(vec![SourceRequest::get(NOAA_ACTIVE_ALERTS)])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let env: Envelope = parse_json(payload.body, "NOAA alerts")?;
        let quality =
            QualityStrategy::for_category(Category::WeatherAlert).unit_score(DEFAULT_CONFIDENCE, None);
        let mut out = ParseOutcome::with_capacity(env.features.len());

        for raw in env.features {
            let Some(rec) = decode_record::<AlertRecord>(raw, SOURCE_NAME) else {
                out.skip();
                continue;
            };
            let p = rec.properties;
            let Some(severity) = p.severity.as_deref().and_then(AlertSeverity::parse) else {
                out.filter();
                continue;
            };
            // Zone-based alerts carry no geometry.
            let location = if rec.geometry.is_null() {
                Some(Location::Unlocated)
            } else {
                locate(&rec.geometry)
            };
            let Some(location) = location else {
                out.skip();
                continue;
            };

            let observed_at = p
                .sent
                .as_deref()
                .or(p.effective.as_deref())
                .and_then(parse_timestamp)
                .unwrap_or(payload.ingested_at);

            let attrs = WeatherAlertAttributes {
                event: or_unknown(p.event),
                severity,
                urgency: or_unknown(p.urgency),
                certainty: or_unknown(p.certainty),
                headline: p.headline.map(|h| clean_text(&h)).unwrap_or_default(),
                description: truncate_chars(
                    &clean_text(p.description.as_deref().unwrap_or_default()),
                    DESCRIPTION_LIMIT,
                ),
                effective: p.effective,
                expires: p.expires,
                verification_status: VerificationStatus::Official,
            };

            out.push(
                CanonicalFeature::new(
                    Attributes::WeatherAlert(attrs),
                    location,
                    observed_at,
                    SOURCE_NAME,
                    Lineage::new(["NOAA", "National Weather Service", "Real-time"]),
                )
                .with_quality(quality),
            );
        }
        Ok(out)
    }
}
