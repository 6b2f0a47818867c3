// src/ingest/providers/firms.rs
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

use crate::confidence::{self, RawConfidence};
use crate::feature::{
    Attributes, CanonicalFeature, Category, FireAttributes, Lineage, Location, TrustTier,
};
use crate::ingest::config::{FirmsProduct, PipelineConfig, ENV_FIRMS_KEY};
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const FIRMS_AREA_CSV: &str = "https://firms.modaps.eosdis.nasa.gov/api/area/csv";
const SOURCE_NAME: &str = "NASA FIRMS";

/// Active-fire detections from the FIRMS area API (CSV, one row per pixel).
pub struct FirmsAdapter {
    map_key: Option<String>,
    product: FirmsProduct,
    days_back: u32,
}

impl FirmsAdapter {
    pub fn new(map_key: Option<String>, product: FirmsProduct, days_back: u32) -> Self {
        Self {
            map_key: map_key.filter(|k| !k.trim().is_empty()),
            product,
            // the area endpoint accepts 1..=10 days
            days_back: days_back.clamp(1, 10),
        }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(
            cfg.credentials.firms_map_key().map(str::to_string),
            cfg.firms_product,
            cfg.firms_days_back,
        )
    }

    fn row(&self, cols: &Columns, values: &[&str], ingested_at: DateTime<Utc>) -> Option<CanonicalFeature> {
        let lat_raw = values[cols.lat];
        let lon_raw = values[cols.lon];
        let location = Location::checked(lon_raw.parse().ok()?, lat_raw.parse().ok()?)?;

        let text = |i: Option<usize>| i.map(|i| values[i]).filter(|s| !s.is_empty());
        let num = |i: Option<usize>| {
            text(i)
                .and_then(|s| s.parse::<f64>().ok())
                .filter(|v| v.is_finite())
        };

        let acq_date = text(cols.acq_date);
        let acq_time = text(cols.acq_time).map(|t| format!("{t:0>4}"));
        let observed_at = acquisition_time(acq_date, acq_time.as_deref()).unwrap_or(ingested_at);

        let confidence = confidence::normalize(
            RawConfidence::from(text(cols.confidence)),
            self.product.confidence_kind(),
        );
        let frp = num(cols.frp);
        let quality = QualityStrategy::for_category(Category::ActiveFire).unit_score(confidence, frp);

        let attrs = FireAttributes {
            id: format!(
                "firms_{lat_raw}_{lon_raw}_{}_{}",
                acq_date.unwrap_or("unknown"),
                acq_time.as_deref().unwrap_or("0000")
            ),
            brightness: num(cols.brightness),
            bright_t31: num(cols.bright_t31),
            frp,
            satellite: text(cols.satellite).map(str::to_string),
            instrument: text(cols.instrument)
                .map(str::to_string)
                .or_else(|| Some(self.instrument_label().to_string())),
            daynight: text(cols.daynight).map(str::to_string),
            region: None,
        };

        Some(
            CanonicalFeature::new(
                Attributes::Fire(attrs),
                location,
                observed_at,
                SOURCE_NAME,
                Lineage::new(["NASA", "MODIS/VIIRS", "Real-time"]),
            )
            .with_confidence(confidence)
            .with_quality(quality),
        )
    }

    fn instrument_label(&self) -> &'static str {
        match self.product {
            FirmsProduct::ModisNrt => "MODIS",
            FirmsProduct::ViirsSnppNrt | FirmsProduct::ViirsNoaa20Nrt => "VIIRS",
        }
    }
}

impl SourceAdapter for FirmsAdapter {
    fn id(&self) -> SourceId {
        SourceId::NasaFirms
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::OfficialSpaceAgency
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        let key = self
            .map_key
            .as_deref()
            .ok_or(IngestError::ConfigurationGap(ENV_FIRMS_KEY))?;
        Ok(vec![SourceRequest::get(format!(
            "{FIRMS_AREA_CSV}/{key}/{}/world/{}",
            self.product.as_str(),
            self.days_back
        ))])
    }

    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let text = std::str::from_utf8(payload.body).map_err(|e| IngestError::parse("FIRMS csv", e))?;
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| IngestError::Parse("FIRMS csv: empty body".into()))?;
        let cols = Columns::from_header(header)?;

        let mut out = ParseOutcome::default();
        for line in lines {
            let values: Vec<&str> = line.split(',').map(str::trim).collect();
            if values.len() != cols.width {
                out.skip();
                continue;
            }
            match self.row(&cols, &values, payload.ingested_at) {
                Some(f) => out.push(f),
                None => out.skip(),
            }
        }
        Ok(out)
    }
}

/// Header-resolved column positions. MODIS and VIIRS name the brightness
/// channels differently.
struct Columns {
    width: usize,
    lat: usize,
    lon: usize,
    brightness: Option<usize>,
    bright_t31: Option<usize>,
    frp: Option<usize>,
    confidence: Option<usize>,
    acq_date: Option<usize>,
    acq_time: Option<usize>,
    satellite: Option<usize>,
    instrument: Option<usize>,
    daynight: Option<usize>,
}

impl Columns {
    fn from_header(header: &str) -> Result<Self, IngestError> {
        let names: Vec<&str> = header.split(',').map(str::trim).collect();
        let find = |n: &str| names.iter().position(|h| h.eq_ignore_ascii_case(n));
        let required = |n: &'static str| {
            find(n).ok_or_else(|| IngestError::Parse(format!("FIRMS csv: header lacks {n}")))
        };
        Ok(Self {
            width: names.len(),
            lat: required("latitude")?,
            lon: required("longitude")?,
            brightness: find("brightness").or_else(|| find("bright_ti4")),
            bright_t31: find("bright_t31").or_else(|| find("bright_ti5")),
            frp: find("frp"),
            confidence: find("confidence"),
            acq_date: find("acq_date"),
            acq_time: find("acq_time"),
            satellite: find("satellite"),
            instrument: find("instrument"),
            daynight: find("daynight"),
        })
    }
}

/// `acq_date` + zero-padded `HHMM` in UTC; midnight when the time is unusable.
fn acquisition_time(date: Option<&str>, hhmm: Option<&str>) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(date?, "%Y-%m-%d").ok()?;
    let time = hhmm
        .and_then(|t| NaiveTime::parse_from_str(t, "%H%M").ok())
        .unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time).and_utc())
}
