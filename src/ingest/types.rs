// src/ingest/types.rs
use std::fmt;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::feature::{CanonicalFeature, Category, TrustTier};

/// Fixed identifier per upstream source. Declaration order is the run order
/// and the order of every per-source listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SourceId {
    NasaFirms,
    UsgsEarthquakes,
    OpenWeather,
    NoaaAlerts,
    NasaEonet,
    OpenAq,
    SmithsonianVolcanoes,
    SwpcSolarFlares,
}

impl SourceId {
    pub const ALL: [SourceId; 8] = [
        SourceId::NasaFirms,
        SourceId::UsgsEarthquakes,
        SourceId::OpenWeather,
        SourceId::NoaaAlerts,
        SourceId::NasaEonet,
        SourceId::OpenAq,
        SourceId::SmithsonianVolcanoes,
        SourceId::SwpcSolarFlares,
    ];

    /// Output document name (file stem for the file sink).
    pub fn collection_name(self) -> &'static str {
        match self {
            SourceId::NasaFirms => "nasa-firms",
            SourceId::UsgsEarthquakes => "usgs-earthquakes",
            SourceId::OpenWeather => "openweather",
            SourceId::NoaaAlerts => "noaa-alerts",
            SourceId::NasaEonet => "nasa-eonet",
            SourceId::OpenAq => "air-quality",
            SourceId::SmithsonianVolcanoes => "volcanoes",
            SourceId::SwpcSolarFlares => "solar-flares",
        }
    }

    /// Map layer name used by the HTTP surface.
    pub fn layer(self) -> &'static str {
        match self {
            SourceId::NasaFirms => "fires",
            SourceId::UsgsEarthquakes => "earthquakes",
            SourceId::OpenWeather => "weather",
            SourceId::NoaaAlerts => "noaa-alerts",
            SourceId::NasaEonet => "nasa-eonet",
            SourceId::OpenAq => "air-quality",
            SourceId::SmithsonianVolcanoes => "volcanoes",
            SourceId::SwpcSolarFlares => "solar-flares",
        }
    }

    pub fn from_layer(layer: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.layer() == layer)
    }

    /// Human-readable provenance used as the feature `source`.
    pub fn display_name(self) -> &'static str {
        match self {
            SourceId::NasaFirms => "NASA FIRMS",
            SourceId::UsgsEarthquakes => "USGS",
            SourceId::OpenWeather => "OpenWeatherMap",
            SourceId::NoaaAlerts => "NOAA",
            SourceId::NasaEonet => "NASA EONET",
            SourceId::OpenAq => "OpenAQ",
            SourceId::SmithsonianVolcanoes => "Smithsonian GVP",
            SourceId::SwpcSolarFlares => "NOAA SWPC",
        }
    }

    pub fn category(self) -> Category {
        match self {
            SourceId::NasaFirms => Category::ActiveFire,
            SourceId::UsgsEarthquakes => Category::Earthquake,
            SourceId::OpenWeather => Category::WeatherStation,
            SourceId::NoaaAlerts => Category::WeatherAlert,
            SourceId::NasaEonet => Category::NaturalEvent,
            SourceId::OpenAq => Category::AirQuality,
            SourceId::SmithsonianVolcanoes => Category::Volcano,
            SourceId::SwpcSolarFlares => Category::SolarFlare,
        }
    }

    /// Tier of the source's live data.
    pub fn trust_tier(self) -> TrustTier {
        match self {
            SourceId::NasaFirms | SourceId::NasaEonet | SourceId::SwpcSolarFlares => {
                TrustTier::OfficialSpaceAgency
            }
            SourceId::UsgsEarthquakes | SourceId::NoaaAlerts => TrustTier::OfficialGovernment,
            SourceId::SmithsonianVolcanoes => TrustTier::ScientificInstitution,
            SourceId::OpenWeather | SourceId::OpenAq => TrustTier::CommunitySensors,
        }
    }

    /// Sources that cannot be queried without a credential.
    pub fn requires_credential(self) -> bool {
        matches!(self, SourceId::NasaFirms | SourceId::OpenWeather)
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.collection_name())
    }
}

/// Descriptor for one upstream call. Query values may carry credentials, so
/// `Debug` only shows the label.
#[derive(Clone, PartialEq)]
pub struct SourceRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    /// Human label for multi-call sources (the city name for weather).
    pub label: Option<String>,
    /// Seed point `(lon, lat)` the call was made for, if any.
    pub point: Option<(f64, f64)>,
}

impl SourceRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            label: None,
            point: None,
        }
    }

    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_point(mut self, lon: f64, lat: f64) -> Self {
        self.point = Some((lon, lat));
        self
    }
}

impl fmt::Debug for SourceRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRequest")
            .field("label", &self.label)
            .field("query_params", &self.query.len())
            .finish_non_exhaustive()
    }
}

/// Raw bytes handed to an adapter together with the call that produced them.
#[derive(Debug, Clone, Copy)]
pub struct RawPayload<'a> {
    pub request: &'a SourceRequest,
    pub body: &'a [u8],
    /// Used as observation time when the record carries none.
    pub ingested_at: DateTime<Utc>,
}

/// Result of parsing one payload: features plus per-record bookkeeping.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    pub features: Vec<CanonicalFeature>,
    /// Malformed records dropped individually.
    pub skipped: usize,
    /// Well-formed records dropped by the adapter's filtering policy.
    pub filtered: usize,
}

impl ParseOutcome {
    pub(crate) fn with_capacity(n: usize) -> Self {
        Self {
            features: Vec::with_capacity(n),
            ..Self::default()
        }
    }

    pub(crate) fn push(&mut self, feature: CanonicalFeature) {
        self.features.push(feature);
    }

    pub(crate) fn skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn filter(&mut self) {
        self.filtered += 1;
    }

    pub(crate) fn absorb(&mut self, other: ParseOutcome) {
        self.features.extend(other.features);
        self.skipped += other.skipped;
        self.filtered += other.filtered;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("fetch timed out")]
    Timeout,
    #[error("upstream returned HTTP {0}")]
    HttpStatus(u16),
}

/// Why a live source produced nothing usable. Every variant is recovered by
/// the fallback chain; none aborts the run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error(transparent)]
    Transport(#[from] FetchError),
    #[error("parse failure: {0}")]
    Parse(String),
    #[error("missing credential {0}")]
    ConfigurationGap(&'static str),
    #[error("no usable records")]
    NoRecords,
}

impl IngestError {
    pub(crate) fn parse(context: &str, err: impl fmt::Display) -> Self {
        IngestError::Parse(format!("{context}: {err}"))
    }
}

/// One upstream source: knows which calls to make and how to turn each raw
/// payload into canonical features. Parsing is pure; transport lives in
/// [`RawFetcher`].
pub trait SourceAdapter: Send + Sync {
    fn id(&self) -> SourceId;
    fn source_name(&self) -> &'static str;
    fn trust_tier(&self) -> TrustTier;

    /// Calls to make for one run. `Err(ConfigurationGap)` skips the live
    /// attempt entirely.
    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError>;

    /// Whole-payload failures return `Err`; single bad records are counted
    /// in [`ParseOutcome::skipped`].
    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError>;
}

/// Transport capability: fetch the raw bytes for one request.
#[async_trait::async_trait]
pub trait RawFetcher: Send + Sync {
    async fn fetch_raw(&self, request: &SourceRequest) -> Result<Vec<u8>, FetchError>;
}
