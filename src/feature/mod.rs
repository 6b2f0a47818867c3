//! # Canonical features
//!
//! Every upstream source is normalized into [`CanonicalFeature`] values, and
//! each source's features are grouped into one [`FeatureCollection`].
//!
//! - Category-specific fields live in typed attribute records ([`Attributes`]).
//! - `confidence` is always on the 0..=100 scale, `quality_score` always in `[0.0, 1.0]`.
//! - A feature without Earth coordinates (solar flares) uses [`Location::Unlocated`].
//! - `lineage` is never empty; its last label is the recency/verification class.
//!
//! Both types are value objects: built once per pipeline run, never mutated
//! afterwards. The GeoJSON-shaped wire format lives in [`wire`].

pub mod attributes;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use attributes::{
    AirQualityAttributes, AlertSeverity, AqiCategory, Attributes, EarthquakeAttributes,
    FireAttributes, HazardLevel, NaturalEventAttributes, SolarFlareAttributes,
    VerificationStatus, VolcanoAttributes, WeatherAlertAttributes, WeatherStationAttributes,
};

/// Neutral confidence used when a source provides none.
pub const DEFAULT_CONFIDENCE: u8 = 50;

/// Neutral quality used when a source provides none.
pub const DEFAULT_QUALITY: f64 = 0.5;

/// Lineage label used if a caller hands over an empty lineage.
const UNVERIFIED: &str = "Unverified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    ActiveFire,
    Earthquake,
    WeatherStation,
    WeatherAlert,
    NaturalEvent,
    AirQuality,
    Volcano,
    SolarFlare,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::ActiveFire,
        Category::Earthquake,
        Category::WeatherStation,
        Category::WeatherAlert,
        Category::NaturalEvent,
        Category::AirQuality,
        Category::Volcano,
        Category::SolarFlare,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::ActiveFire => "active_fire",
            Category::Earthquake => "earthquake",
            Category::WeatherStation => "weather_station",
            Category::WeatherAlert => "weather_alert",
            Category::NaturalEvent => "natural_event",
            Category::AirQuality => "air_quality",
            Category::Volcano => "volcano",
            Category::SolarFlare => "solar_flare",
        }
    }
}

/// Coarse provenance class attached to a whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustTier {
    OfficialGovernment,
    OfficialSpaceAgency,
    ScientificInstitution,
    CommunitySensors,
    Synthetic,
}

impl TrustTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrustTier::OfficialGovernment => "official_government",
            TrustTier::OfficialSpaceAgency => "official_space_agency",
            TrustTier::ScientificInstitution => "scientific_institution",
            TrustTier::CommunitySensors => "community_sensors",
            TrustTier::Synthetic => "synthetic",
        }
    }
}

/// Which step of the fallback chain produced a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    Live,
    Snapshot,
    Synthetic,
    Empty,
}

impl DataMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataMode::Live => "live",
            DataMode::Snapshot => "snapshot",
            DataMode::Synthetic => "synthetic",
            DataMode::Empty => "empty",
        }
    }
}

/// A WGS84 point, or the sentinel for phenomena without Earth coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Location {
    Point { lon: f64, lat: f64 },
    Unlocated,
}

impl Location {
    /// Accepts finite coordinates inside the WGS84 ranges only.
    pub fn checked(lon: f64, lat: f64) -> Option<Self> {
        let valid = lon.is_finite()
            && lat.is_finite()
            && (-180.0..=180.0).contains(&lon)
            && (-90.0..=90.0).contains(&lat);
        valid.then_some(Location::Point { lon, lat })
    }

    /// `(lon, lat)` for located features.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match *self {
            Location::Point { lon, lat } => Some((lon, lat)),
            Location::Unlocated => None,
        }
    }
}

/// Ordered provenance labels, e.g. `["NASA", "MODIS/VIIRS", "Real-time"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Lineage(Vec<String>);

impl Lineage {
    /// Blank labels are dropped; an empty result becomes `["Unverified"]`.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels
            .into_iter()
            .map(Into::into)
            .filter(|l| !l.trim().is_empty())
            .collect();
        if labels.is_empty() {
            Self(vec![UNVERIFIED.to_string()])
        } else {
            Self(labels)
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.0
    }

    /// Last label: the recency/verification class ("Real-time", "Synthetic", ...).
    pub fn recency_class(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or(UNVERIFIED)
    }
}

impl<'de> Deserialize<'de> for Lineage {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let labels = Vec::<String>::deserialize(deserializer)?;
        if labels.is_empty() {
            return Err(serde::de::Error::custom("data_lineage must not be empty"));
        }
        Ok(Self(labels))
    }
}

/// The unit of output. Category is derived from the attribute record so the
/// two can never disagree.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "wire::WireFeature")]
pub struct CanonicalFeature {
    location: Location,
    observed_at: DateTime<Utc>,
    source_name: String,
    confidence: u8,
    quality_score: f64,
    lineage: Lineage,
    attributes: Attributes,
}

impl CanonicalFeature {
    /// New feature with neutral confidence/quality; refine with the `with_*` builders.
    pub fn new(
        attributes: Attributes,
        location: Location,
        observed_at: DateTime<Utc>,
        source_name: impl Into<String>,
        lineage: Lineage,
    ) -> Self {
        Self {
            location,
            observed_at,
            source_name: source_name.into(),
            confidence: DEFAULT_CONFIDENCE,
            quality_score: DEFAULT_QUALITY,
            lineage,
            attributes,
        }
    }

    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = confidence.min(100);
        self
    }

    /// Clamped to `[0, 1]`; a non-finite score falls back to [`DEFAULT_QUALITY`].
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality_score = if quality.is_finite() {
            quality.clamp(0.0, 1.0)
        } else {
            DEFAULT_QUALITY
        };
        self
    }

    pub fn category(&self) -> Category {
        self.attributes.category()
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn confidence(&self) -> u8 {
        self.confidence
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn lineage(&self) -> &Lineage {
        &self.lineage
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

/// Collection-level metadata as written to the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMetadata {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub count: usize,
    pub trust_level: TrustTier,
    #[serde(default = "default_data_mode")]
    pub data_mode: DataMode,
}

fn default_data_mode() -> DataMode {
    DataMode::Live
}

/// One source's features plus collection metadata. `count` always equals
/// the number of features.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "wire::WireCollection")]
pub struct FeatureCollection {
    features: Vec<CanonicalFeature>,
    metadata: CollectionMetadata,
}

impl FeatureCollection {
    pub fn new(
        source_label: impl Into<String>,
        trust_tier: TrustTier,
        data_mode: DataMode,
        generated_at: DateTime<Utc>,
        features: Vec<CanonicalFeature>,
    ) -> Self {
        let metadata = CollectionMetadata {
            source: source_label.into(),
            timestamp: generated_at,
            count: features.len(),
            trust_level: trust_tier,
            data_mode,
        };
        Self { features, metadata }
    }

    pub fn features(&self) -> &[CanonicalFeature] {
        &self.features
    }

    pub fn metadata(&self) -> &CollectionMetadata {
        &self.metadata
    }

    pub fn source_label(&self) -> &str {
        &self.metadata.source
    }

    pub fn trust_tier(&self) -> TrustTier {
        self.metadata.trust_level
    }

    pub fn data_mode(&self) -> DataMode {
        self.metadata.data_mode
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.metadata.timestamp
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Same features and label under a different data mode (e.g. a cached
    /// live collection replayed as a snapshot).
    pub fn relabeled(self, data_mode: DataMode) -> Self {
        let Self { features, metadata } = self;
        Self::new(
            metadata.source,
            metadata.trust_level,
            data_mode,
            metadata.timestamp,
            features,
        )
    }
}
