//! Category-specific attribute records.
//!
//! Each record's field names are the `properties` keys downstream consumers
//! read, so renaming a field is a wire-contract change. Optional fields are
//! always written (as `null`) to keep keys stable within a category.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Category;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Attributes {
    Fire(FireAttributes),
    Earthquake(EarthquakeAttributes),
    WeatherStation(WeatherStationAttributes),
    WeatherAlert(WeatherAlertAttributes),
    NaturalEvent(NaturalEventAttributes),
    AirQuality(AirQualityAttributes),
    Volcano(VolcanoAttributes),
    SolarFlare(SolarFlareAttributes),
}

impl Attributes {
    pub fn category(&self) -> Category {
        match self {
            Attributes::Fire(_) => Category::ActiveFire,
            Attributes::Earthquake(_) => Category::Earthquake,
            Attributes::WeatherStation(_) => Category::WeatherStation,
            Attributes::WeatherAlert(_) => Category::WeatherAlert,
            Attributes::NaturalEvent(_) => Category::NaturalEvent,
            Attributes::AirQuality(_) => Category::AirQuality,
            Attributes::Volcano(_) => Category::Volcano,
            Attributes::SolarFlare(_) => Category::SolarFlare,
        }
    }

    /// Rebuild the typed record for `category` from the leftover property keys.
    pub(crate) fn from_properties(
        category: Category,
        properties: Map<String, Value>,
    ) -> Result<Self, serde_json::Error> {
        let v = Value::Object(properties);
        Ok(match category {
            Category::ActiveFire => Attributes::Fire(serde_json::from_value(v)?),
            Category::Earthquake => Attributes::Earthquake(serde_json::from_value(v)?),
            Category::WeatherStation => Attributes::WeatherStation(serde_json::from_value(v)?),
            Category::WeatherAlert => Attributes::WeatherAlert(serde_json::from_value(v)?),
            Category::NaturalEvent => Attributes::NaturalEvent(serde_json::from_value(v)?),
            Category::AirQuality => Attributes::AirQuality(serde_json::from_value(v)?),
            Category::Volcano => Attributes::Volcano(serde_json::from_value(v)?),
            Category::SolarFlare => Attributes::SolarFlare(serde_json::from_value(v)?),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationStatus {
    Official,
    SatelliteConfirmed,
    SensorNetwork,
    ExpertVerified,
    Unverified,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FireAttributes {
    pub id: String,
    pub brightness: Option<f64>,
    pub bright_t31: Option<f64>,
    /// Fire radiative power, MW.
    pub frp: Option<f64>,
    pub satellite: Option<String>,
    pub instrument: Option<String>,
    pub daynight: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarthquakeAttributes {
    pub event_id: Option<String>,
    pub magnitude: f64,
    /// Kilometres, third coordinate of the source geometry.
    pub depth: Option<f64>,
    pub place: String,
    pub alert: Option<String>,
    pub tsunami: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherStationAttributes {
    pub city: String,
    pub temperature: Option<f64>,
    pub feels_like: Option<f64>,
    pub humidity: Option<f64>,
    pub pressure: Option<f64>,
    pub wind_speed: Option<f64>,
    pub weather: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertSeverity {
    Extreme,
    Severe,
    Moderate,
}

impl AlertSeverity {
    /// Only the significant severities are representable; everything else
    /// (`Minor`, `Unknown`, other casings) is filtered out upstream.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Extreme" => Some(AlertSeverity::Extreme),
            "Severe" => Some(AlertSeverity::Severe),
            "Moderate" => Some(AlertSeverity::Moderate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlertAttributes {
    pub event: String,
    pub severity: AlertSeverity,
    pub urgency: String,
    pub certainty: String,
    pub headline: String,
    /// At most 200 characters.
    pub description: String,
    pub effective: Option<String>,
    pub expires: Option<String>,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaturalEventAttributes {
    pub event_id: String,
    pub title: String,
    pub categories: Vec<String>,
    pub link: Option<String>,
    pub closed: Option<String>,
    pub magnitude: Option<f64>,
    pub magnitude_unit: Option<String>,
    pub date: Option<String>,
    pub verification_status: VerificationStatus,
}

/// EPA PM2.5 banding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Moderate,
    #[serde(rename = "Unhealthy for Sensitive")]
    UnhealthyForSensitive,
    Unhealthy,
    Hazardous,
}

impl AqiCategory {
    /// Upper bounds are inclusive: 12.0 is Good, 12.01 is Moderate.
    pub fn from_pm25(value: f64) -> Self {
        if value <= 12.0 {
            AqiCategory::Good
        } else if value <= 35.4 {
            AqiCategory::Moderate
        } else if value <= 55.4 {
            AqiCategory::UnhealthyForSensitive
        } else if value <= 150.4 {
            AqiCategory::Unhealthy
        } else {
            AqiCategory::Hazardous
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitive => "Unhealthy for Sensitive",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            AqiCategory::Good => "green",
            AqiCategory::Moderate => "yellow",
            AqiCategory::UnhealthyForSensitive => "orange",
            AqiCategory::Unhealthy => "red",
            AqiCategory::Hazardous => "purple",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirQualityAttributes {
    pub location: String,
    pub city: String,
    pub country: String,
    pub parameter: String,
    pub value: f64,
    pub unit: String,
    pub aqi_category: AqiCategory,
    pub aqi_color: String,
    pub last_updated: Option<String>,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardLevel {
    High,
    Moderate,
}

impl HazardLevel {
    pub fn from_status(status: &str) -> Self {
        if status == "erupting" {
            HazardLevel::High
        } else {
            HazardLevel::Moderate
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolcanoAttributes {
    pub name: String,
    pub status: String,
    pub country: String,
    pub hazard_level: HazardLevel,
    pub verification_status: VerificationStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolarFlareAttributes {
    /// GOES X-ray class, e.g. `M2.4`.
    #[serde(rename = "class")]
    pub flare_class: String,
    pub begin_time: Option<String>,
    pub max_time: Option<String>,
    pub end_time: Option<String>,
    pub active_region: Option<String>,
    pub verification_status: VerificationStatus,
}
