// src/ingest/providers/openweather.rs
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::feature::{
    Attributes, CanonicalFeature, Category, Lineage, Location, TrustTier, WeatherStationAttributes,
    DEFAULT_CONFIDENCE,
};
use crate::ingest::config::{City, PipelineConfig, ENV_OPENWEATHER_KEY};
use crate::ingest::providers::parse_json;
use crate::ingest::types::{
    IngestError, ParseOutcome, RawPayload, SourceAdapter, SourceId, SourceRequest,
};
use crate::quality::QualityStrategy;

pub const OPENWEATHER_CURRENT: &str = "https://api.openweathermap.org/data/2.5/weather";
const SOURCE_NAME: &str = "OpenWeatherMap";

#[derive(Deserialize)]
struct CurrentWeather {
    main: Main,
    #[serde(default)]
    wind: Wind,
    #[serde(default)]
    weather: Vec<Condition>,
    /// Epoch seconds.
    dt: Option<i64>,
    coord: Option<Coord>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct Main {
    temp: Option<f64>,
    feels_like: Option<f64>,
    humidity: Option<f64>,
    pressure: Option<f64>,
}

#[derive(Deserialize, Default)]
struct Wind {
    speed: Option<f64>,
}

#[derive(Deserialize)]
struct Condition {
    main: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct Coord {
    lon: f64,
    lat: f64,
}

/// Current conditions, one call per configured city.
pub struct OpenWeatherAdapter {
    api_key: Option<String>,
    cities: Vec<City>,
}

impl OpenWeatherAdapter {
    pub fn new(api_key: Option<String>, cities: Vec<City>) -> Self {
        Self {
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            cities,
        }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(
            cfg.credentials.openweather_api_key().map(str::to_string),
            cfg.cities.clone(),
        )
    }
}

impl SourceAdapter for OpenWeatherAdapter {
    fn id(&self) -> SourceId {
        SourceId::OpenWeather
    }

    fn source_name(&self) -> &'static str {
        SOURCE_NAME
    }

    fn trust_tier(&self) -> TrustTier {
        TrustTier::CommunitySensors
    }

    fn requests(&self) -> Result<Vec<SourceRequest>, IngestError> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(IngestError::ConfigurationGap(ENV_OPENWEATHER_KEY))?;
        Ok(self
            .cities
            .iter()
            .map(|c| {
                SourceRequest::get(OPENWEATHER_CURRENT)
                    .with_query("lat", c.lat)
                    .with_query("lon", c.lon)
                    .with_query("appid", key)
                    .with_query("units", "metric")
                    .with_label(c.name.clone())
                    .with_point(c.lon, c.lat)
            })
            .collect())
    }

    /// One payload is one station; an unusable payload counts as one skipped record.
    fn parse(&self, payload: &RawPayload<'_>) -> Result<ParseOutcome, IngestError> {
        let mut out = ParseOutcome::with_capacity(1);
        let obs: CurrentWeather = match parse_json(payload.body, "OpenWeatherMap current") {
            Ok(o) => o,
            Err(e) => {
                tracing::debug!(target: "ingest", source = SOURCE_NAME, error = %e, "skipping city payload");
                out.skip();
                return Ok(out);
            }
        };

        // Seed coordinates win; the response echo is only a fallback.
        let location = payload
            .request
            .point
            .or_else(|| obs.coord.as_ref().map(|c| (c.lon, c.lat)))
            .and_then(|(lon, lat)| Location::checked(lon, lat));
        let Some(location) = location else {
            out.skip();
            return Ok(out);
        };

        let city = payload
            .request
            .label
            .clone()
            .or(obs.name)
            .unwrap_or_else(|| "Unknown".to_string());
        let condition = obs.weather.into_iter().next();
        let observed_at = obs
            .dt
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
            .unwrap_or(payload.ingested_at);

        let attrs = WeatherStationAttributes {
            city,
            temperature: obs.main.temp,
            feels_like: obs.main.feels_like,
            humidity: obs.main.humidity,
            pressure: obs.main.pressure,
            wind_speed: obs.wind.speed,
            weather: condition
                .as_ref()
                .and_then(|c| c.main.clone())
                .unwrap_or_else(|| "Unknown".to_string()),
            description: condition.and_then(|c| c.description).unwrap_or_default(),
        };

        let quality =
            QualityStrategy::for_category(Category::WeatherStation).unit_score(DEFAULT_CONFIDENCE, None);
        out.push(
            CanonicalFeature::new(
                Attributes::WeatherStation(attrs),
                location,
                observed_at,
                SOURCE_NAME,
                Lineage::new(["OpenWeatherMap", "Weather Stations", "Real-time"]),
            )
            .with_quality(quality),
        );
        Ok(out)
    }
}
