// src/ingest/synthetic.rs
//! Deterministic stand-in data for a source that produced nothing live.
//!
//! Output has the same schema as the live adapter for the category, is
//! anchored on the read-only seed tables, and is always tagged
//! `trust_level = synthetic` with quality fixed at
//! [`SYNTHETIC_QUALITY`](crate::quality::SYNTHETIC_QUALITY).
//! The same seed, source and `now` always give the same collection.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::feature::{
    AirQualityAttributes, AlertSeverity, AqiCategory, Attributes, CanonicalFeature, DataMode,
    EarthquakeAttributes, FeatureCollection, FireAttributes, HazardLevel, Lineage, Location,
    NaturalEventAttributes, SolarFlareAttributes, TrustTier, VerificationStatus,
    VolcanoAttributes, WeatherAlertAttributes, WeatherStationAttributes, DEFAULT_CONFIDENCE,
};
use crate::ingest::config::{default_cities, City, PipelineConfig, SyntheticVolumes};
use crate::ingest::providers::noaa_alerts::DESCRIPTION_LIMIT;
use crate::ingest::providers::solar_flares::MAX_FLARES;
use crate::ingest::seeds::{
    SeedRegion, AIR_QUALITY_CITIES, ALERT_REGIONS, FIRE_HOTSPOTS, NATURAL_EVENTS, SEISMIC_ZONES,
    VOLCANOES,
};
use crate::ingest::truncate_chars;
use crate::ingest::types::SourceId;
use crate::quality::QualityStrategy;

const SATELLITES: [&str; 4] = ["Terra", "Aqua", "N", "N20"];
const CONDITIONS: [(&str, &str); 5] = [
    ("Clear", "clear sky"),
    ("Clouds", "scattered clouds"),
    ("Rain", "light rain"),
    ("Mist", "mist"),
    ("Thunderstorm", "thunderstorm with rain"),
];
const SEVERITIES: [AlertSeverity; 3] =
    [AlertSeverity::Extreme, AlertSeverity::Severe, AlertSeverity::Moderate];
const FLARE_CLASSES: [char; 6] = ['C', 'C', 'C', 'M', 'M', 'X'];

/// Synthetic earthquakes stay above the live magnitude threshold.
const QUAKE_MAGNITUDE: (f64, f64, f64) = (2.6, 4.0, 7.5);

#[derive(Debug, Clone)]
pub struct SyntheticGenerator {
    seed: u64,
    volumes: SyntheticVolumes,
    cities: Vec<City>,
}

impl SyntheticGenerator {
    /// An empty city list falls back to the seed city table.
    pub fn new(seed: u64, volumes: SyntheticVolumes, cities: Vec<City>) -> Self {
        let cities = if cities.is_empty() { default_cities() } else { cities };
        Self { seed, volumes, cities }
    }

    pub fn from_config(cfg: &PipelineConfig) -> Self {
        Self::new(cfg.synthetic_seed, cfg.synthetic, cfg.cities.clone())
    }

    /// Collection for `source`, labelled as demo data.
    pub fn generate(&self, source: SourceId, now: DateTime<Utc>) -> FeatureCollection {
        let mut rng = StdRng::seed_from_u64(self.seed ^ source_salt(source));
        let features = match source {
            SourceId::NasaFirms => self.fires(&mut rng, now),
            SourceId::UsgsEarthquakes => self.earthquakes(&mut rng, now),
            SourceId::OpenWeather => self.weather(&mut rng, now),
            SourceId::NoaaAlerts => alerts(&mut rng, now),
            SourceId::NasaEonet => natural_events(&mut rng, now),
            SourceId::OpenAq => air_quality(&mut rng, now),
            SourceId::SmithsonianVolcanoes => volcanoes(now),
            SourceId::SwpcSolarFlares => self.solar_flares(&mut rng, now),
        };
        FeatureCollection::new(demo_label(source), TrustTier::Synthetic, DataMode::Synthetic, now, features)
    }

    fn fires(&self, rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
        (0..self.volumes.fires)
            .map(|i| {
                let spot = &FIRE_HOTSPOTS[rng.random_range(0..FIRE_HOTSPOTS.len())];
                let location = jitter(rng, spot);
                let observed_at = now - minutes(rng.random_range(0..48 * 60));
                let confidence: u8 = rng.random_range(30..=100);
                let attrs = FireAttributes {
                    id: format!("synthetic_fire_{i}"),
                    brightness: Some(round1(rng.random_range(300.0..500.0))),
                    bright_t31: Some(round1(rng.random_range(270.0..310.0))),
                    frp: Some(round1(rng.random_range(10.0..1000.0))),
                    satellite: Some(SATELLITES[rng.random_range(0..SATELLITES.len())].to_string()),
                    instrument: Some("MODIS".to_string()),
                    daynight: Some(if rng.random_bool(0.5) { "D" } else { "N" }.to_string()),
                    region: Some(spot.name.to_string()),
                };
                feature(SourceId::NasaFirms, Attributes::Fire(attrs), location, observed_at)
                    .with_confidence(confidence)
            })
            .collect()
    }

    fn earthquakes(&self, rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
        (0..self.volumes.earthquakes)
            .map(|i| {
                let zone = &SEISMIC_ZONES[rng.random_range(0..SEISMIC_ZONES.len())];
                let location = jitter(rng, zone);
                let observed_at = now - minutes(rng.random_range(0..7 * 24 * 60));
                let attrs = EarthquakeAttributes {
                    event_id: Some(format!("synthetic_eq_{i}")),
                    magnitude: round1(triangular(rng, QUAKE_MAGNITUDE)),
                    depth: Some(round1(rng.random_range(0.0..300.0))),
                    place: format!("Synthetic event, {}", zone.name),
                    alert: None,
                    tsunami: 0,
                };
                feature(SourceId::UsgsEarthquakes, Attributes::Earthquake(attrs), location, observed_at)
            })
            .collect()
    }

    fn weather(&self, rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
        self.cities
            .iter()
            .filter_map(|city| {
                let location = Location::checked(city.lon, city.lat)?;
                let temp = round1(rng.random_range(-10.0..40.0));
                let (weather, description) = CONDITIONS[rng.random_range(0..CONDITIONS.len())];
                let attrs = WeatherStationAttributes {
                    city: city.name.clone(),
                    temperature: Some(temp),
                    feels_like: Some(round1(temp + rng.random_range(-3.0..3.0))),
                    humidity: Some(f64::from(rng.random_range(20u8..=100))),
                    pressure: Some(f64::from(rng.random_range(980u16..=1040))),
                    wind_speed: Some(round1(rng.random_range(0.0..20.0))),
                    weather: weather.to_string(),
                    description: description.to_string(),
                };
                Some(feature(SourceId::OpenWeather, Attributes::WeatherStation(attrs), location, now))
            })
            .collect()
    }

    fn solar_flares(&self, rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
        let mut begin = now;
        (0..self.volumes.solar_flares.min(MAX_FLARES))
            .map(|_| {
                // newest first, like the live list after ordering
                begin -= minutes(rng.random_range(30..6 * 60));
                let peak = begin + minutes(rng.random_range(2..15));
                let end = peak + minutes(rng.random_range(5..40));
                let letter = FLARE_CLASSES[rng.random_range(0..FLARE_CLASSES.len())];
                let attrs = SolarFlareAttributes {
                    flare_class: format!("{letter}{:.1}", rng.random_range(1.0..9.9)),
                    begin_time: Some(begin.to_rfc3339()),
                    max_time: Some(peak.to_rfc3339()),
                    end_time: Some(end.to_rfc3339()),
                    active_region: Some(rng.random_range(3600u32..3800).to_string()),
                    verification_status: VerificationStatus::Unverified,
                };
                feature(SourceId::SwpcSolarFlares, Attributes::SolarFlare(attrs), Location::Unlocated, peak)
            })
            .collect()
    }
}

fn alerts(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
    ALERT_REGIONS
        .iter()
        .map(|r| {
            let area = SeedRegion { name: r.area, lat: r.lat, lon: r.lon, radius: 1.0 };
            let location = jitter(rng, &area);
            let effective = now - minutes(rng.random_range(0..12 * 60));
            let expires = effective + minutes(rng.random_range(6 * 60..48 * 60));
            let severity = SEVERITIES[rng.random_range(0..SEVERITIES.len())];
            let description = format!(
                "{} in effect for {}. Demonstration data generated while the live alert feed is unavailable.",
                r.event, r.area
            );
            let attrs = WeatherAlertAttributes {
                event: r.event.to_string(),
                severity,
                urgency: "Expected".to_string(),
                certainty: "Likely".to_string(),
                headline: format!("{} for {}", r.event, r.area),
                description: truncate_chars(&description, DESCRIPTION_LIMIT),
                effective: Some(effective.to_rfc3339()),
                expires: Some(expires.to_rfc3339()),
                verification_status: VerificationStatus::Unverified,
            };
            feature(SourceId::NoaaAlerts, Attributes::WeatherAlert(attrs), location, effective)
        })
        .collect()
}

fn natural_events(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
    NATURAL_EVENTS
        .iter()
        .enumerate()
        .filter_map(|(i, e)| {
            let location = Location::checked(e.lon, e.lat)?;
            let date = now - minutes(rng.random_range(0..5 * 24 * 60));
            let attrs = NaturalEventAttributes {
                event_id: format!("synthetic_eonet_{i}"),
                title: e.title.to_string(),
                categories: vec![e.category.to_string()],
                link: None,
                closed: None,
                magnitude: None,
                magnitude_unit: None,
                date: Some(date.to_rfc3339()),
                verification_status: VerificationStatus::Unverified,
            };
            Some(feature(SourceId::NasaEonet, Attributes::NaturalEvent(attrs), location, date))
        })
        .collect()
}

fn air_quality(rng: &mut StdRng, now: DateTime<Utc>) -> Vec<CanonicalFeature> {
    AIR_QUALITY_CITIES
        .iter()
        .filter_map(|c| {
            let location = Location::checked(c.lon, c.lat)?;
            let value = round1(c.baseline_pm25 * rng.random_range(0.6..1.4));
            let aqi = AqiCategory::from_pm25(value);
            let updated = now - minutes(rng.random_range(0..3 * 60));
            let attrs = AirQualityAttributes {
                location: format!("{} Central", c.city),
                city: c.city.to_string(),
                country: c.country.to_string(),
                parameter: "PM2.5".to_string(),
                value,
                unit: "µg/m³".to_string(),
                aqi_category: aqi,
                aqi_color: aqi.color().to_string(),
                last_updated: Some(updated.to_rfc3339()),
                verification_status: VerificationStatus::Unverified,
            };
            Some(feature(SourceId::OpenAq, Attributes::AirQuality(attrs), location, updated))
        })
        .collect()
}

fn volcanoes(now: DateTime<Utc>) -> Vec<CanonicalFeature> {
    VOLCANOES
        .iter()
        .filter_map(|v| {
            let location = Location::checked(v.lon, v.lat)?;
            let attrs = VolcanoAttributes {
                name: v.name.to_string(),
                status: v.status.to_string(),
                country: v.country.to_string(),
                hazard_level: HazardLevel::from_status(v.status),
                verification_status: VerificationStatus::Unverified,
            };
            Some(feature(SourceId::SmithsonianVolcanoes, Attributes::Volcano(attrs), location, now))
        })
        .collect()
}

fn feature(
    source: SourceId,
    attributes: Attributes,
    location: Location,
    observed_at: DateTime<Utc>,
) -> CanonicalFeature {
    CanonicalFeature::new(
        attributes,
        location,
        observed_at,
        demo_label(source),
        Lineage::new([organization(source), "Regional Seed Table", "Synthetic"]),
    )
    .with_confidence(DEFAULT_CONFIDENCE)
    .with_quality(QualityStrategy::synthetic().unit_score(DEFAULT_CONFIDENCE, None))
}

pub fn demo_label(source: SourceId) -> String {
    format!("{} (Demo Data)", source.display_name())
}

fn organization(source: SourceId) -> &'static str {
    match source {
        SourceId::NasaFirms | SourceId::NasaEonet => "NASA",
        SourceId::UsgsEarthquakes => "USGS",
        SourceId::OpenWeather => "OpenWeatherMap",
        SourceId::NoaaAlerts | SourceId::SwpcSolarFlares => "NOAA",
        SourceId::OpenAq => "OpenAQ",
        SourceId::SmithsonianVolcanoes => "Smithsonian",
    }
}

/// Distinct stream per source from one configured seed.
fn source_salt(source: SourceId) -> u64 {
    let idx = SourceId::ALL.iter().position(|s| *s == source).unwrap_or(0) as u64;
    (idx + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Uniform jitter inside the region's box, clamped to valid coordinates.
fn jitter(rng: &mut StdRng, region: &SeedRegion) -> Location {
    let lat = region.lat + rng.random_range(-region.radius..=region.radius);
    let lon = region.lon + rng.random_range(-region.radius..=region.radius);
    Location::Point {
        lon: round4(lon.clamp(-180.0, 180.0)),
        lat: round4(lat.clamp(-90.0, 90.0)),
    }
}

fn triangular(rng: &mut StdRng, (low, mode, high): (f64, f64, f64)) -> f64 {
    let u: f64 = rng.random();
    let split = (mode - low) / (high - low);
    if u < split {
        low + (u * (high - low) * (mode - low)).sqrt()
    } else {
        high - ((1.0 - u) * (high - low) * (high - mode)).sqrt()
    }
}

fn minutes(n: i64) -> Duration {
    Duration::minutes(n)
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
