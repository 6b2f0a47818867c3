// src/ingest/seeds.rs
//! Read-only seed tables shared by the weather adapter (city list) and the
//! synthetic generator (regional anchors). Coordinates are WGS84 degrees.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedRegion {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Jitter half-width in degrees around the anchor.
    pub radius: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedCity {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedVolcano {
    pub name: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub status: &'static str,
    pub country: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedAlertRegion {
    pub area: &'static str,
    pub lat: f64,
    pub lon: f64,
    pub event: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedNaturalEvent {
    pub title: &'static str,
    pub category: &'static str,
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeedAirQualityCity {
    pub city: &'static str,
    pub country: &'static str,
    pub lat: f64,
    pub lon: f64,
    /// Typical PM2.5 level (µg/m³) the synthetic value varies around.
    pub baseline_pm25: f64,
}

pub static FIRE_HOTSPOTS: [SeedRegion; 5] = [
    SeedRegion { name: "California", lat: 36.7783, lon: -119.4179, radius: 5.0 },
    SeedRegion { name: "Amazon", lat: -3.4653, lon: -62.2159, radius: 8.0 },
    SeedRegion { name: "Australia", lat: -25.2744, lon: 133.7751, radius: 10.0 },
    SeedRegion { name: "Siberia", lat: 60.0, lon: 100.0, radius: 12.0 },
    SeedRegion { name: "Central Africa", lat: 0.0, lon: 20.0, radius: 7.0 },
];

pub static SEISMIC_ZONES: [SeedRegion; 5] = [
    SeedRegion { name: "Ring of Fire", lat: 35.0, lon: 140.0, radius: 15.0 },
    SeedRegion { name: "Mediterranean", lat: 38.0, lon: 15.0, radius: 8.0 },
    SeedRegion { name: "Himalayas", lat: 28.0, lon: 85.0, radius: 10.0 },
    SeedRegion { name: "California", lat: 36.0, lon: -120.0, radius: 5.0 },
    SeedRegion { name: "Indonesia", lat: -2.0, lon: 120.0, radius: 12.0 },
];

pub static MAJOR_CITIES: [SeedCity; 10] = [
    SeedCity { name: "New York", lat: 40.7128, lon: -74.0060 },
    SeedCity { name: "London", lat: 51.5074, lon: -0.1278 },
    SeedCity { name: "Tokyo", lat: 35.6762, lon: 139.6503 },
    SeedCity { name: "Sydney", lat: -33.8688, lon: 151.2093 },
    SeedCity { name: "Mumbai", lat: 19.0760, lon: 72.8777 },
    SeedCity { name: "Cairo", lat: 30.0444, lon: 31.2357 },
    SeedCity { name: "São Paulo", lat: -23.5505, lon: -46.6333 },
    SeedCity { name: "Moscow", lat: 55.7558, lon: 37.6173 },
    SeedCity { name: "Beijing", lat: 39.9042, lon: 116.4074 },
    SeedCity { name: "Lagos", lat: 6.5244, lon: 3.3792 },
];

pub static ALERT_REGIONS: [SeedAlertRegion; 6] = [
    SeedAlertRegion { area: "Gulf Coast", lat: 29.95, lon: -90.07, event: "Hurricane Warning" },
    SeedAlertRegion { area: "Great Plains", lat: 35.47, lon: -97.52, event: "Tornado Warning" },
    SeedAlertRegion { area: "Upper Midwest", lat: 44.98, lon: -93.27, event: "Winter Storm Warning" },
    SeedAlertRegion { area: "Southern California", lat: 34.05, lon: -118.24, event: "Red Flag Warning" },
    SeedAlertRegion { area: "Desert Southwest", lat: 33.45, lon: -112.07, event: "Excessive Heat Warning" },
    SeedAlertRegion { area: "Mid-Atlantic", lat: 38.90, lon: -77.04, event: "Flood Watch" },
];

pub static NATURAL_EVENTS: [SeedNaturalEvent; 6] = [
    SeedNaturalEvent { title: "Wildfire, British Columbia", category: "Wildfires", lat: 50.67, lon: -120.33 },
    SeedNaturalEvent { title: "Tropical Cyclone, Western Pacific", category: "Severe Storms", lat: 18.0, lon: 135.0 },
    SeedNaturalEvent { title: "Iceberg A23A", category: "Sea and Lake Ice", lat: -60.5, lon: -45.0 },
    SeedNaturalEvent { title: "Dust Storm, Sahara", category: "Dust and Haze", lat: 22.0, lon: 10.0 },
    SeedNaturalEvent { title: "Flooding, Bangladesh", category: "Floods", lat: 23.68, lon: 90.35 },
    SeedNaturalEvent { title: "Sakurajima Volcano, Japan", category: "Volcanoes", lat: 31.58, lon: 130.66 },
];

pub static AIR_QUALITY_CITIES: [SeedAirQualityCity; 8] = [
    SeedAirQualityCity { city: "Delhi", country: "IN", lat: 28.6139, lon: 77.2090, baseline_pm25: 110.0 },
    SeedAirQualityCity { city: "Lahore", country: "PK", lat: 31.5204, lon: 74.3587, baseline_pm25: 95.0 },
    SeedAirQualityCity { city: "Beijing", country: "CN", lat: 39.9042, lon: 116.4074, baseline_pm25: 45.0 },
    SeedAirQualityCity { city: "Dhaka", country: "BD", lat: 23.8103, lon: 90.4125, baseline_pm25: 80.0 },
    SeedAirQualityCity { city: "Cairo", country: "EG", lat: 30.0444, lon: 31.2357, baseline_pm25: 40.0 },
    SeedAirQualityCity { city: "Mexico City", country: "MX", lat: 19.4326, lon: -99.1332, baseline_pm25: 25.0 },
    SeedAirQualityCity { city: "London", country: "GB", lat: 51.5074, lon: -0.1278, baseline_pm25: 10.0 },
    SeedAirQualityCity { city: "Los Angeles", country: "US", lat: 34.0522, lon: -118.2437, baseline_pm25: 14.0 },
];

pub static VOLCANOES: [SeedVolcano; 5] = [
    SeedVolcano { name: "Kilauea", lat: 19.421, lon: -155.287, status: "erupting", country: "USA" },
    SeedVolcano { name: "Etna", lat: 37.734, lon: 15.004, status: "active", country: "Italy" },
    SeedVolcano { name: "Fuji", lat: 35.361, lon: 138.728, status: "dormant", country: "Japan" },
    SeedVolcano { name: "Vesuvius", lat: 40.821, lon: 14.426, status: "dormant", country: "Italy" },
    SeedVolcano { name: "Mauna Loa", lat: 19.475, lon: -155.608, status: "active", country: "USA" },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::Location;

    #[test]
    fn every_anchor_is_a_valid_point() {
        let anchors = FIRE_HOTSPOTS
            .iter()
            .chain(SEISMIC_ZONES.iter())
            .map(|r| (r.lon, r.lat))
            .chain(MAJOR_CITIES.iter().map(|c| (c.lon, c.lat)))
            .chain(ALERT_REGIONS.iter().map(|a| (a.lon, a.lat)))
            .chain(NATURAL_EVENTS.iter().map(|e| (e.lon, e.lat)))
            .chain(AIR_QUALITY_CITIES.iter().map(|c| (c.lon, c.lat)))
            .chain(VOLCANOES.iter().map(|v| (v.lon, v.lat)));
        for (lon, lat) in anchors {
            assert!(Location::checked(lon, lat).is_some(), "({lon}, {lat})");
        }
    }
}
