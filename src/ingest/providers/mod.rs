// src/ingest/providers/mod.rs
//! One adapter per upstream source, plus the payload helpers they share.

pub mod eonet;
pub mod firms;
pub mod noaa_alerts;
pub mod openaq;
pub mod openweather;
pub mod solar_flares;
pub mod usgs;
pub mod volcanoes;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::feature::Location;
use crate::ingest::config::PipelineConfig;
use crate::ingest::types::{IngestError, SourceAdapter};

/// Every live adapter, in run order.
pub fn all(config: &PipelineConfig) -> Vec<Arc<dyn SourceAdapter>> {
    vec![
        Arc::new(firms::FirmsAdapter::from_config(config)),
        Arc::new(usgs::UsgsAdapter::from_config(config)),
        Arc::new(openweather::OpenWeatherAdapter::from_config(config)),
        Arc::new(noaa_alerts::NoaaAlertsAdapter::new()),
        Arc::new(eonet::EonetAdapter::new()),
        Arc::new(openaq::OpenAqAdapter::new()),
        Arc::new(volcanoes::VolcanoAdapter::new()),
        Arc::new(solar_flares::SolarFlareAdapter::new()),
    ]
}

/// Decode a whole payload; a shape mismatch fails the payload, not the run.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8], context: &str) -> Result<T, IngestError> {
    serde_json::from_slice(body).map_err(|e| IngestError::parse(context, e))
}

/// Decode one record of an envelope. `None` means "skip this record".
pub(crate) fn decode_record<T: DeserializeOwned>(record: Value, source: &str) -> Option<T> {
    match serde_json::from_value(record) {
        Ok(r) => Some(r),
        Err(e) => {
            tracing::debug!(target: "ingest", source, error = %e, "skipping malformed record");
            None
        }
    }
}

/// RFC 3339 timestamp in UTC; anything else is `None`.
pub(crate) fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Location for a non-null GeoJSON geometry: Point as-is, Polygon and
/// MultiPolygon reduced to the vertex centroid of their first ring.
pub(crate) fn locate(geometry: &Value) -> Option<Location> {
    let coords = geometry.get("coordinates")?;
    match geometry.get("type")?.as_str()? {
        "Point" => point(coords),
        "Polygon" => ring_centroid(coords.get(0)?),
        "MultiPolygon" => ring_centroid(coords.get(0)?.get(0)?),
        _ => None,
    }
}

fn point(coords: &Value) -> Option<Location> {
    let lon = coords.get(0)?.as_f64()?;
    let lat = coords.get(1)?.as_f64()?;
    Location::checked(lon, lat)
}

fn ring_centroid(ring: &Value) -> Option<Location> {
    let mut vertices: Vec<(f64, f64)> = ring
        .as_array()?
        .iter()
        .filter_map(|v| Some((v.get(0)?.as_f64()?, v.get(1)?.as_f64()?)))
        .collect();
    // GeoJSON rings repeat the first vertex at the end.
    if vertices.len() > 1 && vertices.first() == vertices.last() {
        vertices.pop();
    }
    if vertices.is_empty() {
        return None;
    }
    let n = vertices.len() as f64;
    let (sx, sy) = vertices
        .iter()
        .fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
    Location::checked(sx / n, sy / n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn point_geometry_is_taken_as_is() {
        let g = json!({"type": "Point", "coordinates": [-117.6, 35.7, 8.2]});
        assert_eq!(locate(&g), Some(Location::Point { lon: -117.6, lat: 35.7 }));
    }

    #[test]
    fn polygon_reduces_to_first_ring_centroid() {
        let g = json!({"type": "Polygon", "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]});
        assert_eq!(locate(&g), Some(Location::Point { lon: 1.0, lat: 1.0 }));
        let mg = json!({"type": "MultiPolygon", "coordinates": [[[[10.0, 10.0], [12.0, 10.0], [11.0, 13.0], [10.0, 10.0]]]]});
        assert_eq!(locate(&mg), Some(Location::Point { lon: 11.0, lat: 11.0 }));
    }

    #[test]
    fn unusable_geometries_are_none() {
        assert_eq!(locate(&json!({"type": "Point", "coordinates": ["a", 1]})), None);
        assert_eq!(locate(&json!({"type": "Point", "coordinates": [200.0, 1.0]})), None);
        assert_eq!(locate(&json!({"type": "LineString", "coordinates": [[0, 0], [1, 1]]})), None);
        assert_eq!(locate(&json!({"type": "Polygon", "coordinates": [[]]})), None);
    }

    #[test]
    fn timestamps_are_rfc3339() {
        let t = parse_timestamp("2024-05-01T12:00:00+02:00").unwrap();
        assert_eq!(t.to_rfc3339(), "2024-05-01T10:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn adapters_follow_source_order() {
        let adapters = all(&PipelineConfig::default());
        let ids: Vec<_> = adapters.iter().map(|a| a.id()).collect();
        assert_eq!(ids, crate::ingest::types::SourceId::ALL.to_vec());
        for a in &adapters {
            assert_eq!(a.source_name(), a.id().display_name());
        }
    }
}
