//! GeoJSON-shaped wire format for features and collections.
//!
//! ```json
//! {"type":"Feature",
//!  "geometry":{"type":"Point","coordinates":[-119.41,36.77]},
//!  "properties":{"type":"active_fire","source":"NASA FIRMS","timestamp":"...",
//!                "confidence":90,"quality_score":0.8,"data_lineage":[...], ...}}
//! ```
//!
//! Unlocated features (solar flares) carry the sentinel point `[0, 0]` and
//! `"unlocated": true` in their properties, so consumers reading
//! `geometry.coordinates` always find a point. A `null` geometry is still
//! accepted on read.

use chrono::{DateTime, Utc};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::{
    Attributes, CanonicalFeature, Category, CollectionMetadata, FeatureCollection, Lineage,
    Location, DEFAULT_QUALITY,
};
use crate::confidence::{self, ConfidenceKind, RawConfidence};

/// Placeholder coordinates for a feature with no place on Earth.
pub const SENTINEL_COORDINATES: (f64, f64) = (0.0, 0.0);

#[derive(Serialize, Deserialize)]
struct PointGeometry {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<f64>,
}

#[derive(Serialize)]
struct PropertiesRef<'a> {
    #[serde(rename = "type")]
    category: Category,
    source: &'a str,
    timestamp: &'a DateTime<Utc>,
    confidence: u8,
    quality_score: f64,
    data_lineage: &'a Lineage,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    unlocated: bool,
    #[serde(flatten)]
    attributes: &'a Attributes,
}

impl Serialize for CanonicalFeature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (lon, lat) = self.location.coordinates().unwrap_or(SENTINEL_COORDINATES);
        let geometry = PointGeometry {
            kind: "Point".to_string(),
            coordinates: vec![lon, lat],
        };
        let properties = PropertiesRef {
            category: self.category(),
            source: &self.source_name,
            timestamp: &self.observed_at,
            confidence: self.confidence,
            quality_score: self.quality_score,
            data_lineage: &self.lineage,
            unlocated: self.location == Location::Unlocated,
            attributes: &self.attributes,
        };
        let mut s = serializer.serialize_struct("Feature", 3)?;
        s.serialize_field("type", "Feature")?;
        s.serialize_field("geometry", &geometry)?;
        s.serialize_field("properties", &properties)?;
        s.end()
    }
}

#[derive(Deserialize)]
pub(crate) struct WireFeature {
    geometry: Option<PointGeometry>,
    properties: WireProperties,
}

#[derive(Deserialize)]
struct WireProperties {
    #[serde(rename = "type")]
    category: Category,
    source: String,
    timestamp: DateTime<Utc>,
    // Wider than the domain type so stored out-of-range values clamp.
    #[serde(default)]
    confidence: Option<f64>,
    #[serde(default = "default_quality")]
    quality_score: f64,
    data_lineage: Lineage,
    #[serde(default)]
    unlocated: bool,
    #[serde(flatten)]
    rest: Map<String, Value>,
}

fn default_quality() -> f64 {
    DEFAULT_QUALITY
}

impl TryFrom<WireFeature> for CanonicalFeature {
    type Error = String;

    fn try_from(wire: WireFeature) -> Result<Self, Self::Error> {
        let location = match wire.geometry {
            None => Location::Unlocated,
            Some(_) if wire.properties.unlocated => Location::Unlocated,
            Some(g) if g.kind == "Point" && g.coordinates.len() >= 2 => {
                Location::checked(g.coordinates[0], g.coordinates[1])
                    .ok_or_else(|| "point coordinates out of range".to_string())?
            }
            Some(g) => return Err(format!("unsupported geometry type {}", g.kind)),
        };
        let p = wire.properties;
        let confidence =
            confidence::normalize(RawConfidence::from(p.confidence), ConfidenceKind::Percent);
        let attributes = Attributes::from_properties(p.category, p.rest)
            .map_err(|e| format!("{} properties: {e}", p.category.as_str()))?;
        Ok(CanonicalFeature::new(attributes, location, p.timestamp, p.source, p.data_lineage)
            .with_confidence(confidence)
            .with_quality(p.quality_score))
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("FeatureCollection", 3)?;
        s.serialize_field("type", "FeatureCollection")?;
        s.serialize_field("features", &self.features)?;
        s.serialize_field("metadata", &self.metadata)?;
        s.end()
    }
}

#[derive(Deserialize)]
pub(crate) struct WireCollection {
    #[serde(default)]
    features: Vec<CanonicalFeature>,
    metadata: CollectionMetadata,
}

impl From<WireCollection> for FeatureCollection {
    fn from(wire: WireCollection) -> Self {
        // `count` on disk is advisory; the feature list is authoritative.
        let m = wire.metadata;
        FeatureCollection::new(m.source, m.trust_level, m.data_mode, m.timestamp, wire.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{
        DataMode, EarthquakeAttributes, SolarFlareAttributes, TrustTier, VerificationStatus,
    };
    use chrono::TimeZone;

    fn quake() -> CanonicalFeature {
        CanonicalFeature::new(
            Attributes::Earthquake(EarthquakeAttributes {
                event_id: Some("us7000abcd".into()),
                magnitude: 4.7,
                depth: Some(10.0),
                place: "12 km SSW of Ridgecrest, CA".into(),
                alert: None,
                tsunami: 0,
            }),
            Location::Point { lon: -117.6, lat: 35.7 },
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            "USGS",
            Lineage::new(["USGS", "Seismic Network", "Real-time"]),
        )
        .with_confidence(50)
        .with_quality(0.47)
    }

    #[test]
    fn feature_wire_shape() {
        let v = serde_json::to_value(quake()).unwrap();
        assert_eq!(v["type"], "Feature");
        assert_eq!(v["geometry"]["type"], "Point");
        assert_eq!(v["geometry"]["coordinates"][0], -117.6);
        let p = &v["properties"];
        assert_eq!(p["type"], "earthquake");
        assert_eq!(p["source"], "USGS");
        assert_eq!(p["quality_score"], 0.47);
        assert_eq!(p["magnitude"], 4.7);
        assert_eq!(p["data_lineage"][2], "Real-time");
        // optional keys stay present
        assert!(p.as_object().unwrap().contains_key("alert"));
    }

    #[test]
    fn feature_round_trip_preserves_core_fields() {
        let f = quake();
        let s = serde_json::to_string(&f).unwrap();
        let back: CanonicalFeature = serde_json::from_str(&s).unwrap();
        assert_eq!(back, f);
    }

    #[test]
    fn unlocated_feature_uses_sentinel_point() {
        let f = CanonicalFeature::new(
            Attributes::SolarFlare(SolarFlareAttributes {
                flare_class: "M1.2".into(),
                begin_time: Some("2024-05-10T06:27:00Z".into()),
                max_time: None,
                end_time: None,
                active_region: Some("3664".into()),
                verification_status: VerificationStatus::SatelliteConfirmed,
            }),
            Location::Unlocated,
            Utc::now(),
            "NOAA SWPC",
            Lineage::new(["NOAA", "GOES Satellite", "Real-time"]),
        );
        let v = serde_json::to_value(&f).unwrap();
        assert_eq!(v["geometry"]["type"], "Point");
        assert_eq!(v["geometry"]["coordinates"], serde_json::json!([0.0, 0.0]));
        assert_eq!(v["properties"]["unlocated"], true);
        assert_eq!(v["properties"]["class"], "M1.2");
        let back: CanonicalFeature = serde_json::from_value(v).unwrap();
        assert_eq!(back.location(), Location::Unlocated);
    }

    #[test]
    fn located_features_omit_the_unlocated_flag() {
        let v = serde_json::to_value(quake()).unwrap();
        assert!(!v["properties"].as_object().unwrap().contains_key("unlocated"));
    }

    #[test]
    fn stored_confidence_is_clamped() {
        for (stored, expected) in [(300, 100), (-4, 0), (87, 87)] {
            let mut v = serde_json::to_value(quake()).unwrap();
            v["properties"]["confidence"] = Value::from(stored);
            let back: CanonicalFeature = serde_json::from_value(v).unwrap();
            assert_eq!(back.confidence(), expected, "stored {stored}");
        }
        let mut v = serde_json::to_value(quake()).unwrap();
        v["properties"].as_object_mut().unwrap().remove("confidence");
        let back: CanonicalFeature = serde_json::from_value(v).unwrap();
        assert_eq!(back.confidence(), crate::feature::DEFAULT_CONFIDENCE);
    }

    #[test]
    fn category_mismatch_is_rejected() {
        let mut v = serde_json::to_value(quake()).unwrap();
        v["properties"]["type"] = Value::from("volcano");
        assert!(serde_json::from_value::<CanonicalFeature>(v).is_err());
    }

    #[test]
    fn collection_count_recomputed_on_read() {
        let c = FeatureCollection::new(
            "USGS",
            TrustTier::OfficialGovernment,
            DataMode::Live,
            Utc::now(),
            vec![quake()],
        );
        let mut v = serde_json::to_value(&c).unwrap();
        assert_eq!(v["type"], "FeatureCollection");
        assert_eq!(v["metadata"]["count"], 1);
        assert_eq!(v["metadata"]["trust_level"], "official_government");
        v["metadata"]["count"] = Value::from(99);
        let back: FeatureCollection = serde_json::from_value(v).unwrap();
        assert_eq!(back.metadata().count, 1);
        assert_eq!(back, c);
    }
}
