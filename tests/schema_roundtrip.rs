// tests/schema_roundtrip.rs
//
// Every feature the pipeline can produce, live or synthetic, survives a
// serialize/parse cycle with its core fields intact.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{test_config, FakeFetcher};
use geohazard_ingest::feature::{CanonicalFeature, Location};
use geohazard_ingest::ingest::fallback::NoSnapshots;
use geohazard_ingest::Pipeline;

fn assert_round_trip(f: &CanonicalFeature) {
    let text = serde_json::to_string(f).unwrap();
    let back: CanonicalFeature = serde_json::from_str(&text).unwrap();
    assert_eq!(back.category(), f.category());
    assert_eq!(back.location(), f.location());
    assert_eq!(back.confidence(), f.confidence());
    assert_eq!(back.quality_score(), f.quality_score());
    assert_eq!(back.lineage(), f.lineage());
    assert_eq!(&back, f);
}

#[tokio::test]
async fn live_features_round_trip() {
    let now = Utc.with_ymd_and_hms(2024, 8, 14, 12, 0, 0).unwrap();
    let out = Pipeline::new(test_config(), Arc::new(FakeFetcher::healthy()), Arc::new(NoSnapshots))
        .run_at(now)
        .await;
    for e in &out.entries {
        e.collection.features().iter().for_each(assert_round_trip);
    }
}

#[tokio::test]
async fn synthetic_features_round_trip() {
    let out = Pipeline::new(test_config(), Arc::new(FakeFetcher::offline()), Arc::new(NoSnapshots))
        .run()
        .await;
    for e in &out.entries {
        e.collection.features().iter().for_each(assert_round_trip);
    }
}

#[test]
fn unlocated_features_are_written_as_the_sentinel_point() {
    let flare = serde_json::json!({
        "type": "Feature",
        "geometry": null,
        "properties": {
            "type": "solar_flare",
            "source": "NOAA SWPC",
            "timestamp": "2024-08-14T11:41:00Z",
            "confidence": 50,
            "quality_score": 0.95,
            "data_lineage": ["NOAA", "GOES Satellite", "Real-time"],
            "class": "X1.1",
            "begin_time": "2024-08-14T11:30:00Z",
            "max_time": "2024-08-14T11:41:00Z",
            "end_time": null,
            "active_region": null,
            "verification_status": "satellite_confirmed"
        }
    });
    let f: CanonicalFeature = serde_json::from_value(flare).unwrap();
    assert_eq!(f.location(), Location::Unlocated);

    let written = serde_json::to_value(&f).unwrap();
    assert_eq!(written["geometry"]["type"], "Point");
    assert_eq!(written["geometry"]["coordinates"][0], 0.0);
    assert_eq!(written["geometry"]["coordinates"][1], 0.0);
    assert_eq!(written["properties"]["unlocated"], true);

    let back: CanonicalFeature = serde_json::from_value(written).unwrap();
    assert_eq!(back, f);
}

#[test]
fn located_feature_at_origin_stays_located() {
    let fire = serde_json::json!({
        "type": "Feature",
        "geometry": {"type": "Point", "coordinates": [0.0, 0.0]},
        "properties": {
            "type": "active_fire",
            "source": "NASA FIRMS",
            "timestamp": "2024-08-14T11:41:00Z",
            "confidence": 140,
            "quality_score": 0.6,
            "data_lineage": ["NASA", "MODIS/VIIRS", "Real-time"],
            "id": "fire_0",
            "brightness": null,
            "bright_t31": null,
            "frp": null,
            "satellite": null,
            "instrument": null,
            "daynight": null,
            "region": null
        }
    });
    let f: CanonicalFeature = serde_json::from_value(fire).unwrap();
    assert_eq!(f.location(), Location::Point { lon: 0.0, lat: 0.0 });
    assert_eq!(f.confidence(), 100);
}
