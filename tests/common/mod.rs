// tests/common/mod.rs
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use geohazard_ingest::ingest::config::PipelineConfig;
use geohazard_ingest::ingest::sink::{OutputDocument, OutputSink, SinkError};
use geohazard_ingest::ingest::types::{FetchError, RawFetcher, SourceId, SourceRequest};

pub fn fixture(name: &str) -> Vec<u8> {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read(&path).unwrap_or_else(|e| panic!("fixture {path}: {e}"))
}

/// URL fragment that identifies each source's endpoint.
fn route(source: SourceId) -> &'static str {
    match source {
        SourceId::NasaFirms => "firms.modaps",
        SourceId::UsgsEarthquakes => "earthquake.usgs.gov",
        SourceId::OpenWeather => "openweathermap.org",
        SourceId::NoaaAlerts => "api.weather.gov",
        SourceId::NasaEonet => "eonet.gsfc.nasa.gov",
        SourceId::OpenAq => "api.openaq.org",
        SourceId::SmithsonianVolcanoes => "volcano.si.edu",
        SourceId::SwpcSolarFlares => "services.swpc.noaa.gov",
    }
}

fn fixture_name(source: SourceId) -> &'static str {
    match source {
        SourceId::NasaFirms => "firms.csv",
        SourceId::UsgsEarthquakes => "usgs.geojson",
        SourceId::OpenWeather => "openweather.json",
        SourceId::NoaaAlerts => "noaa_alerts.json",
        SourceId::NasaEonet => "eonet.json",
        SourceId::OpenAq => "openaq.json",
        SourceId::SmithsonianVolcanoes => "volcanoes.json",
        SourceId::SwpcSolarFlares => "solar_flares.json",
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Failure {
    Transport,
    Status(u16),
    Hang,
    Garbage,
}

/// Serves fixtures by URL, with per-source failure injection.
pub struct FakeFetcher {
    failing: Vec<(SourceId, Failure)>,
    pub calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn healthy() -> Self {
        Self {
            failing: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(sources: &[(SourceId, Failure)]) -> Self {
        Self {
            failing: sources.to_vec(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn offline() -> Self {
        Self::failing(
            &SourceId::ALL
                .iter()
                .map(|s| (*s, Failure::Transport))
                .collect::<Vec<_>>(),
        )
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RawFetcher for FakeFetcher {
    async fn fetch_raw(&self, request: &SourceRequest) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let source = SourceId::ALL
            .into_iter()
            .find(|s| request.url.contains(route(*s)))
            .ok_or_else(|| FetchError::Transport(format!("no route for {}", request.url)))?;

        match self.failing.iter().find(|(s, _)| *s == source).map(|(_, f)| *f) {
            None => Ok(fixture(fixture_name(source))),
            Some(Failure::Transport) => Err(FetchError::Transport("connection refused".into())),
            Some(Failure::Status(code)) => Err(FetchError::HttpStatus(code)),
            Some(Failure::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(FetchError::Timeout)
            }
            Some(Failure::Garbage) => Ok(b"<html>maintenance</html>".to_vec()),
        }
    }
}

/// Config with both credentials present and no inter-call delay.
pub fn test_config() -> PipelineConfig {
    let mut cfg = PipelineConfig {
        per_call_delay_ms: 0,
        fetch_timeout_secs: 1,
        ..PipelineConfig::default()
    };
    cfg.credentials.firms_map_key = Some("test-map-key".into());
    cfg.credentials.openweather_api_key = Some("test-owm-key".into());
    cfg
}

/// Keeps every emitted document as a JSON value, in emission order.
#[derive(Default)]
pub struct MemorySink {
    emitted: Mutex<Vec<(String, serde_json::Value)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn names(&self) -> Vec<String> {
        self.emitted.lock().unwrap().iter().map(|(n, _)| n.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<serde_json::Value> {
        self.emitted
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn emit(&self, name: &str, document: &OutputDocument<'_>) -> Result<(), SinkError> {
        let value = serde_json::to_value(document).map_err(|source| SinkError::Serialize {
            name: name.to_string(),
            source,
        })?;
        self.emitted.lock().unwrap().push((name.to_string(), value));
        Ok(())
    }
}
