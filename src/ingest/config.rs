// src/ingest/config.rs
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::confidence::ConfidenceKind;
use crate::ingest::seeds::MAJOR_CITIES;

const ENV_PATH: &str = "GEOHAZARD_CONFIG_PATH";
const DEFAULT_PATH: &str = "config/pipeline.toml";

pub const ENV_FIRMS_KEY: &str = "FIRMS_API_KEY";
pub const ENV_OPENWEATHER_KEY: &str = "OPENWEATHER_API_KEY";

/// FIRMS near-real-time product; decides the native confidence representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FirmsProduct {
    #[default]
    #[serde(rename = "MODIS_NRT")]
    ModisNrt,
    #[serde(rename = "VIIRS_SNPP_NRT")]
    ViirsSnppNrt,
    #[serde(rename = "VIIRS_NOAA20_NRT")]
    ViirsNoaa20Nrt,
}

impl FirmsProduct {
    pub fn as_str(&self) -> &'static str {
        match self {
            FirmsProduct::ModisNrt => "MODIS_NRT",
            FirmsProduct::ViirsSnppNrt => "VIIRS_SNPP_NRT",
            FirmsProduct::ViirsNoaa20Nrt => "VIIRS_NOAA20_NRT",
        }
    }

    pub fn confidence_kind(&self) -> ConfidenceKind {
        match self {
            FirmsProduct::ModisNrt => ConfidenceKind::Percent,
            FirmsProduct::ViirsSnppNrt | FirmsProduct::ViirsNoaa20Nrt => {
                ConfidenceKind::Categorical
            }
        }
    }
}

/// Optional upstream credentials. Blank strings count as absent.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub firms_map_key: Option<String>,
    pub openweather_api_key: Option<String>,
}

impl Credentials {
    pub fn firms_map_key(&self) -> Option<&str> {
        present(&self.firms_map_key)
    }

    pub fn openweather_api_key(&self) -> Option<&str> {
        present(&self.openweather_api_key)
    }
}

fn present(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Only presence is safe to print.
        f.debug_struct("Credentials")
            .field("firms_map_key", &self.firms_map_key().is_some())
            .field("openweather_api_key", &self.openweather_api_key().is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct City {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// The seed city table as configurable cities.
pub fn default_cities() -> Vec<City> {
    MAJOR_CITIES
        .iter()
        .map(|c| City {
            name: c.name.to_string(),
            lat: c.lat,
            lon: c.lon,
        })
        .collect()
}

/// Per-category synthetic volumes for categories without a fixed seed table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SyntheticVolumes {
    pub fires: usize,
    pub earthquakes: usize,
    pub solar_flares: usize,
}

impl Default for SyntheticVolumes {
    fn default() -> Self {
        Self {
            fires: 50,
            earthquakes: 40,
            solar_flares: 20,
        }
    }
}

/// Everything the orchestrator needs, passed in at construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub output_dir: PathBuf,
    pub snapshot_dir: Option<PathBuf>,
    pub fetch_timeout_secs: u64,
    pub per_call_delay_ms: u64,
    pub firms_days_back: u32,
    pub firms_product: FirmsProduct,
    pub earthquake_days_back: u32,
    pub synthetic_fallback: bool,
    pub synthetic_seed: u64,
    pub synthetic: SyntheticVolumes,
    pub schedule_interval_secs: u64,
    pub cities: Vec<City>,
    pub credentials: Credentials,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("public/data"),
            snapshot_dir: None,
            fetch_timeout_secs: 30,
            per_call_delay_ms: 100,
            firms_days_back: 1,
            firms_product: FirmsProduct::default(),
            earthquake_days_back: 7,
            synthetic_fallback: true,
            synthetic_seed: 0x7e44_a71a_5eed,
            synthetic: SyntheticVolumes::default(),
            schedule_interval_secs: 3 * 3600,
            cities: default_cities(),
            credentials: Credentials::default(),
        }
    }
}

impl PipelineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs.max(1))
    }

    pub fn per_call_delay(&self) -> Duration {
        Duration::from_millis(self.per_call_delay_ms)
    }

    pub fn schedule_interval(&self) -> Duration {
        Duration::from_secs(self.schedule_interval_secs.max(60))
    }

    /// Where cached snapshots are read from; the last written output by default.
    pub fn snapshot_dir_or_output(&self) -> &Path {
        self.snapshot_dir.as_deref().unwrap_or(&self.output_dir)
    }

    /// Overlay credentials from the environment (or any lookup), keeping the
    /// file values when the variable is unset or blank.
    pub fn overlay_credentials<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        if let Some(k) = pick(ENV_FIRMS_KEY) {
            self.credentials.firms_map_key = Some(k);
        }
        if let Some(k) = pick(ENV_OPENWEATHER_KEY) {
            self.credentials.openweather_api_key = Some(k);
        }
    }
}

/// Load configuration from an explicit TOML path.
pub fn load_from(path: &Path) -> Result<PipelineConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading pipeline config from {}", path.display()))?;
    parse_config(&content).with_context(|| format!("parsing {}", path.display()))
}

/// Load configuration using env var + fallbacks, then overlay credentials:
/// 1) $GEOHAZARD_CONFIG_PATH
/// 2) config/pipeline.toml
/// 3) built-in defaults
pub fn load_default() -> Result<PipelineConfig> {
    let mut cfg = if let Ok(p) = std::env::var(ENV_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            return Err(anyhow!("{ENV_PATH} points to non-existent path"));
        }
        load_from(&pb)?
    } else {
        let default_p = PathBuf::from(DEFAULT_PATH);
        if default_p.exists() {
            load_from(&default_p)?
        } else {
            PipelineConfig::default()
        }
    };
    cfg.overlay_credentials(|var| std::env::var(var).ok());
    Ok(cfg)
}

fn parse_config(s: &str) -> Result<PipelineConfig> {
    let cfg: PipelineConfig = toml::from_str(s)?;
    if cfg.cities.is_empty() {
        return Err(anyhow!("cities must not be empty"));
    }
    if let Some(c) = cfg
        .cities
        .iter()
        .find(|c| !(-90.0..=90.0).contains(&c.lat) || !(-180.0..=180.0).contains(&c.lon))
    {
        return Err(anyhow!(
            "city {:?} has out-of-range coordinates ({}, {})",
            c.name,
            c.lat,
            c.lon
        ));
    }
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_fill_missing_keys() {
        let cfg = parse_config("fetch_timeout_secs = 5\n").unwrap();
        assert_eq!(cfg.fetch_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.per_call_delay(), Duration::from_millis(100));
        assert_eq!(cfg.earthquake_days_back, 7);
        assert_eq!(cfg.cities.len(), 10);
        assert!(cfg.synthetic_fallback);
        assert!(cfg.credentials.firms_map_key().is_none());
    }

    #[test]
    fn full_toml_parses() {
        let toml = r#"
output_dir = "out"
firms_product = "VIIRS_SNPP_NRT"
synthetic_fallback = false

[synthetic]
fires = 5

[credentials]
firms_map_key = "abc"
openweather_api_key = "   "

[[cities]]
name = "Reykjavik"
lat = 64.1466
lon = -21.9426
"#;
        let cfg = parse_config(toml).unwrap();
        assert_eq!(cfg.output_dir, PathBuf::from("out"));
        assert_eq!(cfg.firms_product, FirmsProduct::ViirsSnppNrt);
        assert_eq!(cfg.firms_product.confidence_kind(), ConfidenceKind::Categorical);
        assert!(!cfg.synthetic_fallback);
        assert_eq!(cfg.synthetic.fires, 5);
        assert_eq!(cfg.synthetic.earthquakes, 40);
        assert_eq!(cfg.credentials.firms_map_key(), Some("abc"));
        assert_eq!(cfg.credentials.openweather_api_key(), None);
        assert_eq!(cfg.cities.len(), 1);
        assert_eq!(cfg.snapshot_dir_or_output(), Path::new("out"));
    }

    #[test]
    fn overlay_prefers_non_blank_env() {
        let mut cfg = PipelineConfig::default();
        cfg.credentials.firms_map_key = Some("from-file".into());
        let env: HashMap<&str, &str> =
            [(ENV_FIRMS_KEY, ""), (ENV_OPENWEATHER_KEY, "ow-key")].into_iter().collect();
        cfg.overlay_credentials(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(cfg.credentials.firms_map_key(), Some("from-file"));
        assert_eq!(cfg.credentials.openweather_api_key(), Some("ow-key"));
    }

    #[test]
    fn credentials_debug_hides_values() {
        let c = Credentials {
            firms_map_key: Some("very-secret".into()),
            openweather_api_key: None,
        };
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("very-secret"));
        assert!(dbg.contains("firms_map_key: true"));
    }

    #[test]
    fn rejects_empty_city_list() {
        let err = parse_config("cities = []\n").unwrap_err();
        assert!(err.to_string().contains("cities must not be empty"));
    }

    #[test]
    fn rejects_out_of_range_city() {
        let toml = r#"
[[cities]]
name = "Nowhere"
lat = 91.0
lon = 10.0
"#;
        let err = parse_config(toml).unwrap_err();
        assert!(err.to_string().contains("Nowhere"));

        let toml = r#"
[[cities]]
name = "Edge"
lat = -90.0
lon = 180.0
"#;
        assert_eq!(parse_config(toml).unwrap().cities.len(), 1);

        let toml = r#"
[[cities]]
name = "Wrapped"
lat = 10.0
lon = 200.0
"#;
        assert!(parse_config(toml).is_err());
    }

    #[test]
    fn rejects_unknown_product() {
        assert!(parse_config(r#"firms_product = "LANDSAT""#).is_err());
    }
}
