//! # Confidence normalization
//!
//! Maps each source's native confidence representation onto one 0..=100 scale.
//!
//! - Numeric (`87`, `"87.9"`): truncated and clamped to `[0, 100]`.
//! - Categorical (`low`/`l` → 30, `nominal`/`n` → 60, `high`/`h` → 90), case-insensitive.
//! - Absent, blank, unrecognized or non-finite input → [`DEFAULT_CONFIDENCE`] (50).
//!
//! [`normalize`] is total: it never fails, so adapters can call it unconditionally.

use serde::{Deserialize, Serialize};

use crate::feature::DEFAULT_CONFIDENCE;

/// Confidence as it arrives from a source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawConfidence<'a> {
    Text(&'a str),
    Number(f64),
    Absent,
}

impl<'a> From<Option<&'a str>> for RawConfidence<'a> {
    fn from(v: Option<&'a str>) -> Self {
        v.map_or(RawConfidence::Absent, RawConfidence::Text)
    }
}

impl From<Option<f64>> for RawConfidence<'_> {
    fn from(v: Option<f64>) -> Self {
        v.map_or(RawConfidence::Absent, RawConfidence::Number)
    }
}

/// The representation a source natively reports. Both representations are
/// accepted regardless; the kind only marks unexpected input in traces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceKind {
    /// 0–100 percentage (MODIS).
    Percent,
    /// low / nominal / high (VIIRS).
    Categorical,
}

pub fn normalize(raw: RawConfidence<'_>, kind: ConfidenceKind) -> u8 {
    match raw {
        RawConfidence::Absent => DEFAULT_CONFIDENCE,
        RawConfidence::Number(n) => from_number(n),
        RawConfidence::Text(s) => {
            let t = s.trim();
            if t.is_empty() {
                return DEFAULT_CONFIDENCE;
            }
            if let Some(c) = categorical(t) {
                if kind == ConfidenceKind::Percent {
                    tracing::trace!(raw = t, "categorical confidence from a percent source");
                }
                return c;
            }
            match t.parse::<f64>() {
                Ok(n) => {
                    if kind == ConfidenceKind::Categorical {
                        tracing::trace!(raw = t, "numeric confidence from a categorical source");
                    }
                    from_number(n)
                }
                Err(_) => {
                    tracing::debug!(raw = t, "unrecognized confidence; using default");
                    DEFAULT_CONFIDENCE
                }
            }
        }
    }
}

fn categorical(s: &str) -> Option<u8> {
    match s.to_ascii_lowercase().as_str() {
        "low" | "l" => Some(30),
        "nominal" | "n" => Some(60),
        "high" | "h" => Some(90),
        _ => None,
    }
}

fn from_number(n: f64) -> u8 {
    if !n.is_finite() {
        return DEFAULT_CONFIDENCE;
    }
    n.clamp(0.0, 100.0).trunc() as u8
}
