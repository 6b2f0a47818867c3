//! # Quality scoring
//!
//! Composite trust score per feature, reported on the unit scale `[0.0, 1.0]`.
//!
//! Two families of strategy, selected per category by [`QualityStrategy::for_category`]:
//! - computed from the record (fire: confidence + radiative power; earthquake:
//!   magnitude ratio),
//! - fixed per source (official feeds 0.95, satellite events 0.9, sensor
//!   networks 0.85, synthetic data 0.7).
//!
//! The computed fire score is produced on the 0..=100 scale by
//! [`computed_score`] and divided by 100 when stored on a feature.

use crate::feature::Category;

pub const OFFICIAL_FEED_QUALITY: f64 = 0.95;
pub const EXPERT_REVIEW_QUALITY: f64 = 0.9;
pub const SATELLITE_EVENT_QUALITY: f64 = 0.9;
pub const SENSOR_NETWORK_QUALITY: f64 = 0.85;
/// Always below every real-data tier.
pub const SYNTHETIC_QUALITY: f64 = 0.7;

/// Magnitude that maps to a perfect earthquake score.
pub const EARTHQUAKE_FULL_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QualityStrategy {
    /// `(50 + confidence) / 2`, plus a bonus for a strong magnitude signal.
    Computed,
    /// `min(magnitude / full_scale, 1.0)`.
    MagnitudeRatio { full_scale: f64 },
    /// Source-level trust constant.
    Fixed(f64),
}

impl QualityStrategy {
    pub fn for_category(category: Category) -> Self {
        match category {
            Category::ActiveFire => QualityStrategy::Computed,
            Category::Earthquake => QualityStrategy::MagnitudeRatio {
                full_scale: EARTHQUAKE_FULL_SCALE,
            },
            Category::WeatherStation | Category::WeatherAlert | Category::SolarFlare => {
                QualityStrategy::Fixed(OFFICIAL_FEED_QUALITY)
            }
            Category::NaturalEvent => QualityStrategy::Fixed(SATELLITE_EVENT_QUALITY),
            Category::Volcano => QualityStrategy::Fixed(EXPERT_REVIEW_QUALITY),
            Category::AirQuality => QualityStrategy::Fixed(SENSOR_NETWORK_QUALITY),
        }
    }

    pub fn synthetic() -> Self {
        QualityStrategy::Fixed(SYNTHETIC_QUALITY)
    }

    /// Score on `[0, 1]`. `signal` is the magnitude-like value for the
    /// category (FRP for fires, magnitude for earthquakes).
    pub fn unit_score(&self, confidence: u8, signal: Option<f64>) -> f64 {
        match *self {
            QualityStrategy::Computed => f64::from(computed_score(confidence, signal)) / 100.0,
            QualityStrategy::MagnitudeRatio { full_scale } => {
                signal.map_or(0.0, |m| magnitude_ratio(m, full_scale))
            }
            QualityStrategy::Fixed(q) => q.clamp(0.0, 1.0),
        }
    }
}

/// Fire-style composite on the 0..=100 scale.
///
/// 1. base 50, averaged with the normalized confidence;
/// 2. +10 when the signal exceeds 100, +5 when it exceeds 50;
/// 3. truncated and capped at 100.
pub fn computed_score(confidence: u8, signal: Option<f64>) -> u8 {
    let mut score = (50.0 + f64::from(confidence.min(100))) / 2.0;
    match signal.filter(|s| s.is_finite()) {
        Some(s) if s > 100.0 => score += 10.0,
        Some(s) if s > 50.0 => score += 5.0,
        _ => {}
    }
    score.trunc().min(100.0) as u8
}

pub fn magnitude_ratio(magnitude: f64, full_scale: f64) -> f64 {
    if !magnitude.is_finite() || full_scale <= 0.0 {
        return 0.0;
    }
    (magnitude / full_scale).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computed_averages_confidence_with_base() {
        assert_eq!(computed_score(50, None), 50);
        assert_eq!(computed_score(90, None), 70);
        assert_eq!(computed_score(0, None), 25);
        // (50 + 61) / 2 = 55.5 → truncated
        assert_eq!(computed_score(61, None), 55);
    }

    #[test]
    fn computed_signal_bonus_thresholds() {
        assert_eq!(computed_score(90, Some(50.0)), 70);
        assert_eq!(computed_score(90, Some(50.1)), 75);
        assert_eq!(computed_score(90, Some(100.0)), 75);
        assert_eq!(computed_score(90, Some(100.1)), 80);
        assert_eq!(computed_score(100, Some(5000.0)), 85);
        assert_eq!(computed_score(90, Some(f64::NAN)), 70);
    }

    #[test]
    fn magnitude_ratio_caps_at_one() {
        assert!((magnitude_ratio(4.7, 10.0) - 0.47).abs() < 1e-9);
        assert_eq!(magnitude_ratio(12.0, 10.0), 1.0);
        assert_eq!(magnitude_ratio(f64::NAN, 10.0), 0.0);
    }

    #[test]
    fn strategies_per_category() {
        let fire = QualityStrategy::for_category(Category::ActiveFire);
        assert!((fire.unit_score(90, Some(120.0)) - 0.80).abs() < 1e-9);

        let eq = QualityStrategy::for_category(Category::Earthquake);
        assert!((eq.unit_score(50, Some(6.3)) - 0.63).abs() < 1e-9);

        assert_eq!(
            QualityStrategy::for_category(Category::WeatherAlert).unit_score(0, None),
            0.95
        );
        assert_eq!(
            QualityStrategy::for_category(Category::Volcano).unit_score(0, None),
            0.9
        );
        assert_eq!(
            QualityStrategy::for_category(Category::AirQuality).unit_score(0, None),
            0.85
        );
    }

    #[test]
    fn synthetic_is_below_every_real_fixed_tier() {
        let s = QualityStrategy::synthetic().unit_score(100, Some(1000.0));
        assert!(s <= 0.7);
        for c in Category::ALL {
            if let QualityStrategy::Fixed(q) = QualityStrategy::for_category(c) {
                assert!(s < q, "{c:?}");
            }
        }
    }
}
