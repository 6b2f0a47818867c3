// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod confidence;
pub mod feature;
pub mod ingest;
pub mod metrics;
pub mod quality;

/// Log filter used when `RUST_LOG` is unset. Covers this crate's module
/// paths plus the `ingest` and `api` event targets.
pub const DEFAULT_LOG_FILTER: &str = "geohazard_ingest=info,ingest=info,api=info,warn";

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::feature::{CanonicalFeature, Category, DataMode, FeatureCollection, TrustTier};
pub use crate::ingest::{Pipeline, RunError, RunOutput};

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::EnvFilter;

    #[test]
    fn default_log_filter_names_this_crate() {
        assert!(EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
        for target in ["geohazard_ingest=", "ingest=", "api="] {
            assert!(DEFAULT_LOG_FILTER.contains(target), "{target}");
        }
    }
}
