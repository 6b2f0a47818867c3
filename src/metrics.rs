use anyhow::Context;
use axum::{extract::State, routing::get, Router};
use metrics::{describe_gauge, gauge, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus exposition for the ingest counters, histograms and gauges.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global recorder and publish the configured schedule period.
    /// Fails if a recorder is already installed in this process.
    pub fn init(schedule_interval_secs: u64) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("installing prometheus recorder")?;

        describe_gauge!(
            "ingest_schedule_interval_secs",
            Unit::Seconds,
            "Configured period between pipeline runs"
        );
        gauge!("ingest_schedule_interval_secs").set(schedule_interval_secs as f64);

        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus text format.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/metrics", get(render))
            .with_state(self.handle.clone())
    }
}

async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
