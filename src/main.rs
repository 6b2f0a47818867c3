//! Geohazard ingest service: binary entrypoint.
//! Runs the pipeline on a schedule and serves the latest collections over Axum.

use std::sync::Arc;

use anyhow::Context;
use geohazard_ingest::api::{self, AppState, KeyPresence};
use geohazard_ingest::ingest::{
    config, fallback::DirSnapshotStore, fetch::HttpFetcher, scheduler, sink::FileSink, Pipeline,
};
use geohazard_ingest::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEV_LOG_VAR: &str = "GEOHAZARD_DEV_LOG";

/// Debug builds, or a Shuttle deployment tagged local/dev.
fn is_dev_environment() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    let env = std::env::var("SHUTTLE_ENV").unwrap_or_default();
    ["local", "development", "dev"]
        .iter()
        .any(|e| env.eq_ignore_ascii_case(e))
}

/// Compact console logs, only when `GEOHAZARD_DEV_LOG=1` in a dev environment.
/// Shuttle installs its own subscriber otherwise.
fn enable_dev_tracing() {
    let requested = std::env::var(DEV_LOG_VAR).is_ok_and(|v| v == "1");
    if !requested || !is_dev_environment() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(geohazard_ingest::DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(true))
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    // Picks up FIRMS_API_KEY / OPENWEATHER_API_KEY / GEOHAZARD_CONFIG_PATH.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let cfg = config::load_default().context("loading pipeline config")?;
    let metrics = Metrics::init(cfg.schedule_interval_secs)?;

    let fetcher = HttpFetcher::new(cfg.fetch_timeout())?;
    let snapshots = DirSnapshotStore::new(cfg.snapshot_dir_or_output());
    let sink = FileSink::new(&cfg.output_dir);
    let keys = KeyPresence::from_credentials(&cfg.credentials);
    tracing::info!(
        target: "ingest",
        credentials = ?cfg.credentials,
        output_dir = %cfg.output_dir.display(),
        "pipeline configured"
    );

    let pipeline = Arc::new(Pipeline::new(cfg, Arc::new(fetcher), Arc::new(snapshots)));
    let latest = scheduler::LatestRun::new();
    scheduler::spawn_scheduler(pipeline, Arc::new(sink), latest.clone());

    let router = api::create_router(AppState { latest, keys }).merge(metrics.router());

    Ok(router.into())
}
