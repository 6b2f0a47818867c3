//! One-shot pipeline run: fetch every source once and write the collections
//! plus `data-summary.json` into the configured output directory.
//!
//! `LOG_FORMAT=json` switches log output to JSON lines.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use geohazard_ingest::ingest::{
    config, fallback::DirSnapshotStore, fetch::HttpFetcher, sink::FileSink, Pipeline, RunError,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(geohazard_ingest::DEFAULT_LOG_FILTER));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().with_target(false)).init();
    }
}

async fn run() -> anyhow::Result<bool> {
    let cfg = config::load_default().context("loading pipeline config")?;
    let fetcher = HttpFetcher::new(cfg.fetch_timeout())?;
    let snapshots = DirSnapshotStore::new(cfg.snapshot_dir_or_output());
    let sink = FileSink::new(&cfg.output_dir);

    let pipeline = Pipeline::new(cfg, Arc::new(fetcher), Arc::new(snapshots));
    let (output, persisted) = match pipeline.run_and_emit(&sink).await {
        Ok(output) => (output, true),
        Err(err @ RunError::Sink { .. }) => {
            tracing::error!(error = %err, dir = %sink.dir().display(), "writing output failed");
            (err.into_output(), false)
        }
    };

    for entry in &output.entries {
        let r = &entry.report;
        println!(
            "{:<18} {:<9} {:>5} features  skipped={} filtered={}{}",
            r.source.collection_name(),
            r.outcome.as_str(),
            r.record_count,
            r.skipped,
            r.filtered,
            r.reason.as_deref().map(|s| format!("  ({s})")).unwrap_or_default()
        );
    }
    println!("total: {} features", output.summary.total_features());
    Ok(persisted)
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    init_tracing();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(2),
        Err(e) => {
            tracing::error!(error = ?e, "fetch_once failed");
            ExitCode::FAILURE
        }
    }
}
