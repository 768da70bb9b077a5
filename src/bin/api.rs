//! stacdash API Server
//!
//! Run with: cargo run --bin stacdash-api
//!
//! # Configuration
//!
//! Read from `--config`, or the first of `~/.config/stacdash/config.toml`,
//! `/etc/stacdash/config.toml` and `./stacdash.toml`. Environment variables:
//! - `STACDASH_SNAPSHOT_PATH`: Snapshot artifact to serve
//! - `STACDASH_METADATA_PATH`: Target metadata side file (optional)
//! - `STACDASH_COVERAGE_PATH`: Coverage footprints (optional)
//! - `STACDASH_PLUME_SNAPSHOT_PATH`: Plume collection snapshot (optional)
//! - `STACDASH_PLUME_METADATA_PATH`: Plume metadata joined by item id (optional)
//! - `STACDASH_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `STACDASH_API_PORT`: Port to listen on (default: 8083)
//! - `RUST_LOG`: Log filter (default: `logging.level`)

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use stacdash::api::{serve, AppState};
use stacdash::config::Config;
use stacdash::dataset::Dataset;

#[derive(Parser)]
#[command(name = "stacdash-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Serve a stacdash snapshot over HTTP")]
struct Args {
    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = Config::resolve(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.api.port = port;
    }
    config.logging.init_subscriber();

    tracing::info!("Starting stacdash API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Snapshot: {}", config.index.snapshot_path);

    let sources = config.index.clone();
    let dataset = tokio::task::spawn_blocking(move || Dataset::load(&sources))
        .await?
        .with_context(|| format!("loading {}", config.index.snapshot_path))?;

    let report = &dataset.report;
    tracing::info!(
        items = report.items,
        indexed = report.indexed,
        targets = dataset.index.len(),
        missing_metadata = report.missing_metadata,
        malformed = report.malformed,
        coverage = dataset.coverage.len(),
        plumes = dataset.plumes.len(),
        "Index built"
    );
    if !report.unknown_targets.is_empty() {
        tracing::warn!(
            "No metadata for {} targets: {:?}",
            report.unknown_targets.len(),
            report.unknown_targets
        );
    }

    let state = AppState::new(dataset, config.index.clone(), config.api.clone());

    serve(state, &config.api).await?;

    tracing::info!("stacdash API server stopped");
    Ok(())
}
