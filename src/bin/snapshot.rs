//! stacdash snapshot job
//!
//! Fetches every page of a collection's items and writes
//! `<output_dir>/<collection_id>.json`. Exits non-zero when any collection
//! fails to fetch or write.
//!
//! Run with: cargo run --bin stacdash-snapshot -- oco3-co2-sams-daygrid-v11r

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use stacdash::config::Config;
use stacdash::fetch::{HttpTransport, PagedCollectionFetcher};
use stacdash::snapshot::{OnFetchFailure, SnapshotBuilder, DEFAULT_COLLECTION_ID};

#[derive(Parser)]
#[command(name = "stacdash-snapshot")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Consolidate STAC collections into snapshot artifacts")]
struct Args {
    /// Collections to snapshot (default: `snapshot.collections`, then the OCO-3 SAMs collection)
    collection_ids: Vec<String>,

    /// Config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory receiving the artifacts
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Catalog API base URL
    #[arg(long)]
    stac_api_url: Option<String>,

    /// Page size requested from the catalog
    #[arg(short, long)]
    limit: Option<usize>,

    /// Policy when a walk aborts (abort, write-empty)
    #[arg(long)]
    on_failure: Option<OnFetchFailure>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    let mut config = Config::resolve(args.config.as_deref())?;
    if let Some(dir) = &args.output_dir {
        config.snapshot.output_dir = dir.to_string_lossy().to_string();
    }
    if let Some(url) = args.stac_api_url {
        config.stac.api_url = url;
    }
    if let Some(limit) = args.limit {
        config.stac.page_limit = limit;
    }
    if let Some(policy) = args.on_failure {
        config.snapshot.on_failure = policy;
    }
    config.logging.init_subscriber();

    let collection_ids = if !args.collection_ids.is_empty() {
        args.collection_ids
    } else if !config.snapshot.collections.is_empty() {
        config.snapshot.collections.clone()
    } else {
        vec![DEFAULT_COLLECTION_ID.to_string()]
    };

    let transport = HttpTransport::new(&config.stac.transport_config())
        .context("building HTTP client")?;
    let fetcher =
        PagedCollectionFetcher::new(Arc::new(transport)).with_page_limit(config.stac.page_limit);
    let builder = SnapshotBuilder::new(fetcher, config.snapshot_options());

    tracing::info!(
        stac_api_url = %config.stac.api_url,
        output_dir = %config.snapshot.output_dir,
        on_failure = %config.snapshot.on_failure,
        "Snapshotting {} collection(s)",
        collection_ids.len()
    );

    let mut failed = 0;
    for (collection_id, result) in builder.run_many(&collection_ids).await {
        match result {
            Ok(path) => tracing::info!("{} written to {}", collection_id, path.display()),
            Err(e) => {
                tracing::error!("{} failed: {}", collection_id, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        tracing::error!("{} of {} snapshot(s) failed", failed, collection_ids.len());
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
