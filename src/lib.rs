//! # stacdash
//!
//! Catalog ingestion and target indexing for satellite greenhouse-gas
//! dashboards.
//!
//! ## Features
//!
//! - **Paged fetching**: Walks cursor-linked STAC pages strictly in order
//! - **Snapshots**: Consolidates a collection into one atomically written artifact
//! - **Target index**: Groups observations by target and type, sorted lazily
//! - **Range queries**: Binary-searched time windows over sorted timelines
//! - **Plumes**: Plume items joined with their point and polygon metadata
//! - **REST API**: Read-only Axum server over the index
//!
//! ## Modules
//!
//! - [`stac`]: Catalog item model
//! - [`fetch`]: Paginated collection fetcher
//! - [`snapshot`]: Snapshot builder and artifact envelope
//! - [`index`]: Target index
//! - [`range`]: Time-window queries
//! - [`coverage`]: Coverage footprints
//! - [`plumes`]: Plume metadata join
//! - [`dataset`]: Loading artifacts into an index
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stacdash::config::Config;
//! use stacdash::fetch::{HttpTransport, PagedCollectionFetcher};
//! use stacdash::snapshot::SnapshotBuilder;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     let transport = HttpTransport::new(&config.stac.transport_config())?;
//!     let fetcher = PagedCollectionFetcher::new(Arc::new(transport))
//!         .with_page_limit(config.stac.page_limit);
//!
//!     let builder = SnapshotBuilder::new(fetcher, config.snapshot_options());
//!     let path = builder.run("oco3-co2-sams-daygrid-v11r").await?;
//!
//!     println!("Snapshot written to {}", path.display());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod coverage;
pub mod dataset;
pub mod fetch;
pub mod index;
pub mod plumes;
pub mod range;
pub mod snapshot;
pub mod stac;

// Re-export top-level types for convenience
pub use stac::{CatalogItem, Geometry, ItemProperties, Link, PropertyError};

pub use fetch::{FetchError, FetchOutcome, HttpTransport, PageTransport, PagedCollectionFetcher};

pub use snapshot::{CollectionSnapshot, OnFetchFailure, SnapshotBuilder, SnapshotError, SnapshotOptions};

pub use index::{BuildReport, IndexError, MalformedPolicy, MetadataCatalog, Target, TargetIndex};

pub use range::{filter_by_range, TimeWindow, Timestamped};

pub use coverage::{CoverageCollection, CoverageFeature};

pub use plumes::{Plume, PlumeCollection, PlumeMetadata};

pub use dataset::{Dataset, DatasetError};

pub use api::{build_router, serve, ApiError, AppState};

pub use config::{ApiConfig, Config, ConfigError, IndexConfig, LoggingConfig, SnapshotConfig, StacConfig};
