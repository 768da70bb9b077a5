//! Snapshot Builder
//!
//! Consolidates a whole catalog collection into one artifact so deploy-time
//! consumers load a single file instead of walking the API:
//!
//! ```text
//! fetch (all pages) ──► CollectionSnapshot ──► temp file ──► rename ──► <dir>/<id>.json
//! ```

pub mod builder;
pub mod envelope;
pub mod error;

pub use builder::{
    validate_collection_id, OnFetchFailure, SnapshotBuilder, SnapshotOptions, DEFAULT_COLLECTION_ID,
};
pub use envelope::{envelope_links, load_snapshot, CollectionSnapshot};
pub use error::{SnapshotError, SnapshotResult};
