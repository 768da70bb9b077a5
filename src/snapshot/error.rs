//! Snapshot error types

use std::path::PathBuf;
use thiserror::Error;

use crate::fetch::FetchError;

/// Errors that can occur while building, writing or loading a snapshot
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// The collection walk was aborted
    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The artifact could not be written
    #[error("Failed to write snapshot {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact could not be read
    #[error("Failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The envelope counts disagree with its feature list
    #[error(
        "Inconsistent snapshot: numberMatched={matched}, numberReturned={returned}, features={features}"
    )]
    Inconsistent {
        matched: usize,
        returned: usize,
        features: usize,
    },

    /// The collection id cannot name an artifact file
    #[error("Invalid collection id: {0:?}")]
    InvalidCollectionId(String),

    /// A concurrent snapshot task panicked or was cancelled
    #[error("Snapshot task failed: {0}")]
    Task(String),
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Serialization(err.to_string())
    }
}

/// Result type alias for snapshot operations
pub type SnapshotResult<T> = Result<T, SnapshotError>;
