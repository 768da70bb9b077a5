//! Plume error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading plume metadata
#[derive(Error, Debug)]
pub enum PlumeError {
    #[error("Failed to read plume metadata {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid plume metadata: {0}")]
    Parse(String),
}

/// Result type alias for plume operations
pub type PlumeResult<T> = Result<T, PlumeError>;
