//! Coverage error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading coverage data
#[derive(Error, Debug)]
pub enum CoverageError {
    #[error("Failed to read coverage {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid coverage data: {0}")]
    Parse(String),
}

/// Result type alias for coverage operations
pub type CoverageResult<T> = Result<T, CoverageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_names_the_file() {
        let err = CoverageError::Read {
            path: PathBuf::from("/data/oco3-coverage.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(err.to_string().contains("/data/oco3-coverage.json"));
    }
}
