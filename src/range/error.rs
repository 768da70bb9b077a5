//! Range query error types

use thiserror::Error;

/// Errors from parsing a time window
///
/// Querying itself never fails; an empty or inverted window yields an
/// empty slice.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Invalid time bound '{0}': expected RFC 3339 or YYYY-MM-DD")]
    InvalidBound(String),
}

/// Result type alias for range operations
pub type RangeResult<T> = Result<T, RangeError>;
