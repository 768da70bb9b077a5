//! Property access errors

use thiserror::Error;

/// Errors raised by typed accessors on an item's property bag
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PropertyError {
    /// The field is absent or null
    #[error("Property missing: {0}")]
    FieldMissing(String),

    /// The field exists but holds a different JSON type
    #[error("Property {field} is not a {expected}")]
    FieldTypeMismatch { field: String, expected: &'static str },
}

/// Result type alias for property access
pub type PropertyResult<T> = Result<T, PropertyError>;
