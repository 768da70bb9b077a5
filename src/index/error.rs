//! Index error types

use thiserror::Error;

/// Errors that can occur while building or querying the target index
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// The item id does not follow `<kind>_<target>_<time>_<filter>_<measurement>`
    #[error("Malformed observation id: {0}")]
    MalformedIdentifier(String),

    #[error("Target not found: {0}")]
    TargetNotFound(String),

    #[error("Observation {observation_id} not found for target {target_id}")]
    ObservationNotFound {
        target_id: String,
        observation_id: String,
    },

    /// Target metadata could not be loaded
    #[error("Metadata error: {0}")]
    Metadata(String),
}

/// Result type alias for index operations
pub type IndexResult<T> = Result<T, IndexError>;
