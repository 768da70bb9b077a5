//! Fetch error types

use thiserror::Error;

/// Errors that abort a page walk
///
/// Everything except `PaginationCycle` is a transport failure: the walk
/// stops at the failing page and no partial result is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    /// The server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    /// The request never produced a response (connect, timeout, TLS, ...)
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The body was not a JSON page
    #[error("Malformed page from {url}: {reason}")]
    MalformedBody { url: String, reason: String },

    /// A `next` link pointed back to a page already fetched in this walk
    #[error("Pagination cycle at {url}")]
    PaginationCycle { url: String },

    /// The HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl FetchError {
    /// URL of the page that failed, if any
    pub fn url(&self) -> Option<&str> {
        match self {
            FetchError::Status { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::MalformedBody { url, .. }
            | FetchError::PaginationCycle { url } => Some(url),
            FetchError::Client(_) => None,
        }
    }
}

/// Result type alias for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;
