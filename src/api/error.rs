//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::dataset::DatasetError;
use crate::index::IndexError;
use crate::range::RangeError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Index lookup failed
    #[error("{0}")]
    Index(#[from] IndexError),

    /// Bad `start`/`end` query parameter
    #[error("{0}")]
    Range(#[from] RangeError),

    /// Reloading the dataset failed; the previous one stays in service
    #[error("Reload failed: {0}")]
    Reload(#[from] DatasetError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
    pub request_id: String,
}

/// Error details
#[derive(Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Index(e) => match e {
                IndexError::TargetNotFound(_) => (StatusCode::NOT_FOUND, "TARGET_NOT_FOUND"),
                IndexError::ObservationNotFound { .. } => {
                    (StatusCode::NOT_FOUND, "OBSERVATION_NOT_FOUND")
                }
                IndexError::MalformedIdentifier(_) => (StatusCode::BAD_REQUEST, "MALFORMED_ID"),
                IndexError::Metadata(_) => (StatusCode::INTERNAL_SERVER_ERROR, "METADATA_ERROR"),
            },
            ApiError::Range(_) => (StatusCode::BAD_REQUEST, "INVALID_WINDOW"),
            ApiError::Reload(_) => (StatusCode::SERVICE_UNAVAILABLE, "RELOAD_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        };

        let request_id = uuid::Uuid::new_v4().to_string();

        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::debug!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;
