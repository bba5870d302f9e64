//! API Error Types
//!
//! Maps snapshot and server failures to HTTP responses with a JSON error
//! body and a request id.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::snapshot::SnapshotError;
use crate::table::LoadError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Building a new snapshot failed; the previous one is still served
    #[error("Reload failed: {0}")]
    Reload(#[from] SnapshotError),

    /// Another reload is already running
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// Status code and machine-readable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Reload(SnapshotError::Load(err)) => match err {
                LoadError::NotFound { .. } => (StatusCode::SERVICE_UNAVAILABLE, "SNAPSHOT_NOT_FOUND"),
                LoadError::TransientIo(_) => (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE"),
                LoadError::Parse { .. } => (StatusCode::UNPROCESSABLE_ENTITY, "PARSE_ERROR"),
                LoadError::Store(_) => (StatusCode::BAD_GATEWAY, "STORE_ERROR"),
                LoadError::Configuration(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "CONFIGURATION_ERROR")
                }
                LoadError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
            },
            ApiError::Reload(SnapshotError::Aggregate(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "AGGREGATE_ERROR")
            }
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "RELOAD_IN_PROGRESS"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }
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
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        tracing::error!(
            request_id = %request_id,
            error_code = %code,
            error_message = %self,
            "API error occurred"
        );

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
