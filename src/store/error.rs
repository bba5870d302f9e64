//! Object store error types

use thiserror::Error;

/// Errors that can occur while talking to an object store
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required store setting is missing or blank
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The object does not exist in the bucket
    #[error("Object not found: gs://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Timeout, connection failure or a retryable server error
    #[error("Transient IO error: {0}")]
    TransientIo(String),

    /// Non-retryable HTTP failure
    #[error("Object store returned {status}: {message}")]
    Http { status: u16, message: String },

    /// Local filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Whether another attempt could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::TransientIo(_))
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            StoreError::TransientIo(format!("request timed out: {}", err))
        } else if err.is_connect() || err.is_request() || err.is_body() {
            StoreError::TransientIo(err.to_string())
        } else {
            StoreError::Http {
                status: err.status().map(|s| s.as_u16()).unwrap_or(0),
                message: err.to_string(),
            }
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
