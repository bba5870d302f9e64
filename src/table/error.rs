//! Loader error types

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur while loading a snapshot into a record table
#[derive(Error, Debug)]
pub enum LoadError {
    /// Required setting (bucket) is missing
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The snapshot object does not exist
    #[error("Snapshot not found: gs://{bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Timeout or connection failure while fetching
    #[error("Transient IO error: {0}")]
    TransientIo(String),

    /// Malformed delimited text. `row` is the 1-based data row, 0 for the header.
    #[error("Parse error at row {row}, column '{column}': {message}")]
    Parse {
        row: usize,
        column: String,
        message: String,
    },

    /// Other object store failure
    #[error("Store error: {0}")]
    Store(StoreError),

    /// Temp file staging failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoadError {
    pub(crate) fn parse(row: usize, column: impl Into<String>, message: impl Into<String>) -> Self {
        LoadError::Parse {
            row,
            column: column.into(),
            message: message.into(),
        }
    }
}

impl From<StoreError> for LoadError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Configuration(msg) => LoadError::Configuration(msg),
            StoreError::NotFound { bucket, key } => LoadError::NotFound { bucket, key },
            StoreError::TransientIo(msg) => LoadError::TransientIo(msg),
            other => LoadError::Store(other),
        }
    }
}

/// Result type alias for load operations
pub type LoadResult<T> = Result<T, LoadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_names_row_and_column() {
        let err = LoadError::parse(3, "signup_date", "invalid date 'soon'");
        assert_eq!(
            err.to_string(),
            "Parse error at row 3, column 'signup_date': invalid date 'soon'"
        );
    }

    #[test]
    fn test_store_error_conversion() {
        let err: LoadError = StoreError::NotFound {
            bucket: "b".into(),
            key: "k.csv".into(),
        }
        .into();
        assert!(matches!(err, LoadError::NotFound { .. }));

        let err: LoadError = StoreError::TransientIo("timed out".into()).into();
        assert!(matches!(err, LoadError::TransientIo(_)));

        let err: LoadError = StoreError::Configuration("no bucket".into()).into();
        assert!(matches!(err, LoadError::Configuration(_)));
    }
}
