//! Aggregation error types

use thiserror::Error;

/// Errors that can occur while aggregating a record table
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AggregateError {
    /// Ratio whose denominator aggregate is zero
    #[error("Division by zero: {expression}")]
    DivisionByZero { expression: String },

    /// Referenced column does not exist in the table
    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    /// Value column is not numeric
    #[error("Column '{column}' is {actual}, expected number")]
    NotNumeric { column: String, actual: String },

    /// Grouping specification is unusable
    #[error("Invalid grouping: {0}")]
    InvalidSpec(String),
}

/// Result type for aggregation operations
pub type AggregateResult<T> = Result<T, AggregateError>;
