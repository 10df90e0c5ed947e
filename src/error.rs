//! Error types for the PhishGuard training pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PhishGuardError>;

/// Main error type for the pipeline
///
/// Store-connectivity, schema, and threshold failures carry their own
/// variants so callers can tell them apart at the top level.
#[derive(Error, Debug)]
pub enum PhishGuardError {
    #[error("Store error: {0}")]
    Store(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Threshold violation: {name} = {value:.4}, limit {limit:.4}")]
    ThresholdViolation {
        name: String,
        value: f64,
        limit: f64,
    },

    #[error("Data error: {0}")]
    Data(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    Shape { expected: String, actual: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Model not fitted")]
    ModelNotFitted,
}

impl From<polars::error::PolarsError> for PhishGuardError {
    fn from(err: polars::error::PolarsError) -> Self {
        PhishGuardError::Data(err.to_string())
    }
}

impl From<serde_json::Error> for PhishGuardError {
    fn from(err: serde_json::Error) -> Self {
        PhishGuardError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for PhishGuardError {
    fn from(err: serde_yaml::Error) -> Self {
        PhishGuardError::Serialization(err.to_string())
    }
}
