//! Error types for CourseBuddy
//!
//! One error enum for the whole query-time engine, so callers can tell an
//! empty question apart from a broken index or an unreachable oracle.

use std::time::Duration;
use thiserror::Error;

/// Main error type for the CourseBuddy engine
#[derive(Error, Debug)]
pub enum TutorError {
    /// Question was empty after trimming and prefix stripping
    #[error("Question is empty")]
    EmptyQuestion,

    /// A vector did not match the index dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector count and metadata sidecar length disagree
    #[error("Index holds {vectors} vectors but metadata has {metadata} records")]
    MetadataMismatch { vectors: usize, metadata: usize },

    /// Index file could not be decoded
    #[error("Invalid index file: {0}")]
    IndexFormat(String),

    /// A required data file is absent
    #[error("Required resource not found: {0}")]
    MissingResource(String),

    /// Embedding backend failures (including empty input)
    #[error("Embedding error ({backend}): {message}")]
    Embedding { backend: String, message: String },

    /// Language-model API errors; `status` is set for non-success HTTP replies
    #[error("Oracle API error ({backend}): {message}")]
    OracleApi {
        backend: String,
        status: Option<u16>,
        message: String,
    },

    /// Verification loop state machine errors
    #[error("Invalid state transition from {from} via {event}")]
    InvalidTransition { from: String, event: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic errors with context
    #[error("CourseBuddy error: {0}")]
    Generic(String),
}

impl TutorError {
    pub fn embedding(backend: &str, message: impl ToString) -> Self {
        TutorError::Embedding {
            backend: backend.to_string(),
            message: message.to_string(),
        }
    }

    pub fn oracle(backend: &str, message: impl ToString) -> Self {
        TutorError::OracleApi {
            backend: backend.to_string(),
            status: None,
            message: message.to_string(),
        }
    }

    /// Non-success HTTP reply from an oracle backend
    pub fn oracle_status(backend: &str, status: u16, body: impl std::fmt::Display) -> Self {
        TutorError::OracleApi {
            backend: backend.to_string(),
            status: Some(status),
            message: format!("HTTP {}: {}", status, body),
        }
    }

    /// Transport failure of a request sent with client timeout `timeout`
    pub fn request(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            TutorError::Timeout {
                duration_ms: timeout.as_millis() as u64,
            }
        } else {
            TutorError::HttpError(err)
        }
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, TutorError>;

/// Convert anyhow errors to TutorError
impl From<anyhow::Error> for TutorError {
    fn from(err: anyhow::Error) -> Self {
        TutorError::Generic(err.to_string())
    }
}
