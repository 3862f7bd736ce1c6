//! Error types for the askdocs pipeline
//!
//! One enum covers the whole crate so callers can match on failure kind
//! and decide retry vs abort.

use thiserror::Error;

/// Main error type for the retrieval and generation pipeline
#[derive(Error, Debug)]
pub enum QaError {
    /// Embedding vector has the wrong dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// One retrieval index is empty or unreachable
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Model backend could not be reached
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    /// Streaming exceeded the per-request deadline
    #[error("Backend timed out after {duration_ms}ms")]
    BackendTimeout { duration_ms: u64 },

    /// Caller cancelled the request; partial tokens already delivered are valid
    #[error("Cancelled by caller")]
    Cancelled,

    /// Generation phase machine rejected a transition
    #[error("Invalid phase transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Query was empty after sanitization
    #[error("Query is empty")]
    EmptyQuery,

    /// Mid-stream failure from the backend
    #[error("Streaming error: {0}")]
    Stream(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Conversation store errors
    #[error("Conversation store error: {0}")]
    Store(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, QaError>;

impl QaError {
    /// Whether a fresh attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            QaError::BackendUnreachable(_)
                | QaError::BackendTimeout { .. }
                | QaError::Http(_)
                | QaError::Stream(_)
        )
    }
}

/// Convert anyhow errors from config/persistence boundaries
impl From<anyhow::Error> for QaError {
    fn from(err: anyhow::Error) -> Self {
        QaError::Generic(err.to_string())
    }
}
