//! Error types for papergraph.

use thiserror::Error;

use crate::models::JobId;

/// Result type alias using papergraph's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for papergraph operations.
#[derive(Error, Debug)]
pub enum Error {
    /// An input line failed to deserialize; fatal to the whole parse call.
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// An ingestion record arrived without a vector.
    #[error("Missing embedding for record: {0}")]
    MissingEmbedding(String),

    /// Index missing, corrupt, or unreadable.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Persisted similarity results missing or malformed.
    #[error("Results unavailable: {0}")]
    ResultsUnavailable(String),

    /// Pagination start beyond the end of the map.
    #[error("Page start {start} out of range for {len} entries")]
    OutOfRange { start: usize, len: usize },

    /// Unknown job handle.
    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    /// Job-level failure (still running, or failed with a captured message).
    #[error("Job error: {0}")]
    Job(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
