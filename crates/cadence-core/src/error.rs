//! Error types for cadence.

use thiserror::Error;

/// Result type alias using cadence's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cadence operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource absent, or not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate dependency edge, username or email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing, invalid or expired credential
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Record store failure outside of sqlx (in-memory store, transaction aborts)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Cache backend failure
    #[error("Cache error: {0}")]
    Cache(String),

    /// Job queue error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures that belong to the backing store rather than the caller.
    pub fn is_internal(&self) -> bool {
        !matches!(
            self,
            Error::NotFound(_) | Error::Conflict(_) | Error::Unauthorized(_) | Error::InvalidInput(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
