//! Storage error types.

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored collection is not valid JSON for its record type
    #[error("Collection {0} holds malformed data")]
    Corrupt(String),

    /// Compare-and-swap kept losing to other writers
    #[error("Too many concurrent writers on {0}")]
    Conflict(String),
}

impl StoreError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            StoreError::Conflict(_) => "Please retry the request".to_string(),
            _ => "Internal server error".to_string(),
        }
    }
}

/// Result type for storage operations
pub type StoreResult<T> = Result<T, StoreError>;
