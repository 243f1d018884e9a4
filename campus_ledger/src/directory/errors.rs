//! User directory error types.

use crate::Money;
use crate::store::StoreError;
use thiserror::Error;

/// User directory errors
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    /// No user with this id or username
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Username already registered (case-insensitive)
    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// Username is empty after trimming
    #[error("Username must not be empty")]
    InvalidUsername,

    /// Wallet would go negative
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Money, required: Money },

    /// Negative wallet balance requested
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),
}

impl DirectoryError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            DirectoryError::Store(e) => e.client_message(),
            DirectoryError::UserNotFound(_) => "User not found".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for user directory operations
pub type DirectoryResult<T> = Result<T, DirectoryError>;
