//! Session error types.

use crate::directory::DirectoryError;
use crate::store::StoreError;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// Unknown username or wrong password
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account exists but is deactivated
    #[error("Account is disabled")]
    AccountDisabled,

    /// Token is unknown or revoked
    #[error("Session not found")]
    SessionNotFound,
}

impl SessionError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            SessionError::Store(e) => e.client_message(),
            SessionError::Directory(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
