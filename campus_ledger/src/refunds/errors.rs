//! Refund queue error types.

use crate::Money;
use crate::store::StoreError;
use thiserror::Error;

/// Refund queue errors
#[derive(Debug, Error)]
pub enum RefundError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Refund request not found: {0}")]
    RequestNotFound(String),

    /// Refund amount must be positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// Requests can only be approved or rejected
    #[error("Cannot set refund status to {0}")]
    InvalidStatus(String),
}

impl RefundError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            RefundError::Store(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for refund operations
pub type RefundResult<T> = Result<T, RefundError>;
