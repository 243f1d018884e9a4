//! Payment ledger error types.

use crate::Money;
use crate::directory::DirectoryError;
use crate::fees::FeeError;
use crate::store::StoreError;
use thiserror::Error;

/// Payment ledger errors
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Fee(FeeError),

    #[error(transparent)]
    Directory(DirectoryError),

    /// No student fee with this id
    #[error("Student fee not found: {0}")]
    FeeNotFound(String),

    /// No payment with this id
    #[error("Payment not found: {0}")]
    PaymentNotFound(String),

    /// Nothing left to pay, or a non-positive amount
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// Wallet cannot cover the payment
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Money, required: Money },

    /// Idempotency key already used
    #[error("Duplicate payment: {0}")]
    DuplicatePayment(String),
}

impl From<DirectoryError> for PaymentError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Store(e) => PaymentError::Store(e),
            DirectoryError::InsufficientBalance {
                available,
                required,
            } => PaymentError::InsufficientBalance {
                available,
                required,
            },
            other => PaymentError::Directory(other),
        }
    }
}

impl From<FeeError> for PaymentError {
    fn from(e: FeeError) -> Self {
        match e {
            FeeError::Store(e) => PaymentError::Store(e),
            FeeError::FeeNotFound(id) => PaymentError::FeeNotFound(id),
            other => PaymentError::Fee(other),
        }
    }
}

impl PaymentError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            PaymentError::Store(e) => e.client_message(),
            PaymentError::Fee(e) => e.client_message(),
            PaymentError::Directory(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;
