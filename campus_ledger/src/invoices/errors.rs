//! Invoice error types.

use crate::Money;
use crate::directory::DirectoryError;
use crate::payments::PaymentError;
use crate::store::StoreError;
use thiserror::Error;

/// Invoice errors
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Payment(#[from] PaymentError),

    #[error(transparent)]
    Directory(DirectoryError),

    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),

    /// Invoice is already paid or cancelled
    #[error("Invoice {id} is {status}")]
    NotPayable { id: String, status: String },

    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// Wallet cannot cover the invoice
    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: Money, required: Money },
}

impl From<DirectoryError> for InvoiceError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Store(e) => InvoiceError::Store(e),
            DirectoryError::InsufficientBalance {
                available,
                required,
            } => InvoiceError::InsufficientBalance {
                available,
                required,
            },
            other => InvoiceError::Directory(other),
        }
    }
}

impl InvoiceError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            InvoiceError::Store(e) => e.client_message(),
            InvoiceError::Payment(e) => e.client_message(),
            InvoiceError::Directory(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for invoice operations
pub type InvoiceResult<T> = Result<T, InvoiceError>;
