//! Fee catalog error types.

use crate::Money;
use crate::store::StoreError;
use thiserror::Error;

/// Fee catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Fee category not found: {0}")]
    CategoryNotFound(String),

    #[error("Fee structure not found: {0}")]
    StructureNotFound(String),

    #[error("Payment policy not found: {0}")]
    PolicyNotFound(String),

    /// Amount must be positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// A required field is empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

impl CatalogError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            CatalogError::Store(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for fee catalog operations
pub type CatalogResult<T> = Result<T, CatalogError>;
