//! Student fee ledger error types.

use crate::Money;
use crate::catalog::CatalogError;
use crate::directory::DirectoryError;
use crate::store::StoreError;
use thiserror::Error;

/// Student fee ledger errors
#[derive(Debug, Error)]
pub enum FeeError {
    /// Storage error
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    /// No student fee with this id
    #[error("Student fee not found: {0}")]
    FeeNotFound(String),

    /// No fee structure with this id
    #[error("Fee structure not found: {0}")]
    StructureNotFound(String),

    /// No user with this username
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Amount is negative, or not positive where a charge is required
    #[error("Invalid amount: {0}")]
    InvalidAmount(Money),

    /// Payment larger than what is still owed
    #[error("Amount {amount} exceeds remaining balance {remaining}")]
    ExceedsRemaining { amount: Money, remaining: Money },
}

impl FeeError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            FeeError::Store(e) => e.client_message(),
            FeeError::Catalog(e) => e.client_message(),
            FeeError::Directory(e) => e.client_message(),
            _ => self.to_string(),
        }
    }
}

/// Result type for student fee operations
pub type FeeResult<T> = Result<T, FeeError>;
