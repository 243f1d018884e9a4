//! Report error types.

use crate::directory::DirectoryError;
use crate::fees::FeeError;
use crate::payments::PaymentError;
use thiserror::Error;

/// Errors raised while reading the ledgers for a report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error(transparent)]
    Fee(#[from] FeeError),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

impl ReportError {
    /// Get a client-safe error message that doesn't leak storage details
    pub fn client_message(&self) -> String {
        match self {
            ReportError::Directory(e) => e.client_message(),
            ReportError::Fee(e) => e.client_message(),
            ReportError::Payment(e) => e.client_message(),
        }
    }
}

/// Result type for reports
pub type ReportResult<T> = Result<T, ReportError>;
