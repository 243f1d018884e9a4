//! Reconciliation reports over fees and payments.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{ReportError, ReportResult};
pub use manager::Reconciler;
pub use models::{StudentBalance, UnpaidStudent};
