//! Student fee ledger: per-student assignments of fee templates.
//!
//! Each [`StudentFee`] tracks the original and remaining amount of one charge.
//! The remaining amount stays within `0..=original` and the status is always
//! [`FeeStatus::from_amounts`] of the two.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{FeeError, FeeResult};
pub use manager::FeeLedger;
pub use models::{FeeCharge, FeeStatus, StudentFee};
