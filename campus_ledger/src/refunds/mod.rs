//! Refund request queue.
//!
//! Approving or rejecting a request only records the decision. Payments and
//! student fees are left as they are.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{RefundError, RefundResult};
pub use manager::RefundQueue;
pub use models::{NewRefund, RefundRequest, RefundStatus};
