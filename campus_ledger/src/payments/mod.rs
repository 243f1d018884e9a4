//! Payment ledger: payments against student fees, wallet debits, and history.
//!
//! A payment is recorded as pending before any money moves, then completed
//! once the wallet debit and the fee update both succeed. A failed step
//! undoes the earlier ones, so a failed payment leaves no row behind.
//!
//! ## Example
//!
//! ```
//! use campus_ledger::Campus;
//! use campus_ledger::catalog::NewStructure;
//! use campus_ledger::directory::{NewUser, Role};
//! use campus_ledger::payments::PaymentRequest;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let campus = Campus::in_memory();
//! campus
//!     .create_structure(NewStructure {
//!         category_id: "category-tuition".to_string(),
//!         academic_year: "2025-2026".to_string(),
//!         amount: 500,
//!         due_date: None,
//!         is_active: true,
//!     })
//!     .await?;
//! campus.create_user(NewUser::new("alice", "pw", Role::Student)).await?;
//!
//! let fee = campus.fees.list_for_student("alice").await?.remove(0);
//! let payment = campus
//!     .payments
//!     .create(PaymentRequest::new("alice", &fee.id, 700, "Online"))
//!     .await?;
//! assert_eq!(payment.amount, 500);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{PaymentError, PaymentResult};
pub use manager::PaymentLedger;
pub use models::{Payment, PaymentRequest, PaymentStatus, WALLET_METHOD};
