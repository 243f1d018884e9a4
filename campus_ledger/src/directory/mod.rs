//! User directory: accounts, roles, and wallet balances.
//!
//! Usernames are unique ignoring case. Wallet adjustments are atomic and never
//! take a balance below zero.
//!
//! ## Example
//!
//! ```
//! use campus_ledger::directory::{NewUser, Role, UserDirectory};
//! use campus_ledger::store::MemoryStore;
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let users = UserDirectory::new(Arc::new(MemoryStore::new()));
//! users.create(NewUser::new("alice", "pw", Role::Student)).await?;
//!
//! assert_eq!(users.adjust_wallet("ALICE", 250).await?, 250);
//! assert!(users.adjust_wallet("alice", -300).await.is_err());
//! assert_eq!(users.get_wallet("alice").await?, 250);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{DirectoryError, DirectoryResult};
pub use manager::UserDirectory;
pub use models::{NewUser, Role, User, UserUpdate};
