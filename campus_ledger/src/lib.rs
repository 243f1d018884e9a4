//! # Campus Ledger
//!
//! Fee, payment, wallet, refund, and invoice bookkeeping for a university
//! accounting office.
//!
//! Every component persists through the [`store::KeyValueStore`] trait, one
//! JSON collection per record type. Single-record updates are atomic
//! (compare-and-swap with retry), so concurrent callers never lose writes.
//!
//! ## Core Modules
//!
//! - [`store`]: key-value backends, typed collections, cookies
//! - [`directory`]: user accounts and wallets
//! - [`catalog`]: fee categories, fee structure templates, payment policies
//! - [`fees`]: per-student fee assignments
//! - [`payments`]: payment ledger
//! - [`refunds`]: refund request queue
//! - [`invoices`]: free-standing invoices
//! - [`session`]: login, current user, remember-me, bearer tokens
//! - [`reports`]: reconciliation reports
//!
//! ## Example
//!
//! ```
//! use campus_ledger::Campus;
//! use campus_ledger::directory::{NewUser, Role};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let campus = Campus::in_memory();
//! campus.initialize().await?;
//!
//! // New students are enrolled in every active fee template
//! campus.create_user(NewUser::new("alice", "pw", Role::Student)).await?;
//! let balance = campus.reports.student_balance("alice").await?;
//! assert_eq!(balance.outstanding, 5500);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod directory;
pub mod fees;
pub mod invoices;
pub mod payments;
pub mod refunds;
pub mod reports;
pub mod session;
pub mod store;

use catalog::{FeeCatalog, FeeStructure, NewStructure, StructureUpdate};
use chrono::Utc;
use directory::{NewUser, User, UserDirectory, UserUpdate};
use fees::{FeeLedger, FeeResult};
use invoices::InvoiceBook;
use payments::PaymentLedger;
use refunds::RefundQueue;
use reports::Reconciler;
use session::SessionManager;
use std::sync::Arc;
use store::{KeyValueStore, MemoryStore};

/// Amount in minor currency units
pub type Money = i64;

/// Every ledger component wired to one shared store.
///
/// Account and template changes made through `Campus` keep enrollment current:
/// a new active student gets every active template, and a template that is
/// created or reactivated is handed to every active student.
#[derive(Clone)]
pub struct Campus {
    pub store: Arc<dyn KeyValueStore>,
    pub users: UserDirectory,
    pub catalog: FeeCatalog,
    pub fees: FeeLedger,
    pub payments: PaymentLedger,
    pub refunds: RefundQueue,
    pub invoices: InvoiceBook,
    pub sessions: SessionManager,
    pub reports: Reconciler,
}

impl Campus {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let users = UserDirectory::new(store.clone());
        let catalog = FeeCatalog::new(store.clone());
        let fees = FeeLedger::new(store.clone(), catalog.clone(), users.clone());
        let payments = PaymentLedger::new(store.clone(), fees.clone(), users.clone());
        let refunds = RefundQueue::new(store.clone());
        let invoices = InvoiceBook::new(store.clone(), payments.clone(), users.clone());
        let sessions = SessionManager::new(store.clone(), users.clone());
        let reports = Reconciler::new(users.clone(), fees.clone(), payments.clone());

        Self {
            store,
            users,
            catalog,
            fees,
            payments,
            refunds,
            invoices,
            sessions,
            reports,
        }
    }

    /// Campus over a fresh [`MemoryStore`]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Seed the default catalog if it was never written, then enroll students
    pub async fn initialize(&self) -> FeeResult<()> {
        if self.catalog.seed_defaults(Utc::now()).await? {
            self.fees.enroll_all_students().await?;
        }
        Ok(())
    }

    /// Create an account; active students are enrolled right away
    pub async fn create_user(&self, new_user: NewUser) -> FeeResult<User> {
        let user = self.users.create(new_user).await?;
        if user.is_active && user.is_student() {
            self.fees.enroll(&user.username).await?;
        }
        Ok(user)
    }

    /// Update an account; a student who becomes active is enrolled.
    ///
    /// Fees, payments, refund requests, and invoices are keyed by username, so
    /// a rename moves the account's rows to the new name before enrollment runs.
    pub async fn update_user(&self, id: &str, changes: UserUpdate) -> FeeResult<User> {
        let previous = self.users.find(id).await?;
        let user = self.users.update(id, changes).await?;

        if let Some(previous) = previous.filter(|p| p.username != user.username) {
            self.rename_owner(&previous.username, &user.username).await?;
        }
        if user.is_active && user.is_student() {
            self.fees.enroll(&user.username).await?;
        }
        Ok(user)
    }

    async fn rename_owner(&self, old: &str, new: &str) -> FeeResult<()> {
        let fees = self.fees.rename_owner(old, new).await?;
        let payments = self.payments.rename_owner(old, new).await?;
        let refunds = self.refunds.rename_owner(old, new).await?;
        let invoices = self.invoices.rename_owner(old, new).await?;
        log::info!(
            "Renamed {old} to {new}: moved {fees} fee(s), {payments} payment(s), \
             {refunds} refund request(s), {invoices} invoice(s)"
        );
        Ok(())
    }

    /// Create a template; an active one is assigned to every active student
    pub async fn create_structure(&self, new: NewStructure) -> FeeResult<FeeStructure> {
        let structure = self.catalog.create_structure(new).await?;
        if structure.is_active {
            self.fees.enroll_all_students().await?;
        }
        Ok(structure)
    }

    /// Update a template; an active one is assigned to students who lack it
    pub async fn update_structure(
        &self,
        id: &str,
        changes: StructureUpdate,
    ) -> FeeResult<FeeStructure> {
        let structure = self.catalog.update_structure(id, changes).await?;
        if structure.is_active {
            self.fees.enroll_all_students().await?;
        }
        Ok(structure)
    }
}
