//! Student fee ledger manager.

use super::{
    errors::{FeeError, FeeResult},
    models::{FeeCharge, StudentFee},
};
use crate::Money;
use crate::catalog::FeeCatalog;
use crate::directory::UserDirectory;
use crate::store::{Collection, KeyValueStore};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;

/// Student fee ledger over the `studentFees` collection
#[derive(Clone)]
pub struct FeeLedger {
    fees: Collection<StudentFee>,
    catalog: FeeCatalog,
    users: UserDirectory,
}

impl FeeLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, catalog: FeeCatalog, users: UserDirectory) -> Self {
        Self {
            fees: Collection::new(store),
            catalog,
            users,
        }
    }

    /// Assign every active template the student does not have yet.
    ///
    /// Idempotent: the check and the inserts are one atomic write. Returns the
    /// rows it created.
    pub async fn enroll(&self, username: &str) -> FeeResult<Vec<StudentFee>> {
        let templates = self.catalog.active_structures().await?;
        if templates.is_empty() {
            return Ok(Vec::new());
        }

        let created = self
            .fees
            .modify(|fees| {
                let assigned: HashSet<&str> = fees
                    .iter()
                    .filter(|f| f.belongs_to(username))
                    .map(|f| f.fee_structure_id.as_str())
                    .collect();

                let new_rows: Vec<StudentFee> = templates
                    .iter()
                    .filter(|t| !assigned.contains(t.id.as_str()))
                    .map(|t| StudentFee::new(username, &t.id, t.amount))
                    .collect();

                fees.extend(new_rows.iter().cloned());
                Ok::<_, FeeError>(new_rows)
            })
            .await?;

        if !created.is_empty() {
            log::info!("Enrolled {username} in {} fee(s)", created.len());
        }
        Ok(created)
    }

    /// Enroll every active student; returns the number of rows created
    pub async fn enroll_all_students(&self) -> FeeResult<usize> {
        let mut created = 0;
        for student in self.users.active_students().await? {
            created += self.enroll(&student.username).await?.len();
        }
        Ok(created)
    }

    /// Rows for the student without enrolling
    pub async fn rows_for(&self, username: &str) -> FeeResult<Vec<StudentFee>> {
        Ok(self.fees.filter(|f| f.belongs_to(username)).await?)
    }

    /// The student's fees, enrolling any missing active templates first
    ///
    /// # Errors
    ///
    /// * `UserNotFound` - Unknown username
    pub async fn list_for_student(&self, username: &str) -> FeeResult<Vec<StudentFee>> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| FeeError::UserNotFound(username.to_string()))?;

        if user.is_student() {
            self.enroll(&user.username).await?;
        }
        self.rows_for(&user.username).await
    }

    pub async fn find(&self, id: &str) -> FeeResult<Option<StudentFee>> {
        Ok(self.fees.find(id).await?)
    }

    pub async fn list_all(&self) -> FeeResult<Vec<StudentFee>> {
        Ok(self.fees.all().await?)
    }

    /// Reduce the remaining amount by `amount`.
    ///
    /// Callers clamp `amount` to the remaining balance first; the ledger only
    /// checks it against the value it reads.
    ///
    /// # Errors
    ///
    /// * `FeeNotFound` - Unknown student fee id
    /// * `InvalidAmount` - Amount is negative
    /// * `ExceedsRemaining` - Amount is larger than the remaining balance
    pub async fn apply_payment(&self, student_fee_id: &str, amount: Money) -> FeeResult<StudentFee> {
        if amount < 0 {
            return Err(FeeError::InvalidAmount(amount));
        }

        let fee = self
            .fees
            .update(student_fee_id, |fee| {
                if amount > fee.remaining_amount {
                    return Err(FeeError::ExceedsRemaining {
                        amount,
                        remaining: fee.remaining_amount,
                    });
                }
                fee.remaining_amount -= amount;
                fee.refresh_status();
                Ok(())
            })
            .await?
            .ok_or_else(|| FeeError::FeeNotFound(student_fee_id.to_string()))?;

        log::info!(
            "Applied {amount} to fee {} of {}, remaining {} ({})",
            fee.id,
            fee.user_id,
            fee.remaining_amount,
            fee.status
        );
        Ok(fee)
    }

    /// Give back `amount` to a fee, undoing an [`apply_payment`](Self::apply_payment)
    pub(crate) async fn revert_payment(&self, student_fee_id: &str, amount: Money) -> FeeResult<()> {
        self.fees
            .update(student_fee_id, |fee| {
                fee.remaining_amount = fee
                    .remaining_amount
                    .saturating_add(amount)
                    .min(fee.original_amount);
                fee.refresh_status();
                Ok::<_, FeeError>(())
            })
            .await?;
        Ok(())
    }

    /// Move every row owned by `old` to `new`; returns how many moved
    pub(crate) async fn rename_owner(&self, old: &str, new: &str) -> FeeResult<usize> {
        let moved = self
            .fees
            .modify(|fees| {
                let mut moved = 0;
                for fee in fees.iter_mut().filter(|f| f.belongs_to(old)) {
                    fee.user_id = new.to_string();
                    moved += 1;
                }
                Ok::<_, FeeError>(moved)
            })
            .await?;
        Ok(moved)
    }

    /// Add a charge to a student's fees.
    ///
    /// A template charge on a template the student already has raises both the
    /// original and remaining amount of that row; anything else creates a row.
    ///
    /// # Errors
    ///
    /// * `UserNotFound` - Unknown username
    /// * `StructureNotFound` - Unknown template id
    /// * `InvalidAmount` - Charge is not positive, or the raised row would overflow
    pub async fn assign_fee(&self, username: &str, charge: FeeCharge) -> FeeResult<StudentFee> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| FeeError::UserNotFound(username.to_string()))?;

        match charge {
            FeeCharge::Template {
                fee_structure_id,
                amount,
            } => {
                let structure = self
                    .catalog
                    .find_structure(&fee_structure_id)
                    .await?
                    .ok_or_else(|| FeeError::StructureNotFound(fee_structure_id.clone()))?;

                let amount = amount.unwrap_or(structure.amount);
                if amount <= 0 {
                    return Err(FeeError::InvalidAmount(amount));
                }

                let fee = self
                    .fees
                    .modify(|fees| {
                        let existing = fees.iter_mut().find(|f| {
                            f.belongs_to(&user.username) && f.fee_structure_id == structure.id
                        });
                        match existing {
                            Some(fee) => {
                                let (Some(original), Some(remaining)) = (
                                    fee.original_amount.checked_add(amount),
                                    fee.remaining_amount.checked_add(amount),
                                ) else {
                                    return Err(FeeError::InvalidAmount(amount));
                                };
                                fee.original_amount = original;
                                fee.remaining_amount = remaining;
                                fee.refresh_status();
                                Ok::<_, FeeError>(fee.clone())
                            }
                            None => {
                                let fee = StudentFee::new(&user.username, &structure.id, amount);
                                fees.push(fee.clone());
                                Ok(fee)
                            }
                        }
                    })
                    .await?;

                log::info!(
                    "Charged {amount} to {} for {}, remaining {}",
                    user.username,
                    structure.id,
                    fee.remaining_amount
                );
                Ok(fee)
            }
            FeeCharge::Custom {
                amount,
                description,
            } => {
                if amount <= 0 {
                    return Err(FeeError::InvalidAmount(amount));
                }

                let structure = self
                    .catalog
                    .create_custom_structure(amount, &description, Utc::now())
                    .await?;

                let mut fee = StudentFee::new(&user.username, &structure.id, amount);
                if !description.trim().is_empty() {
                    fee.description = Some(description);
                }
                let fee = self.fees.insert(fee).await?;

                log::info!("Charged custom fee {amount} to {}", user.username);
                Ok(fee)
            }
        }
    }
}
