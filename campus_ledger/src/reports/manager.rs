//! Reconciliation over the fee and payment ledgers.

use super::{
    errors::ReportResult,
    models::{StudentBalance, UnpaidStudent},
};
use crate::Money;
use crate::directory::UserDirectory;
use crate::fees::{FeeLedger, StudentFee};
use crate::payments::{Payment, PaymentLedger};

/// Read-only reports; never creates or changes records
#[derive(Clone)]
pub struct Reconciler {
    users: UserDirectory,
    fees: FeeLedger,
    payments: PaymentLedger,
}

/// Totals saturate at the `Money` bounds
fn balance_of<'a>(
    fees: impl Iterator<Item = &'a StudentFee>,
    payments: impl Iterator<Item = &'a Payment>,
) -> StudentBalance {
    let mut balance = StudentBalance::default();
    for fee in fees {
        balance.total_due = balance.total_due.saturating_add(fee.original_amount);
        balance.outstanding = balance.outstanding.saturating_add(fee.remaining_amount);
    }
    balance.total_paid = payments
        .filter(|p| p.is_completed())
        .fold(0, |sum: Money, p| sum.saturating_add(p.amount));
    balance
}

impl Reconciler {
    pub fn new(users: UserDirectory, fees: FeeLedger, payments: PaymentLedger) -> Self {
        Self {
            users,
            fees,
            payments,
        }
    }

    /// Active students with a positive outstanding amount
    pub async fn unpaid_students(&self) -> ReportResult<Vec<UnpaidStudent>> {
        let students = self.users.active_students().await?;
        let fees = self.fees.list_all().await?;
        let payments = self
            .payments
            .list_all()
            .await?;

        Ok(students
            .into_iter()
            .filter_map(|student| {
                let balance = balance_of(
                    fees.iter().filter(|f| f.belongs_to(&student.username)),
                    payments
                        .iter()
                        .filter(|p| p.belongs_to(&student.id) || p.belongs_to(&student.username)),
                );
                (balance.outstanding > 0).then(|| UnpaidStudent {
                    user_id: student.id,
                    username: student.username,
                    firstname: student.firstname,
                    lastname: student.lastname,
                    email: student.email,
                    balance,
                })
            })
            .collect())
    }

    /// Balance of the student with this id or username; zeros when unknown
    pub async fn student_balance(&self, key: &str) -> ReportResult<StudentBalance> {
        let Some(student) = self.users.find_by_id_or_username(key).await? else {
            return Ok(StudentBalance::default());
        };

        let fees = self.fees.rows_for(&student.username).await?;
        let payments = self
            .payments
            .list_all()
            .await?;

        Ok(balance_of(
            fees.iter(),
            payments
                .iter()
                .filter(|p| p.belongs_to(&student.id) || p.belongs_to(&student.username)),
        ))
    }

    pub async fn total_revenue(&self) -> ReportResult<Money> {
        Ok(self.payments.total_revenue().await?)
    }

    /// All payments, newest first
    pub async fn payment_history(&self) -> ReportResult<Vec<Payment>> {
        Ok(self.payments.history().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FeeCatalog, NewStructure};
    use crate::directory::{NewUser, Role};
    use crate::fees::FeeCharge;
    use crate::payments::PaymentRequest;
    use crate::store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    async fn setup() -> (FeeLedger, PaymentLedger, Reconciler) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let catalog = FeeCatalog::new(store.clone());
        let users = UserDirectory::new(store.clone());
        let fees = FeeLedger::new(store.clone(), catalog.clone(), users.clone());
        let payments = PaymentLedger::new(store, fees.clone(), users.clone());

        catalog
            .create_structure(NewStructure {
                category_id: "category-x".to_string(),
                academic_year: "2025-2026".to_string(),
                amount: 300,
                due_date: None,
                is_active: true,
            })
            .await
            .unwrap();
        for name in ["alice", "bob"] {
            users
                .create(NewUser::new(name, "pw", Role::Student))
                .await
                .unwrap();
        }
        fees.enroll_all_students().await.unwrap();

        let reports = Reconciler::new(users, fees.clone(), payments.clone());
        (fees, payments, reports)
    }

    #[tokio::test]
    async fn test_fully_paid_student_is_excluded() {
        let (fees, payments, reports) = setup().await;
        let fee = fees.rows_for("alice").await.unwrap().remove(0);
        payments
            .create(PaymentRequest::new("alice", &fee.id, 300, "Online"))
            .await
            .unwrap();

        let unpaid = reports.unpaid_students().await.unwrap();
        assert_eq!(unpaid.len(), 1);
        assert_eq!(unpaid[0].username, "bob");
        assert_eq!(unpaid[0].balance.outstanding, 300);
    }

    #[tokio::test]
    async fn test_student_balance() {
        let (fees, payments, reports) = setup().await;
        let fee = fees.rows_for("alice").await.unwrap().remove(0);
        payments
            .create(PaymentRequest::new("alice", &fee.id, 120, "Online"))
            .await
            .unwrap();

        assert_eq!(
            reports.student_balance("alice").await.unwrap(),
            StudentBalance {
                total_due: 300,
                total_paid: 120,
                outstanding: 180
            }
        );
        assert_eq!(
            reports.student_balance("nobody").await.unwrap(),
            StudentBalance::default()
        );
        assert_eq!(reports.total_revenue().await.unwrap(), 120);
    }

    #[tokio::test]
    async fn test_balance_saturates_on_huge_charges() {
        let (fees, _, reports) = setup().await;
        for _ in 0..2 {
            fees.assign_fee(
                "alice",
                FeeCharge::Custom {
                    amount: Money::MAX,
                    description: "Damages".to_string(),
                },
            )
            .await
            .unwrap();
        }

        let balance = reports.student_balance("alice").await.unwrap();
        assert_eq!(balance.total_due, Money::MAX);
        assert_eq!(balance.outstanding, Money::MAX);
        assert_eq!(balance.total_paid, 0);
    }
}
