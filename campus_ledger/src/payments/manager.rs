//! Payment ledger manager.

use super::{
    errors::{PaymentError, PaymentResult},
    models::{Payment, PaymentRequest, PaymentStatus},
};
use crate::Money;
use crate::directory::UserDirectory;
use crate::fees::FeeLedger;
use crate::store::{Collection, KeyValueStore, StoreError, StoreResult};
use chrono::Utc;
use std::sync::Arc;

/// Payment ledger over the `payments` collection
#[derive(Clone)]
pub struct PaymentLedger {
    payments: Collection<Payment>,
    fees: FeeLedger,
    users: UserDirectory,
}

impl PaymentLedger {
    pub fn new(store: Arc<dyn KeyValueStore>, fees: FeeLedger, users: UserDirectory) -> Self {
        Self {
            payments: Collection::new(store),
            fees,
            users,
        }
    }

    /// Pay towards a student fee.
    ///
    /// The amount is capped at the fee's remaining balance. The recorded
    /// payment carries the capped amount.
    ///
    /// # Errors
    ///
    /// * `FeeNotFound` - Unknown student fee id
    /// * `InvalidAmount` - Nothing to pay after capping
    /// * `DuplicatePayment` - Idempotency key already used
    /// * `InsufficientBalance` - Wallet cannot cover the payment
    pub async fn create(&self, request: PaymentRequest) -> PaymentResult<Payment> {
        let fee = self
            .fees
            .find(&request.student_fee_id)
            .await?
            .ok_or_else(|| PaymentError::FeeNotFound(request.student_fee_id.clone()))?;

        let amount = request.amount.min(fee.remaining_amount);
        if amount <= 0 {
            log::warn!(
                "Rejected payment of {} on fee {} (remaining {})",
                request.amount,
                fee.id,
                fee.remaining_amount
            );
            return Err(PaymentError::InvalidAmount(amount));
        }
        if amount < request.amount {
            log::warn!(
                "Payment of {} on fee {} capped at remaining {amount}",
                request.amount,
                fee.id
            );
        }

        let pending = Payment {
            id: format!("payment-{}", uuid::Uuid::new_v4()),
            user_id: request.user_id.clone(),
            username: request.username.clone(),
            fee_structure_id: fee.fee_structure_id.clone(),
            amount,
            payment_date: Utc::now(),
            status: PaymentStatus::Pending,
            payment_method: request.method.clone(),
            student_fee_id: Some(fee.id.clone()),
            idempotency_key: request.idempotency_key.clone(),
        };
        self.reserve(&pending).await?;

        if pending.is_wallet() {
            if let Err(e) = self.users.adjust_wallet(&request.username, -amount).await {
                log::warn!("Wallet debit failed for {}: {e}", request.username);
                self.discard(&pending.id).await;
                return Err(e.into());
            }
        }

        if let Err(e) = self.fees.apply_payment(&fee.id, amount).await {
            log::warn!("Fee update failed for payment {}: {e}", pending.id);
            self.compensate(&pending, false).await;
            return Err(e.into());
        }

        let payment = match self.set_status(&pending.id, PaymentStatus::Completed).await {
            Ok(payment) => payment,
            Err(e) => {
                log::warn!("Could not complete payment {}: {e}", pending.id);
                self.compensate(&pending, true).await;
                return Err(e);
            }
        };

        log::info!(
            "Payment {} of {amount} by {} via {} completed",
            payment.id,
            payment.username,
            payment.payment_method
        );
        Ok(payment)
    }

    /// Append a pending payment unless its idempotency key is already used
    async fn reserve(&self, pending: &Payment) -> PaymentResult<()> {
        self.payments
            .modify(|payments| {
                if let Some(key) = &pending.idempotency_key {
                    if payments
                        .iter()
                        .any(|p| p.idempotency_key.as_deref() == Some(key.as_str()))
                    {
                        return Err(PaymentError::DuplicatePayment(key.clone()));
                    }
                }
                payments.push(pending.clone());
                Ok(())
            })
            .await
    }

    /// Undo the steps of a failed payment that already happened
    async fn compensate(&self, pending: &Payment, fee_applied: bool) {
        if fee_applied {
            if let Some(fee_id) = &pending.student_fee_id {
                if let Err(e) = self.fees.revert_payment(fee_id, pending.amount).await {
                    log::error!(
                        "Could not restore {} to fee {fee_id} after failed payment {}: {e}",
                        pending.amount,
                        pending.id
                    );
                }
            }
        }
        if pending.is_wallet() {
            if let Err(e) = self.users.adjust_wallet(&pending.username, pending.amount).await {
                log::error!(
                    "Could not re-credit {} to {} after failed payment {}: {e}",
                    pending.amount,
                    pending.username,
                    pending.id
                );
            }
        }
        self.discard(&pending.id).await;
    }

    async fn discard(&self, id: &str) {
        if let Err(e) = self.payments.remove(id).await {
            log::error!("Could not remove pending payment {id}: {e}");
        }
    }

    /// Append a completed payment that is not tied to a student fee
    pub async fn record(
        &self,
        user_id: &str,
        username: &str,
        reference_id: &str,
        amount: Money,
        method: &str,
    ) -> PaymentResult<Payment> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let payment = self
            .payments
            .insert(Payment {
                id: format!("payment-{}", uuid::Uuid::new_v4()),
                user_id: user_id.to_string(),
                username: username.to_string(),
                fee_structure_id: reference_id.to_string(),
                amount,
                payment_date: Utc::now(),
                status: PaymentStatus::Completed,
                payment_method: method.to_string(),
                student_fee_id: None,
                idempotency_key: None,
            })
            .await?;

        log::info!(
            "Recorded payment {} of {amount} by {username} for {reference_id}",
            payment.id
        );
        Ok(payment)
    }

    pub async fn find(&self, id: &str) -> PaymentResult<Option<Payment>> {
        Ok(self.payments.find(id).await?)
    }

    /// Payments whose user id or username is `key`
    pub async fn list_for_student(&self, key: &str) -> PaymentResult<Vec<Payment>> {
        Ok(self.payments.filter(|p| p.belongs_to(key)).await?)
    }

    pub async fn list_all(&self) -> PaymentResult<Vec<Payment>> {
        Ok(self.payments.all().await?)
    }

    /// Sum of completed payment amounts, saturating at `Money::MAX`
    pub async fn total_revenue(&self) -> PaymentResult<Money> {
        Ok(self
            .payments
            .all()
            .await?
            .iter()
            .filter(|p| p.is_completed())
            .fold(0, |sum: Money, p| sum.saturating_add(p.amount)))
    }

    /// All payments, newest first
    pub async fn history(&self) -> PaymentResult<Vec<Payment>> {
        let mut payments = self.payments.all().await?;
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date));
        Ok(payments)
    }

    /// Rewrite user id and username references from `old` to `new`
    pub(crate) async fn rename_owner(&self, old: &str, new: &str) -> StoreResult<usize> {
        self.payments
            .modify(|records| {
                let mut moved = 0;
                for record in records.iter_mut() {
                    let by_id = record.user_id.eq_ignore_ascii_case(old);
                    let by_name = record.username.eq_ignore_ascii_case(old);
                    if by_id {
                        record.user_id = new.to_string();
                    }
                    if by_name {
                        record.username = new.to_string();
                    }
                    if by_id || by_name {
                        moved += 1;
                    }
                }
                Ok::<_, StoreError>(moved)
            })
            .await
    }

    pub async fn set_status(&self, id: &str, status: PaymentStatus) -> PaymentResult<Payment> {
        self.payments
            .update(id, |payment| {
                payment.status = status;
                Ok::<_, PaymentError>(())
            })
            .await?
            .ok_or_else(|| PaymentError::PaymentNotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{FeeCatalog, NewStructure};
    use crate::directory::{NewUser, Role};
    use crate::fees::FeeStatus;
    use crate::payments::WALLET_METHOD;
    use crate::store::MemoryStore;

    struct Fixture {
        users: UserDirectory,
        fees: FeeLedger,
        payments: PaymentLedger,
        fee_id: String,
    }

    async fn setup(amount: Money, wallet: Money) -> Fixture {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let catalog = FeeCatalog::new(store.clone());
        let users = UserDirectory::new(store.clone());
        let fees = FeeLedger::new(store.clone(), catalog.clone(), users.clone());
        let payments = PaymentLedger::new(store, fees.clone(), users.clone());

        catalog
            .create_structure(NewStructure {
                category_id: "category-x".to_string(),
                academic_year: "2025-2026".to_string(),
                amount,
                due_date: None,
                is_active: true,
            })
            .await
            .unwrap();
        users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        users.set_wallet("alice", wallet).await.unwrap();
        let fee_id = fees.list_for_student("alice").await.unwrap()[0].id.clone();

        Fixture {
            users,
            fees,
            payments,
            fee_id,
        }
    }

    #[tokio::test]
    async fn test_overpayment_is_capped() {
        let fx = setup(500, 0).await;
        let payment = fx
            .payments
            .create(PaymentRequest::new("alice", &fx.fee_id, 700, "Online"))
            .await
            .unwrap();
        assert_eq!(payment.amount, 500);
        assert_eq!(payment.status, PaymentStatus::Completed);

        let fee = fx.fees.find(&fx.fee_id).await.unwrap().unwrap();
        assert_eq!(fee.remaining_amount, 0);
        assert_eq!(fee.status, FeeStatus::Paid);

        // Nothing left to pay
        assert!(matches!(
            fx.payments
                .create(PaymentRequest::new("alice", &fx.fee_id, 10, "Online"))
                .await,
            Err(PaymentError::InvalidAmount(0))
        ));
    }

    #[tokio::test]
    async fn test_wallet_shortfall_leaves_no_trace() {
        let fx = setup(500, 40).await;
        let result = fx
            .payments
            .create(PaymentRequest::new("alice", &fx.fee_id, 100, WALLET_METHOD))
            .await;
        assert!(matches!(
            result,
            Err(PaymentError::InsufficientBalance {
                available: 40,
                required: 100
            })
        ));
        assert!(fx.payments.list_all().await.unwrap().is_empty());
        assert_eq!(fx.users.get_wallet("alice").await.unwrap(), 40);
        assert_eq!(
            fx.fees.find(&fx.fee_id).await.unwrap().unwrap().remaining_amount,
            500
        );
    }

    #[tokio::test]
    async fn test_wallet_payment_debits_wallet() {
        let fx = setup(500, 300).await;
        let payment = fx
            .payments
            .create(PaymentRequest::new("alice", &fx.fee_id, 200, WALLET_METHOD))
            .await
            .unwrap();
        assert!(payment.is_wallet());
        assert_eq!(fx.users.get_wallet("alice").await.unwrap(), 100);
        assert_eq!(fx.payments.total_revenue().await.unwrap(), 200);
    }

    #[tokio::test]
    async fn test_duplicate_idempotency_key() {
        let fx = setup(500, 0).await;
        fx.payments
            .create(PaymentRequest::new("alice", &fx.fee_id, 100, "Online").with_idempotency_key("k1"))
            .await
            .unwrap();
        let again = fx
            .payments
            .create(PaymentRequest::new("alice", &fx.fee_id, 100, "Online").with_idempotency_key("k1"))
            .await;
        assert!(matches!(again, Err(PaymentError::DuplicatePayment(_))));
        assert_eq!(
            fx.fees.find(&fx.fee_id).await.unwrap().unwrap().remaining_amount,
            400
        );
    }

    #[tokio::test]
    async fn test_unknown_fee() {
        let fx = setup(500, 0).await;
        assert!(matches!(
            fx.payments
                .create(PaymentRequest::new("alice", "sfee-missing", 100, "Online"))
                .await,
            Err(PaymentError::FeeNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_history_newest_first_and_lookup_by_key() {
        let fx = setup(500, 0).await;
        for amount in [100, 50] {
            fx.payments
                .create(PaymentRequest::new("alice", &fx.fee_id, amount, "Online"))
                .await
                .unwrap();
        }
        fx.payments
            .record("bob", "bob", "invoice-1", 75, "Invoice Payment")
            .await
            .unwrap();

        let history = fx.payments.history().await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(
            history
                .windows(2)
                .all(|w| w[0].payment_date >= w[1].payment_date)
        );

        assert_eq!(fx.payments.list_for_student("ALICE").await.unwrap().len(), 2);
        assert_eq!(fx.payments.total_revenue().await.unwrap(), 225);
    }

    #[tokio::test]
    async fn test_set_status_excludes_refunded_from_revenue() {
        let fx = setup(500, 0).await;
        let payment = fx
            .payments
            .create(PaymentRequest::new("alice", &fx.fee_id, 100, "Online"))
            .await
            .unwrap();
        fx.payments
            .set_status(&payment.id, PaymentStatus::Refunded)
            .await
            .unwrap();
        assert_eq!(fx.payments.total_revenue().await.unwrap(), 0);
        assert!(matches!(
            fx.payments
                .set_status("payment-missing", PaymentStatus::Completed)
                .await,
            Err(PaymentError::PaymentNotFound(_))
        ));
    }
}
