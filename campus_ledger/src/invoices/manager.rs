//! Invoice book manager.

use super::{
    errors::{InvoiceError, InvoiceResult},
    models::{Invoice, InvoiceStatus, NewInvoice},
};
use crate::directory::UserDirectory;
use crate::payments::{Payment, PaymentLedger, WALLET_METHOD};
use crate::store::{Collection, KeyValueStore, StoreError, StoreResult};
use chrono::Utc;
use std::sync::Arc;

/// Default method recorded for invoice payments
pub const INVOICE_PAYMENT_METHOD: &str = "Invoice Payment";

/// Invoice book over the `invoices` collection
#[derive(Clone)]
pub struct InvoiceBook {
    invoices: Collection<Invoice>,
    payments: PaymentLedger,
    users: UserDirectory,
}

impl InvoiceBook {
    pub fn new(store: Arc<dyn KeyValueStore>, payments: PaymentLedger, users: UserDirectory) -> Self {
        Self {
            invoices: Collection::new(store),
            payments,
            users,
        }
    }

    /// Issue an unpaid invoice
    pub async fn create(&self, new: NewInvoice) -> InvoiceResult<Invoice> {
        if new.title.trim().is_empty() {
            return Err(InvoiceError::MissingField("title"));
        }
        if new.amount <= 0 {
            return Err(InvoiceError::InvalidAmount(new.amount));
        }

        let invoice = self
            .invoices
            .insert(Invoice {
                id: format!("invoice-{}", uuid::Uuid::new_v4()),
                user_id: new.user_id,
                username: new.username,
                title: new.title.trim().to_string(),
                description: new.description.filter(|d| !d.trim().is_empty()),
                amount: new.amount,
                created_date: Utc::now(),
                due_date: new.due_date,
                status: InvoiceStatus::Unpaid,
            })
            .await?;

        log::info!(
            "Invoice {} of {} issued to {}",
            invoice.id,
            invoice.amount,
            invoice.username
        );
        Ok(invoice)
    }

    pub async fn find(&self, id: &str) -> InvoiceResult<Option<Invoice>> {
        Ok(self.invoices.find(id).await?)
    }

    pub async fn list_all(&self) -> InvoiceResult<Vec<Invoice>> {
        Ok(self.invoices.all().await?)
    }

    pub async fn list_for_student(&self, key: &str) -> InvoiceResult<Vec<Invoice>> {
        Ok(self.invoices.filter(|i| i.belongs_to(key)).await?)
    }

    /// Rewrite user id and username references from `old` to `new`
    pub(crate) async fn rename_owner(&self, old: &str, new: &str) -> StoreResult<usize> {
        self.invoices
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

    pub async fn update_status(&self, id: &str, status: InvoiceStatus) -> InvoiceResult<Invoice> {
        self.invoices
            .update(id, |invoice| {
                invoice.status = status;
                Ok::<_, InvoiceError>(())
            })
            .await?
            .ok_or_else(|| InvoiceError::InvoiceNotFound(id.to_string()))
    }

    /// Pay an unpaid invoice in full.
    ///
    /// The invoice is claimed (flipped to paid) atomically before any money
    /// moves, so two concurrent calls cannot both pay it. A failed wallet debit
    /// or payment write puts it back to unpaid.
    ///
    /// # Errors
    ///
    /// * `InvoiceNotFound` - Unknown invoice id
    /// * `NotPayable` - Invoice is already paid or cancelled
    /// * `InsufficientBalance` - Wallet method and the wallet cannot cover it
    pub async fn pay(&self, invoice_id: &str, method: &str) -> InvoiceResult<(Invoice, Payment)> {
        let invoice = self
            .invoices
            .update(invoice_id, |invoice| {
                if invoice.status != InvoiceStatus::Unpaid {
                    return Err(InvoiceError::NotPayable {
                        id: invoice.id.clone(),
                        status: invoice.status.to_string(),
                    });
                }
                invoice.status = InvoiceStatus::Paid;
                Ok(())
            })
            .await?
            .ok_or_else(|| InvoiceError::InvoiceNotFound(invoice_id.to_string()))?;

        let wallet = method == WALLET_METHOD;
        if wallet {
            if let Err(e) = self.users.adjust_wallet(&invoice.username, -invoice.amount).await {
                log::warn!("Wallet debit failed for invoice {}: {e}", invoice.id);
                self.release(&invoice.id).await;
                return Err(e.into());
            }
        }

        let payment = match self
            .payments
            .record(
                &invoice.user_id,
                &invoice.username,
                &invoice.id,
                invoice.amount,
                method,
            )
            .await
        {
            Ok(payment) => payment,
            Err(e) => {
                if wallet {
                    if let Err(refund) =
                        self.users.adjust_wallet(&invoice.username, invoice.amount).await
                    {
                        log::error!(
                            "Could not re-credit {} to {} for invoice {}: {refund}",
                            invoice.amount,
                            invoice.username,
                            invoice.id
                        );
                    }
                }
                self.release(&invoice.id).await;
                return Err(e.into());
            }
        };

        log::info!("Invoice {} paid by {}", invoice.id, invoice.username);
        Ok((invoice, payment))
    }

    async fn release(&self, id: &str) {
        if let Err(e) = self.update_status(id, InvoiceStatus::Unpaid).await {
            log::error!("Could not reopen invoice {id}: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FeeCatalog;
    use crate::directory::{NewUser, Role};
    use crate::fees::FeeLedger;
    use crate::store::MemoryStore;

    async fn setup(wallet: i64) -> (UserDirectory, PaymentLedger, InvoiceBook) {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let users = UserDirectory::new(store.clone());
        let fees = FeeLedger::new(store.clone(), FeeCatalog::new(store.clone()), users.clone());
        let payments = PaymentLedger::new(store.clone(), fees, users.clone());
        let book = InvoiceBook::new(store, payments.clone(), users.clone());

        users
            .create(NewUser::new("alice", "pw", Role::Student))
            .await
            .unwrap();
        users.set_wallet("alice", wallet).await.unwrap();
        (users, payments, book)
    }

    fn invoice(title: &str, amount: i64) -> NewInvoice {
        NewInvoice {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            title: title.to_string(),
            description: None,
            amount,
            due_date: None,
        }
    }

    #[tokio::test]
    async fn test_create_validation() {
        let (_, _, book) = setup(0).await;
        assert!(matches!(
            book.create(invoice("  ", 10)).await,
            Err(InvoiceError::MissingField("title"))
        ));
        assert!(matches!(
            book.create(invoice("Transcript", 0)).await,
            Err(InvoiceError::InvalidAmount(0))
        ));
    }

    #[tokio::test]
    async fn test_pay_records_payment_and_flips_status() {
        let (_, payments, book) = setup(0).await;
        let issued = book.create(invoice("Transcript", 25)).await.unwrap();

        let (paid, payment) = book.pay(&issued.id, INVOICE_PAYMENT_METHOD).await.unwrap();
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(payment.fee_structure_id, issued.id);
        assert!(payment.student_fee_id.is_none());
        assert_eq!(payments.total_revenue().await.unwrap(), 25);

        assert!(matches!(
            book.pay(&issued.id, INVOICE_PAYMENT_METHOD).await,
            Err(InvoiceError::NotPayable { .. })
        ));
        assert_eq!(payments.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_wallet_shortfall_keeps_invoice_unpaid() {
        let (users, payments, book) = setup(10).await;
        let issued = book.create(invoice("Transcript", 25)).await.unwrap();

        assert!(matches!(
            book.pay(&issued.id, WALLET_METHOD).await,
            Err(InvoiceError::InsufficientBalance { .. })
        ));
        assert_eq!(
            book.find(&issued.id).await.unwrap().unwrap().status,
            InvoiceStatus::Unpaid
        );
        assert_eq!(users.get_wallet("alice").await.unwrap(), 10);
        assert!(payments.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancelled_invoice_cannot_be_paid() {
        let (_, _, book) = setup(0).await;
        let issued = book.create(invoice("Parking", 40)).await.unwrap();
        book.update_status(&issued.id, InvoiceStatus::Cancelled)
            .await
            .unwrap();
        assert!(matches!(
            book.pay(&issued.id, INVOICE_PAYMENT_METHOD).await,
            Err(InvoiceError::NotPayable { .. })
        ));
        assert_eq!(book.list_for_student("alice").await.unwrap().len(), 1);
    }
}
