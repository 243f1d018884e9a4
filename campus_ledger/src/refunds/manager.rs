//! Refund queue manager.

use super::{
    errors::{RefundError, RefundResult},
    models::{NewRefund, RefundRequest, RefundStatus},
};
use crate::store::{Collection, KeyValueStore, StoreError, StoreResult};
use chrono::Utc;
use std::sync::Arc;

/// Refund queue over the `refundRequests` collection
#[derive(Clone)]
pub struct RefundQueue {
    requests: Collection<RefundRequest>,
}

impl RefundQueue {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            requests: Collection::new(store),
        }
    }

    /// File a pending refund request
    pub async fn create(&self, new: NewRefund) -> RefundResult<RefundRequest> {
        if new.amount <= 0 {
            return Err(RefundError::InvalidAmount(new.amount));
        }

        let request = self
            .requests
            .insert(RefundRequest {
                id: format!("refund-{}", uuid::Uuid::new_v4()),
                user_id: new.user_id,
                username: new.username,
                payment_id: new.payment_id,
                amount: new.amount,
                reason: new.reason,
                status: RefundStatus::Pending,
                requested_date: Utc::now(),
            })
            .await?;

        log::info!(
            "Refund {} of {} requested by {} for payment {}",
            request.id,
            request.amount,
            request.username,
            request.payment_id
        );
        Ok(request)
    }

    /// Record an approval or rejection
    pub async fn set_status(&self, id: &str, status: RefundStatus) -> RefundResult<RefundRequest> {
        if status == RefundStatus::Pending {
            return Err(RefundError::InvalidStatus(status.to_string()));
        }

        let request = self
            .requests
            .update(id, |request| {
                request.status = status;
                Ok::<_, RefundError>(())
            })
            .await?
            .ok_or_else(|| RefundError::RequestNotFound(id.to_string()))?;

        log::info!("Refund {id} {status}");
        Ok(request)
    }

    pub async fn find(&self, id: &str) -> RefundResult<Option<RefundRequest>> {
        Ok(self.requests.find(id).await?)
    }

    pub async fn list_all(&self) -> RefundResult<Vec<RefundRequest>> {
        Ok(self.requests.all().await?)
    }

    pub async fn list_for_student(&self, username: &str) -> RefundResult<Vec<RefundRequest>> {
        Ok(self
            .requests
            .filter(|r| r.user_id == username || r.username.eq_ignore_ascii_case(username))
            .await?)
    }

    /// Rewrite user id and username references from `old` to `new`
    pub(crate) async fn rename_owner(&self, old: &str, new: &str) -> StoreResult<usize> {
        self.requests
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

    pub async fn pending(&self) -> RefundResult<Vec<RefundRequest>> {
        Ok(self
            .requests
            .filter(|r| r.status == RefundStatus::Pending)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn refund(amount: i64) -> NewRefund {
        NewRefund {
            user_id: "alice".to_string(),
            username: "alice".to_string(),
            payment_id: "payment-1".to_string(),
            amount,
            reason: "Dropped course".to_string(),
        }
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let queue = RefundQueue::new(Arc::new(MemoryStore::new()));
        let request = queue.create(refund(100)).await.unwrap();
        assert_eq!(request.status, RefundStatus::Pending);
        assert_eq!(queue.pending().await.unwrap().len(), 1);

        let approved = queue
            .set_status(&request.id, RefundStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, RefundStatus::Approved);
        assert!(queue.pending().await.unwrap().is_empty());
        assert_eq!(queue.list_for_student("alice").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejections() {
        let queue = RefundQueue::new(Arc::new(MemoryStore::new()));
        assert!(matches!(
            queue.create(refund(0)).await,
            Err(RefundError::InvalidAmount(0))
        ));

        let request = queue.create(refund(10)).await.unwrap();
        assert!(matches!(
            queue.set_status(&request.id, RefundStatus::Pending).await,
            Err(RefundError::InvalidStatus(_))
        ));
        assert!(matches!(
            queue.set_status("refund-missing", RefundStatus::Rejected).await,
            Err(RefundError::RequestNotFound(_))
        ));
    }
}
