//! Refund request data models.

use crate::Money;
use crate::store::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Refund request state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefundStatus {
    Pending,
    Approved,
    Rejected,
}

impl std::fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefundStatus::Pending => write!(f, "pending"),
            RefundStatus::Approved => write!(f, "approved"),
            RefundStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Refund request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub id: String,
    pub user_id: String,
    pub username: String,
    pub payment_id: String,
    pub amount: Money,
    #[serde(default)]
    pub reason: String,
    pub status: RefundStatus,
    pub requested_date: DateTime<Utc>,
}

impl Record for RefundRequest {
    const COLLECTION: &'static str = "refundRequests";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRefund {
    pub user_id: String,
    pub username: String,
    pub payment_id: String,
    pub amount: Money,
    #[serde(default)]
    pub reason: String,
}
