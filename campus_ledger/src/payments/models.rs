//! Payment data models.

use crate::Money;
use crate::store::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Payment method that debits the student's wallet
pub const WALLET_METHOD: &str = "Wallet";

/// Payment state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentStatus::Pending => write!(f, "pending"),
            PaymentStatus::Completed => write!(f, "completed"),
            PaymentStatus::Refunded => write!(f, "refunded"),
        }
    }
}

/// Payment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub user_id: String,
    pub username: String,
    /// Template id, or the invoice id for invoice payments
    pub fee_structure_id: String,
    pub amount: Money,
    pub payment_date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_fee_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
}

impl Payment {
    pub fn is_completed(&self) -> bool {
        self.status == PaymentStatus::Completed
    }

    /// Whether `key` is this payment's user id or username
    pub fn belongs_to(&self, key: &str) -> bool {
        self.user_id == key || self.username.eq_ignore_ascii_case(key)
    }

    pub fn is_wallet(&self) -> bool {
        self.payment_method == WALLET_METHOD
    }
}

impl Record for Payment {
    const COLLECTION: &'static str = "payments";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Request to pay towards a student fee
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub user_id: String,
    pub username: String,
    pub student_fee_id: String,
    pub amount: Money,
    pub method: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

impl PaymentRequest {
    /// Request where the user id is the username
    pub fn new(username: &str, student_fee_id: &str, amount: Money, method: &str) -> Self {
        Self {
            user_id: username.to_string(),
            username: username.to_string(),
            student_fee_id: student_fee_id.to_string(),
            amount,
            method: method.to_string(),
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }
}
