//! Student fee data models.

use crate::Money;
use crate::store::Record;
use serde::{Deserialize, Serialize};

/// Payment state of a student fee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeeStatus {
    Unpaid,
    Partial,
    Paid,
}

impl FeeStatus {
    /// `Paid` when nothing remains, `Partial` when part was paid, else `Unpaid`
    pub fn from_amounts(original: Money, remaining: Money) -> Self {
        if remaining == 0 {
            FeeStatus::Paid
        } else if remaining > 0 && remaining < original {
            FeeStatus::Partial
        } else {
            FeeStatus::Unpaid
        }
    }
}

impl std::fmt::Display for FeeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeeStatus::Unpaid => write!(f, "unpaid"),
            FeeStatus::Partial => write!(f, "partial"),
            FeeStatus::Paid => write!(f, "paid"),
        }
    }
}

/// One fee template assigned to one student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFee {
    pub id: String,
    /// Username of the student
    pub user_id: String,
    pub fee_structure_id: String,
    pub original_amount: Money,
    pub remaining_amount: Money,
    pub status: FeeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl StudentFee {
    pub(crate) fn new(username: &str, fee_structure_id: &str, amount: Money) -> Self {
        Self {
            id: format!("sfee-{}", uuid::Uuid::new_v4()),
            user_id: username.to_string(),
            fee_structure_id: fee_structure_id.to_string(),
            original_amount: amount,
            remaining_amount: amount,
            status: FeeStatus::from_amounts(amount, amount),
            description: None,
        }
    }

    pub fn belongs_to(&self, username: &str) -> bool {
        self.user_id.eq_ignore_ascii_case(username)
    }

    /// Amount already paid
    pub fn paid_amount(&self) -> Money {
        self.original_amount - self.remaining_amount
    }

    pub(crate) fn refresh_status(&mut self) {
        self.status = FeeStatus::from_amounts(self.original_amount, self.remaining_amount);
    }
}

impl Record for StudentFee {
    const COLLECTION: &'static str = "studentFees";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Charge added to a student's fees by staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FeeCharge {
    /// Charge an existing template, optionally overriding its amount
    #[serde(rename_all = "camelCase")]
    Template {
        fee_structure_id: String,
        #[serde(default)]
        amount: Option<Money>,
    },
    /// One-off charge with no existing template
    #[serde(rename_all = "camelCase")]
    Custom {
        amount: Money,
        #[serde(default)]
        description: String,
    },
}
