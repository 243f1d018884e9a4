//! Report data models.

use crate::Money;
use serde::{Deserialize, Serialize};

/// Money owed and paid by one student
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentBalance {
    /// Sum of original fee amounts
    pub total_due: Money,
    /// Sum of completed payments
    pub total_paid: Money,
    /// Sum of remaining fee amounts
    pub outstanding: Money,
}

/// Active student who still owes money
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnpaidStudent {
    pub user_id: String,
    pub username: String,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    #[serde(flatten)]
    pub balance: StudentBalance,
}
