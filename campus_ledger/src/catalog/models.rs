//! Fee catalog data models.

use crate::Money;
use crate::store::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Fee category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Reference amount, informational only
    #[serde(default)]
    pub amount: Money,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for FeeCategory {
    const COLLECTION: &'static str = "feeCategories";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Fee structure template, shared by every student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeStructure {
    pub id: String,
    pub category_id: String,
    /// Category name copied at write time
    #[serde(default)]
    pub category_name: String,
    pub academic_year: String,
    pub amount: Money,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for FeeStructure {
    const COLLECTION: &'static str = "feeStructures";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Structure with the category name resolved at read time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureView {
    #[serde(flatten)]
    pub structure: FeeStructure,
    /// Current category name, or the stored copy when the category is gone
    pub current_category_name: String,
}

/// Policy kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PolicyType {
    Deadline,
    Penalty,
    Installment,
    Refund,
}

impl std::fmt::Display for PolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicyType::Deadline => write!(f, "deadline"),
            PolicyType::Penalty => write!(f, "penalty"),
            PolicyType::Installment => write!(f, "installment"),
            PolicyType::Refund => write!(f, "refund"),
        }
    }
}

/// Payment policy (deadline days, penalty percent, installment count, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPolicy {
    pub id: String,
    pub policy_type: PolicyType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Record for PaymentPolicy {
    const COLLECTION: &'static str = "paymentPolicies";

    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub amount: Money,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub amount: Option<Money>,
    pub is_active: Option<bool>,
}

impl CategoryUpdate {
    pub(crate) fn apply(&self, category: &mut FeeCategory) {
        if let Some(name) = &self.name {
            category.name = name.clone();
        }
        if let Some(description) = &self.description {
            category.description = description.clone();
        }
        if let Some(amount) = self.amount {
            category.amount = amount;
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStructure {
    pub category_id: String,
    pub academic_year: String,
    pub amount: Money,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureUpdate {
    pub category_id: Option<String>,
    pub academic_year: Option<String>,
    pub amount: Option<Money>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPolicy {
    pub policy_type: PolicyType,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub value: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyUpdate {
    pub policy_type: Option<PolicyType>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub value: Option<i64>,
    pub is_active: Option<bool>,
}

impl PolicyUpdate {
    pub(crate) fn apply(&self, policy: &mut PaymentPolicy) {
        if let Some(policy_type) = self.policy_type {
            policy.policy_type = policy_type;
        }
        if let Some(name) = &self.name {
            policy.name = name.clone();
        }
        if let Some(description) = &self.description {
            policy.description = description.clone();
        }
        if let Some(value) = self.value {
            policy.value = value;
        }
        if let Some(is_active) = self.is_active {
            policy.is_active = is_active;
        }
    }
}
