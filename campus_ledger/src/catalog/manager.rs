//! Fee catalog manager.

use super::{
    errors::{CatalogError, CatalogResult},
    models::{
        CategoryUpdate, FeeCategory, FeeStructure, NewCategory, NewPolicy, NewStructure,
        PaymentPolicy, PolicyType, PolicyUpdate, StructureUpdate, StructureView,
    },
};
use crate::Money;
use crate::store::{Collection, KeyValueStore};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;

/// Name of the category created for ad-hoc charges when the catalog is empty
pub const CUSTOM_FEE_CATEGORY: &str = "Custom Fee";

/// Academic year label starting in the year of `now`, e.g. `2025-2026`
pub fn academic_year(now: DateTime<Utc>) -> String {
    format!("{}-{}", now.year(), now.year() + 1)
}

/// Fee catalog over the category, structure, and policy collections
#[derive(Clone)]
pub struct FeeCatalog {
    categories: Collection<FeeCategory>,
    structures: Collection<FeeStructure>,
    policies: Collection<PaymentPolicy>,
}

impl FeeCatalog {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            categories: Collection::new(store.clone()),
            structures: Collection::new(store.clone()),
            policies: Collection::new(store),
        }
    }

    // === Categories ===

    pub async fn list_categories(&self) -> CatalogResult<Vec<FeeCategory>> {
        Ok(self.categories.all().await?)
    }

    pub async fn find_category(&self, id: &str) -> CatalogResult<Option<FeeCategory>> {
        Ok(self.categories.find(id).await?)
    }

    pub async fn create_category(&self, new: NewCategory) -> CatalogResult<FeeCategory> {
        if new.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }

        let category = self
            .categories
            .insert(FeeCategory {
                id: format!("category-{}", uuid::Uuid::new_v4()),
                name: new.name.trim().to_string(),
                description: new.description,
                amount: new.amount,
                is_active: new.is_active,
            })
            .await?;

        log::info!("Created fee category {}", category.name);
        Ok(category)
    }

    /// Merge fields into a category.
    ///
    /// Structures keep the name they copied when they were written.
    pub async fn update_category(
        &self,
        id: &str,
        changes: CategoryUpdate,
    ) -> CatalogResult<FeeCategory> {
        self.categories
            .update(id, |category| {
                changes.apply(category);
                Ok::<_, CatalogError>(())
            })
            .await?
            .ok_or_else(|| CatalogError::CategoryNotFound(id.to_string()))
    }

    pub async fn delete_category(&self, id: &str) -> CatalogResult<()> {
        if !self.categories.remove(id).await? {
            return Err(CatalogError::CategoryNotFound(id.to_string()));
        }
        log::info!("Deleted fee category {id}");
        Ok(())
    }

    async fn category_name(&self, category_id: &str) -> CatalogResult<String> {
        Ok(self
            .categories
            .find(category_id)
            .await?
            .map(|c| c.name)
            .unwrap_or_default())
    }

    // === Structures ===

    pub async fn list_structures(&self) -> CatalogResult<Vec<FeeStructure>> {
        Ok(self.structures.all().await?)
    }

    pub async fn active_structures(&self) -> CatalogResult<Vec<FeeStructure>> {
        Ok(self.structures.filter(|s| s.is_active).await?)
    }

    pub async fn find_structure(&self, id: &str) -> CatalogResult<Option<FeeStructure>> {
        Ok(self.structures.find(id).await?)
    }

    /// Create a template, copying the category name (empty if the category is unknown)
    ///
    /// # Errors
    ///
    /// * `MissingField` - Category id or academic year is empty
    /// * `InvalidAmount` - Amount is not positive
    pub async fn create_structure(&self, new: NewStructure) -> CatalogResult<FeeStructure> {
        if new.category_id.trim().is_empty() {
            return Err(CatalogError::MissingField("categoryId"));
        }
        if new.academic_year.trim().is_empty() {
            return Err(CatalogError::MissingField("academicYear"));
        }
        if new.amount <= 0 {
            return Err(CatalogError::InvalidAmount(new.amount));
        }

        let category_name = self.category_name(&new.category_id).await?;
        let structure = self
            .structures
            .insert(FeeStructure {
                id: format!("structure-{}", uuid::Uuid::new_v4()),
                category_id: new.category_id,
                category_name,
                academic_year: new.academic_year,
                amount: new.amount,
                due_date: new.due_date,
                is_active: new.is_active,
            })
            .await?;

        log::info!(
            "Created fee structure {} ({} {}, amount {})",
            structure.id,
            structure.category_name,
            structure.academic_year,
            structure.amount
        );
        Ok(structure)
    }

    /// Merge fields into a template; a new category id refreshes the copied name
    pub async fn update_structure(
        &self,
        id: &str,
        changes: StructureUpdate,
    ) -> CatalogResult<FeeStructure> {
        if let Some(amount) = changes.amount.filter(|a| *a <= 0) {
            return Err(CatalogError::InvalidAmount(amount));
        }

        let category_name = match &changes.category_id {
            Some(category_id) => Some(self.category_name(category_id).await?),
            None => None,
        };

        self.structures
            .update(id, |structure| {
                if let Some(category_id) = &changes.category_id {
                    if *category_id != structure.category_id {
                        structure.category_id = category_id.clone();
                        structure.category_name = category_name.clone().unwrap_or_default();
                    }
                }
                if let Some(year) = &changes.academic_year {
                    structure.academic_year = year.clone();
                }
                if let Some(amount) = changes.amount {
                    structure.amount = amount;
                }
                if let Some(due_date) = changes.due_date {
                    structure.due_date = Some(due_date);
                }
                if let Some(is_active) = changes.is_active {
                    structure.is_active = is_active;
                }
                Ok::<_, CatalogError>(())
            })
            .await?
            .ok_or_else(|| CatalogError::StructureNotFound(id.to_string()))
    }

    pub async fn delete_structure(&self, id: &str) -> CatalogResult<()> {
        if !self.structures.remove(id).await? {
            return Err(CatalogError::StructureNotFound(id.to_string()));
        }
        log::info!("Deleted fee structure {id}");
        Ok(())
    }

    /// Structures with the category name looked up now rather than copied
    pub async fn structure_views(&self) -> CatalogResult<Vec<StructureView>> {
        let names: HashMap<String, String> = self
            .categories
            .all()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();

        Ok(self
            .structures
            .all()
            .await?
            .into_iter()
            .map(|structure| {
                let current_category_name = names
                    .get(&structure.category_id)
                    .cloned()
                    .unwrap_or_else(|| structure.category_name.clone());
                StructureView {
                    structure,
                    current_category_name,
                }
            })
            .collect())
    }

    /// Template holding a one-off charge for a single student.
    ///
    /// Uses the first category, or creates [`CUSTOM_FEE_CATEGORY`] when there
    /// is none. The template is inactive so enrollment never hands it to other
    /// students.
    pub async fn create_custom_structure(
        &self,
        amount: Money,
        description: &str,
        now: DateTime<Utc>,
    ) -> CatalogResult<FeeStructure> {
        if amount <= 0 {
            return Err(CatalogError::InvalidAmount(amount));
        }

        let category = match self.categories.all().await?.into_iter().next() {
            Some(category) => category,
            None => {
                let description = if description.trim().is_empty() {
                    "Custom fee added by admin".to_string()
                } else {
                    description.to_string()
                };
                self.create_category(NewCategory {
                    name: CUSTOM_FEE_CATEGORY.to_string(),
                    description,
                    amount,
                    is_active: true,
                })
                .await?
            }
        };

        self.create_structure(NewStructure {
            category_id: category.id,
            academic_year: academic_year(now),
            amount,
            due_date: Some(now),
            is_active: false,
        })
        .await
    }

    // === Policies ===

    pub async fn list_policies(&self) -> CatalogResult<Vec<PaymentPolicy>> {
        Ok(self.policies.all().await?)
    }

    pub async fn create_policy(&self, new: NewPolicy) -> CatalogResult<PaymentPolicy> {
        if new.name.trim().is_empty() {
            return Err(CatalogError::MissingField("name"));
        }

        let policy = self
            .policies
            .insert(PaymentPolicy {
                id: format!("policy-{}", uuid::Uuid::new_v4()),
                policy_type: new.policy_type,
                name: new.name,
                description: new.description,
                value: new.value,
                is_active: new.is_active,
            })
            .await?;

        log::info!("Created {} policy {}", policy.policy_type, policy.name);
        Ok(policy)
    }

    pub async fn update_policy(
        &self,
        id: &str,
        changes: PolicyUpdate,
    ) -> CatalogResult<PaymentPolicy> {
        self.policies
            .update(id, |policy| {
                changes.apply(policy);
                Ok::<_, CatalogError>(())
            })
            .await?
            .ok_or_else(|| CatalogError::PolicyNotFound(id.to_string()))
    }

    pub async fn delete_policy(&self, id: &str) -> CatalogResult<()> {
        if !self.policies.remove(id).await? {
            return Err(CatalogError::PolicyNotFound(id.to_string()));
        }
        Ok(())
    }

    // === Defaults ===

    /// Write the default catalog into collections that have never been written.
    ///
    /// Returns whether anything was written.
    pub async fn seed_defaults(&self, now: DateTime<Utc>) -> CatalogResult<bool> {
        let year = academic_year(now);
        let due_date = Utc
            .with_ymd_and_hms(now.year(), 9, 1, 0, 0, 0)
            .single();

        let category = |id: &str, name: &str, description: &str, amount: Money| FeeCategory {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            amount,
            is_active: true,
        };
        let categories = vec![
            category("category-tuition", "Tuition Fee", "Annual tuition fee", 5000),
            category("category-registration", "Registration Fee", "Registration fee", 500),
            category("category-library", "Library Fee", "Library access fee", 200),
        ];

        let structures = categories
            .iter()
            .take(2)
            .map(|c| FeeStructure {
                id: c.id.replacen("category", "structure", 1),
                category_id: c.id.clone(),
                category_name: c.name.clone(),
                academic_year: year.clone(),
                amount: c.amount,
                due_date,
                is_active: true,
            })
            .collect();

        let policy = |id: &str,
                      policy_type: PolicyType,
                      name: &str,
                      description: &str,
                      value: i64| PaymentPolicy {
            id: id.to_string(),
            policy_type,
            name: name.to_string(),
            description: description.to_string(),
            value,
            is_active: true,
        };
        let policies = vec![
            policy(
                "policy-deadline",
                PolicyType::Deadline,
                "Fall Semester Deadline",
                "Payment deadline for fall semester",
                30,
            ),
            policy(
                "policy-penalty",
                PolicyType::Penalty,
                "Late Payment Penalty",
                "Penalty for late payments",
                5,
            ),
            policy(
                "policy-installment",
                PolicyType::Installment,
                "Installment Plan",
                "Maximum installments allowed",
                3,
            ),
        ];

        let mut seeded = self.categories.seed(categories).await?;
        seeded |= self.structures.seed(structures).await?;
        seeded |= self.policies.seed(policies).await?;

        if seeded {
            log::info!("Seeded default fee catalog for {year}");
        }
        Ok(seeded)
    }
}
