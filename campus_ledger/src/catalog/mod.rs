//! Fee catalog: categories, fee structure templates, and payment policies.
//!
//! Structures keep a copy of their category's name taken at write time;
//! [`FeeCatalog::structure_views`] joins the live name at read time instead.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{CatalogError, CatalogResult};
pub use manager::{CUSTOM_FEE_CATEGORY, FeeCatalog, academic_year};
pub use models::{
    CategoryUpdate, FeeCategory, FeeStructure, NewCategory, NewPolicy, NewStructure,
    PaymentPolicy, PolicyType, PolicyUpdate, StructureUpdate, StructureView,
};
