//! Invoice book: free-standing per-student invoices.
//!
//! Invoices sit outside the fee template chain. Paying one records a completed
//! payment that references the invoice id.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{InvoiceError, InvoiceResult};
pub use manager::{INVOICE_PAYMENT_METHOD, InvoiceBook};
pub use models::{Invoice, InvoiceStatus, NewInvoice};
