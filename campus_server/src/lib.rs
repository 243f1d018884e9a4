//! HTTP server for the campus ledger.
//!
//! Wraps a [`campus_ledger::Campus`] in an axum router with bearer-token
//! sessions, role checks, and a small chat proxy.

pub mod api;
pub mod chat;
pub mod config;
pub mod logging;
pub mod metrics;
