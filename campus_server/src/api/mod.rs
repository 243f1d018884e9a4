//! HTTP API for the campus ledger.
//!
//! # Modules
//!
//! - [`auth`]: login, logout, current user
//! - [`users`]: account administration and wallets
//! - [`catalog`]: fee categories, templates, policies
//! - [`fees`]: per-student fees
//! - [`payments`]: payment creation and listings
//! - [`refunds`]: refund requests and decisions
//! - [`invoices`]: invoices and invoice payment
//! - [`reports`]: reconciliation reports
//! - [`chat`]: help-desk chat proxy
//! - [`middleware`]: bearer-token authentication and role checks
//!
//! # Endpoint Summary
//!
//! ```text
//! GET  /health                                  - Health check (public)
//! POST /api/chat                                - Chat proxy (public)
//! POST /api/v1/auth/login                       - Login (public)
//! POST /api/v1/auth/logout                      - Logout
//! GET  /api/v1/auth/me                          - Current user
//! GET  /api/v1/users                            - List users (admin)
//! POST /api/v1/users                            - Create user (admin)
//! PUT  /api/v1/users/{id}                       - Update user (admin)
//! DEL  /api/v1/users/{id}                       - Delete user (admin)
//! GET  /api/v1/users/{username}/wallet          - Wallet balance (self or staff)
//! POST /api/v1/users/{username}/wallet          - Adjust wallet (staff)
//! GET  /api/v1/catalog/categories               - List categories
//! POST /api/v1/catalog/categories               - Create category (admin)
//! GET  /api/v1/catalog/structures               - List templates
//! POST /api/v1/catalog/structures               - Create template (admin)
//! PUT  /api/v1/catalog/structures/{id}          - Update template (admin)
//! GET  /api/v1/catalog/policies                 - List policies
//! GET  /api/v1/students/{username}/fees         - Student fees (self or staff)
//! POST /api/v1/students/{username}/fees         - Assign a fee (staff)
//! GET  /api/v1/students/{username}/payments     - Student payments (self or staff)
//! GET  /api/v1/students/{username}/balance      - Student balance (self or staff)
//! GET  /api/v1/payments                         - All payments (staff)
//! POST /api/v1/payments                         - Pay a fee
//! GET  /api/v1/payments/history                 - Newest first (staff)
//! GET  /api/v1/payments/revenue                 - Completed total (staff)
//! GET  /api/v1/refunds                          - Refund requests
//! POST /api/v1/refunds                          - Request a refund (student)
//! POST /api/v1/refunds/{id}/approve             - Approve (admin)
//! POST /api/v1/refunds/{id}/reject              - Reject (admin)
//! GET  /api/v1/invoices                         - Invoices
//! POST /api/v1/invoices                         - Issue an invoice (staff)
//! POST /api/v1/invoices/{id}/pay                - Pay an invoice
//! GET  /api/v1/reports/unpaid                   - Students with balances (staff)
//! ```
//!
//! CORS is configured permissively.

pub mod auth;
pub mod catalog;
pub mod chat;
pub mod error;
pub mod fees;
pub mod invoices;
pub mod middleware;
pub mod payments;
pub mod refunds;
pub mod reports;
pub mod request_id;
pub mod users;

use crate::chat::ChatClient;
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post, put},
};
use campus_ledger::Campus;
use campus_ledger::store::Scope;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub campus: Campus,
    pub chat: Arc<ChatClient>,
}

impl AppState {
    pub fn new(campus: Campus, chat: ChatClient) -> Self {
        Self {
            campus,
            chat: Arc::new(chat),
        }
    }
}

/// Create the complete API router with all endpoints and middleware.
///
/// # Example
///
/// ```rust,no_run
/// # use campus_server::api::{create_router, AppState};
/// # use campus_server::chat::ChatClient;
/// # use campus_ledger::Campus;
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let state = AppState::new(Campus::in_memory(), ChatClient::mock());
/// let app = create_router(state);
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```
pub fn create_router(state: AppState) -> Router {
    let v1_routes = create_v1_router(state.clone());

    Router::new()
        .route("/health", get(health_check))
        .route("/api/chat", post(chat::chat))
        .nest("/api/v1", v1_routes)
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn create_v1_router(state: AppState) -> Router<AppState> {
    let public_routes = Router::new().route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/users/{username}/wallet",
            get(users::get_wallet).post(users::adjust_wallet),
        )
        .route(
            "/catalog/categories",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/catalog/structures",
            get(catalog::list_structures).post(catalog::create_structure),
        )
        .route("/catalog/structures/{id}", put(catalog::update_structure))
        .route("/catalog/policies", get(catalog::list_policies))
        .route(
            "/students/{username}/fees",
            get(fees::list_student_fees).post(fees::assign_fee),
        )
        .route(
            "/students/{username}/payments",
            get(payments::list_student_payments),
        )
        .route("/students/{username}/balance", get(reports::student_balance))
        .route(
            "/payments",
            get(payments::list_payments).post(payments::create_payment),
        )
        .route("/payments/history", get(payments::payment_history))
        .route("/payments/revenue", get(payments::total_revenue))
        .route(
            "/refunds",
            get(refunds::list_refunds).post(refunds::create_refund),
        )
        .route("/refunds/{id}/approve", post(refunds::approve_refund))
        .route("/refunds/{id}/reject", post(refunds::reject_refund))
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route("/invoices/{id}/pay", post(invoices::pay_invoice))
        .route("/reports/unpaid", get(reports::unpaid_students))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth_middleware,
        ));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store answers, `503 Service Unavailable` otherwise.
///
/// ```bash
/// curl http://localhost:3000/health
/// # {"status":"healthy","version":"1.0.0","store":true,"timestamp":"2026-10-19T10:30:00Z"}
/// ```
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state
        .campus
        .store
        .get(Scope::Persistent, "users")
        .await
        .is_ok();

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
