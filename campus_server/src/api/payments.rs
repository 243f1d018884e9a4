//! Payment handlers.

use super::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{STAFF, require_role, require_self_or_staff},
};
use crate::{logging::log_payment_event, metrics};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use campus_ledger::Money;
use campus_ledger::payments::{Payment, PaymentRequest};
use campus_ledger::session::SessionUser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPayload {
    pub student_fee_id: String,
    pub amount: Money,
    pub method: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueResponse {
    pub total_revenue: Money,
}

/// Pay towards a student fee.
///
/// Students may only pay their own fees. The amount is capped at the fee's
/// remaining balance; method `Wallet` debits the student's wallet.
///
/// # Errors
///
/// - `400 Bad Request`: nothing left to pay, or the wallet cannot cover it
/// - `404 Not Found`: unknown student fee
/// - `409 Conflict`: idempotency key already used
pub async fn create_payment(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<PaymentPayload>,
) -> ApiResult<(StatusCode, Json<Payment>)> {
    let fee = state
        .campus
        .fees
        .find(&payload.student_fee_id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student fee not found: {}", payload.student_fee_id)))?;
    require_self_or_staff(&user, &fee.user_id)?;

    let mut request =
        PaymentRequest::new(&fee.user_id, &fee.id, payload.amount, &payload.method);
    if let Some(key) = payload.idempotency_key.filter(|k| !k.trim().is_empty()) {
        request = request.with_idempotency_key(key);
    }

    match state.campus.payments.create(request).await {
        Ok(payment) => {
            metrics::payments_total(&payment.payment_method, "completed");
            metrics::payment_amount(payment.amount);
            log_payment_event("payment", &payment.username, payment.amount, "completed");
            Ok((StatusCode::CREATED, Json(payment)))
        }
        Err(e) => {
            metrics::payments_total(&payload.method, "rejected");
            log_payment_event("payment", &fee.user_id, payload.amount, "rejected");
            Err(e.into())
        }
    }
}

pub async fn list_payments(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<Payment>>> {
    require_role(&user, STAFF)?;
    Ok(Json(state.campus.payments.list_all().await?))
}

pub async fn list_student_payments(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<Payment>>> {
    require_self_or_staff(&user, &username)?;
    Ok(Json(state.campus.payments.list_for_student(&username).await?))
}

/// All payments, newest first
pub async fn payment_history(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<Payment>>> {
    require_role(&user, STAFF)?;
    Ok(Json(state.campus.reports.payment_history().await?))
}

/// Sum of completed payments
pub async fn total_revenue(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<RevenueResponse>> {
    require_role(&user, STAFF)?;
    let total_revenue = state.campus.reports.total_revenue().await?;
    Ok(Json(RevenueResponse { total_revenue }))
}
