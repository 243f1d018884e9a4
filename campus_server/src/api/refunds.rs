//! Refund request handlers.
//!
//! Deciding a request only records the decision; payments and fees are left
//! as they are.

use super::{
    AppState,
    error::{ApiError, ApiResult},
    middleware::{STAFF, require_role},
};
use crate::{logging::log_payment_event, metrics};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use campus_ledger::Money;
use campus_ledger::directory::Role;
use campus_ledger::refunds::{NewRefund, RefundRequest, RefundStatus};
use campus_ledger::session::SessionUser;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundPayload {
    pub payment_id: String,
    pub amount: Money,
    #[serde(default)]
    pub reason: String,
}

/// Request a refund against one of the caller's own payments.
///
/// # Errors
///
/// - `400 Bad Request`: non-positive amount
/// - `404 Not Found`: no such payment for this student
pub async fn create_refund(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<RefundPayload>,
) -> ApiResult<(StatusCode, Json<RefundRequest>)> {
    require_role(&user, &[Role::Student])?;

    let payment = state
        .campus
        .payments
        .find(&payload.payment_id)
        .await?
        .filter(|p| p.belongs_to(&user.username))
        .ok_or_else(|| ApiError::not_found(format!("Payment not found: {}", payload.payment_id)))?;

    let request = state
        .campus
        .refunds
        .create(NewRefund {
            user_id: payment.user_id,
            username: payment.username,
            payment_id: payment.id,
            amount: payload.amount,
            reason: payload.reason,
        })
        .await?;

    metrics::refunds_total("pending");
    Ok((StatusCode::CREATED, Json(request)))
}

/// Staff see every request; students see their own.
pub async fn list_refunds(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<RefundRequest>>> {
    let requests = if user.has_role(STAFF) {
        state.campus.refunds.list_all().await?
    } else {
        state.campus.refunds.list_for_student(&user.username).await?
    };
    Ok(Json(requests))
}

pub async fn approve_refund(
    state: State<AppState>,
    user: Extension<SessionUser>,
    id: Path<String>,
) -> ApiResult<Json<RefundRequest>> {
    decide(state, user, id, RefundStatus::Approved).await
}

pub async fn reject_refund(
    state: State<AppState>,
    user: Extension<SessionUser>,
    id: Path<String>,
) -> ApiResult<Json<RefundRequest>> {
    decide(state, user, id, RefundStatus::Rejected).await
}

async fn decide(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    status: RefundStatus,
) -> ApiResult<Json<RefundRequest>> {
    require_role(&user, &[Role::Admin])?;
    let request = state.campus.refunds.set_status(&id, status).await?;

    let outcome = status.to_string();
    metrics::refunds_total(&outcome);
    log_payment_event("refund", &request.username, request.amount, &outcome);
    Ok(Json(request))
}
