//! Invoice handlers.

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
use campus_ledger::invoices::{INVOICE_PAYMENT_METHOD, Invoice, NewInvoice};
use campus_ledger::payments::Payment;
use campus_ledger::session::SessionUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoicePayload {
    pub username: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: Money,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct PayInvoicePayload {
    #[serde(default)]
    pub method: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PaidInvoice {
    pub invoice: Invoice,
    pub payment: Payment,
}

/// Issue an unpaid invoice to a student.
///
/// # Errors
///
/// - `400 Bad Request`: blank title or non-positive amount
/// - `404 Not Found`: unknown username
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(payload): Json<InvoicePayload>,
) -> ApiResult<(StatusCode, Json<Invoice>)> {
    require_role(&user, STAFF)?;

    let student = state
        .campus
        .users
        .find_by_username(&payload.username)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let invoice = state
        .campus
        .invoices
        .create(NewInvoice {
            user_id: student.id,
            username: student.username,
            title: payload.title,
            description: payload.description,
            amount: payload.amount,
            due_date: payload.due_date,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(invoice)))
}

/// Staff see every invoice; students see their own.
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<Invoice>>> {
    let invoices = if user.has_role(STAFF) {
        state.campus.invoices.list_all().await?
    } else {
        state.campus.invoices.list_for_student(&user.username).await?
    };
    Ok(Json(invoices))
}

/// Pay an invoice in full.
///
/// Method defaults to `Invoice Payment`; `Wallet` debits the student's wallet.
///
/// # Errors
///
/// - `400 Bad Request`: the wallet cannot cover the invoice
/// - `404 Not Found`: unknown invoice
/// - `409 Conflict`: invoice already paid or cancelled
pub async fn pay_invoice(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    payload: Option<Json<PayInvoicePayload>>,
) -> ApiResult<Json<PaidInvoice>> {
    let invoice = state
        .campus
        .invoices
        .find(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Invoice not found: {id}")))?;
    require_self_or_staff(&user, &invoice.username)?;

    let method = payload
        .and_then(|Json(p)| p.method)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| INVOICE_PAYMENT_METHOD.to_string());

    match state.campus.invoices.pay(&id, &method).await {
        Ok((invoice, payment)) => {
            metrics::payments_total(&method, "completed");
            metrics::payment_amount(payment.amount);
            log_payment_event("invoice", &invoice.username, invoice.amount, "completed");
            Ok(Json(PaidInvoice { invoice, payment }))
        }
        Err(e) => {
            metrics::payments_total(&method, "rejected");
            log_payment_event("invoice", &invoice.username, invoice.amount, "rejected");
            Err(e.into())
        }
    }
}
