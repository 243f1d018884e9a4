//! Student fee handlers.

use super::{
    AppState,
    error::ApiResult,
    middleware::{STAFF, require_role, require_self_or_staff},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use campus_ledger::fees::{FeeCharge, StudentFee};
use campus_ledger::session::SessionUser;

/// A student's fees; missing template rows are created first.
pub async fn list_student_fees(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<StudentFee>>> {
    require_self_or_staff(&user, &username)?;
    Ok(Json(state.campus.fees.list_for_student(&username).await?))
}

/// Charge a template or a one-off amount to a student.
///
/// ```json
/// { "kind": "template", "feeStructureId": "structure-tuition", "amount": 150 }
/// { "kind": "custom", "amount": 75, "description": "Lab breakage" }
/// ```
pub async fn assign_fee(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(username): Path<String>,
    Json(charge): Json<FeeCharge>,
) -> ApiResult<(StatusCode, Json<StudentFee>)> {
    require_role(&user, STAFF)?;
    let fee = state.campus.fees.assign_fee(&username, charge).await?;
    tracing::info!(by = %user.username, fee_id = %fee.id, username = %username, "Fee assigned");
    Ok((StatusCode::CREATED, Json(fee)))
}
