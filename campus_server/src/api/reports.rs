//! Reconciliation report handlers.

use super::{
    AppState,
    error::ApiResult,
    middleware::{STAFF, require_role, require_self_or_staff},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
};
use campus_ledger::reports::{StudentBalance, UnpaidStudent};
use campus_ledger::session::SessionUser;

/// Active students with an outstanding balance
pub async fn unpaid_students(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<UnpaidStudent>>> {
    require_role(&user, STAFF)?;
    Ok(Json(state.campus.reports.unpaid_students().await?))
}

/// Totals for one student; unknown students read as zeros
pub async fn student_balance(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(username): Path<String>,
) -> ApiResult<Json<StudentBalance>> {
    require_self_or_staff(&user, &username)?;
    Ok(Json(state.campus.reports.student_balance(&username).await?))
}
