//! User administration and wallet handlers.

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
use campus_ledger::Money;
use campus_ledger::directory::{NewUser, Role, User, UserUpdate};
use campus_ledger::session::SessionUser;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User as returned over the API (never carries the password)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub role: Role,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub wallet_balance: Money,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            firstname: user.firstname,
            lastname: user.lastname,
            email: user.email,
            is_active: user.is_active,
            created_at: user.created_at,
            wallet_balance: user.wallet_balance,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub username: String,
    pub balance: Money,
}

#[derive(Debug, Deserialize)]
pub struct WalletAdjustment {
    pub delta: Money,
}

pub async fn list_users(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
) -> ApiResult<Json<Vec<UserView>>> {
    require_role(&user, &[Role::Admin])?;
    let users = state.campus.users.list().await?;
    Ok(Json(users.into_iter().map(UserView::from).collect()))
}

/// Create an account; active students are enrolled in every active template.
///
/// # Errors
///
/// - `400 Bad Request`: empty username
/// - `409 Conflict`: username already taken
pub async fn create_user(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Json(new_user): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    require_role(&user, &[Role::Admin])?;
    let created = state.campus.create_user(new_user).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
    Json(changes): Json<UserUpdate>,
) -> ApiResult<Json<UserView>> {
    require_role(&user, &[Role::Admin])?;
    let updated = state.campus.update_user(&id, changes).await?;
    Ok(Json(updated.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    require_role(&user, &[Role::Admin])?;
    state.campus.users.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Wallet balance; unknown usernames read as 0.
pub async fn get_wallet(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(username): Path<String>,
) -> ApiResult<Json<WalletResponse>> {
    require_self_or_staff(&user, &username)?;
    let balance = state.campus.users.get_wallet(&username).await?;
    Ok(Json(WalletResponse { username, balance }))
}

/// Credit (positive delta) or debit (negative delta) a wallet.
///
/// # Errors
///
/// - `400 Bad Request`: the debit would make the balance negative
/// - `404 Not Found`: unknown username
pub async fn adjust_wallet(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Path(username): Path<String>,
    Json(adjustment): Json<WalletAdjustment>,
) -> ApiResult<Json<WalletResponse>> {
    require_role(&user, STAFF)?;
    let balance = state
        .campus
        .users
        .adjust_wallet(&username, adjustment.delta)
        .await?;
    tracing::info!(
        by = %user.username,
        username = %username,
        delta = adjustment.delta,
        balance,
        "Wallet adjusted"
    );
    Ok(Json(WalletResponse { username, balance }))
}
