//! Authentication API handlers.
//!
//! Login:
//! ```bash
//! curl -X POST http://localhost:3000/api/v1/auth/login \
//!   -H "Content-Type: application/json" \
//!   -d '{"username": "admin", "password": "admin123"}'
//! ```

use super::{AppState, error::ApiResult, middleware::AccessToken};
use crate::{logging::log_security_event, metrics};
use axum::{Extension, Json, extract::State, http::StatusCode};
use campus_ledger::session::SessionUser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: SessionUser,
    pub home_route: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub user: SessionUser,
    pub home_route: &'static str,
}

/// Check credentials and issue a bearer token.
///
/// # Errors
///
/// - `401 Unauthorized`: unknown username or wrong password
/// - `403 Forbidden`: account is disabled
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> ApiResult<Json<AuthResponse>> {
    let sessions = &state.campus.sessions;
    let user = match sessions
        .authenticate(&payload.username, &payload.password)
        .await
    {
        Ok(user) => user,
        Err(e) => {
            metrics::login_attempts_total(false);
            log_security_event("failed_login", Some(payload.username.trim()), &e.to_string());
            return Err(e.into());
        }
    };

    let token = sessions.issue_token(&user).await?;
    metrics::login_attempts_total(true);
    tracing::info!(username = %user.username, role = %user.role, "User logged in");

    Ok(Json(AuthResponse {
        token,
        home_route: user.home_route(),
        user,
    }))
}

/// Revoke the bearer token used for this request.
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<SessionUser>,
    Extension(AccessToken(token)): Extension<AccessToken>,
) -> ApiResult<StatusCode> {
    state.campus.sessions.revoke_token(&token).await?;
    tracing::info!(username = %user.username, "User logged out");
    Ok(StatusCode::NO_CONTENT)
}

/// Profile of the logged-in user.
pub async fn me(Extension(user): Extension<SessionUser>) -> Json<MeResponse> {
    Json(MeResponse {
        home_route: user.home_route(),
        user,
    })
}
