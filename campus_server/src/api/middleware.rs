//! Authentication middleware and role checks for protected endpoints.
//!
//! The middleware reads the `Authorization: Bearer <token>` header, resolves
//! the token to a [`SessionUser`], and injects both into request extensions:
//!
//! ```rust,no_run
//! use axum::extract::Extension;
//! use campus_ledger::session::SessionUser;
//!
//! async fn protected_handler(Extension(user): Extension<SessionUser>) -> String {
//!     format!("Authenticated as {}", user.username)
//! }
//! # let _ = protected_handler;
//! ```

use super::{AppState, error::ApiError};
use crate::logging::log_security_event;
use axum::{
    extract::{Request, State},
    http::{StatusCode, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use campus_ledger::directory::Role;
use campus_ledger::session::{SessionError, SessionUser};

/// Bearer token of the current request
#[derive(Debug, Clone)]
pub struct AccessToken(pub String);

/// Authentication middleware that resolves bearer tokens to session users.
///
/// - **Missing header / invalid format**: `401 Unauthorized`
/// - **Unknown, revoked, or expired token**: `401 Unauthorized`
/// - **Account deleted or deactivated since login**: `401 Unauthorized`
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    match state.campus.sessions.resolve_token(&token).await {
        Ok(user) => {
            request.extensions_mut().insert(user);
            request.extensions_mut().insert(AccessToken(token));
            Ok(next.run(request).await)
        }
        Err(SessionError::AccountDisabled) => {
            log_security_event("disabled_token", None, "Rejected token of a disabled account");
            Err(StatusCode::UNAUTHORIZED)
        }
        Err(SessionError::Store(e)) => {
            tracing::error!("Token lookup failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(SessionError::Directory(e)) => {
            tracing::error!("Token lookup failed: {e}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(_) => {
            log_security_event("invalid_token", None, "Rejected unknown bearer token");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}

/// Fail with 403 unless `user` holds one of `roles`
pub fn require_role(user: &SessionUser, roles: &[Role]) -> Result<(), ApiError> {
    if user.has_role(roles) {
        Ok(())
    } else {
        log_security_event(
            "forbidden",
            Some(&user.username),
            &format!("Role {} not allowed", user.role),
        );
        Err(ApiError::forbidden())
    }
}

/// Staff roles that may act on behalf of any student
pub const STAFF: &[Role] = &[Role::Admin, Role::Accounting];

/// Fail with 403 unless `user` is staff or is the account named `username`
pub fn require_self_or_staff(user: &SessionUser, username: &str) -> Result<(), ApiError> {
    if user.username.eq_ignore_ascii_case(username.trim()) {
        return Ok(());
    }
    require_role(user, STAFF)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, role: Role) -> SessionUser {
        SessionUser {
            username: name.to_string(),
            role,
            firstname: None,
            lastname: None,
            email: None,
        }
    }

    #[test]
    fn test_require_role() {
        assert!(require_role(&user("root", Role::Admin), &[Role::Admin]).is_ok());
        let err = require_role(&user("alice", Role::Student), &[Role::Admin]).unwrap_err();
        assert_eq!(err.status, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require_self_or_staff() {
        let alice = user("alice", Role::Student);
        assert!(require_self_or_staff(&alice, "Alice").is_ok());
        assert!(require_self_or_staff(&alice, "bob").is_err());
        assert!(require_self_or_staff(&user("acct", Role::Accounting), "bob").is_ok());
    }
}
