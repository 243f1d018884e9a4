//! Session manager.

use super::{
    errors::{SessionError, SessionResult},
    models::{RememberedLogin, SessionToken, SessionUser},
};
use crate::directory::UserDirectory;
use crate::store::{
    Collection, CookieJar, KeyValueStore, Scope, StoreError, get_item, remove_item, set_item,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Key of the current-user marker
pub const CURRENT_USER_KEY: &str = "currentUser";

/// Remember-me cookie holding the username
pub const LAST_USER_COOKIE: &str = "lastUser";

/// Remember-me cookie holding the base64-encoded password
pub const LAST_PASS_COOKIE: &str = "lastPass";

/// Lifetime of remember-me cookies
pub const REMEMBER_DAYS: i64 = 30;

/// Default lifetime of bearer tokens
pub const TOKEN_TTL_HOURS: i64 = 12;

/// Login and session tracking
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    users: UserDirectory,
    tokens: Collection<SessionToken>,
    token_ttl: TimeDelta,
}

impl SessionManager {
    pub fn new(store: Arc<dyn KeyValueStore>, users: UserDirectory) -> Self {
        Self {
            tokens: Collection::in_scope(store.clone(), Scope::Session),
            store,
            users,
            token_ttl: TimeDelta::hours(TOKEN_TTL_HOURS),
        }
    }

    /// Use `ttl` for tokens issued from now on
    pub fn with_token_ttl(mut self, ttl: TimeDelta) -> Self {
        self.token_ttl = ttl;
        self
    }

    /// Check credentials without touching any session state.
    ///
    /// The username is trimmed and compared ignoring case; the password must
    /// match exactly.
    ///
    /// # Errors
    ///
    /// * `InvalidCredentials` - Unknown username or wrong password
    /// * `AccountDisabled` - Credentials match a deactivated account
    pub async fn authenticate(&self, username: &str, password: &str) -> SessionResult<SessionUser> {
        let Some(user) = self.users.find_by_username(username.trim()).await? else {
            log::warn!("Login failed for unknown user {}", username.trim());
            return Err(SessionError::InvalidCredentials);
        };

        let matches: bool = user.password.as_bytes().ct_eq(password.as_bytes()).into();
        if !matches {
            log::warn!("Login failed for {}: wrong password", user.username);
            return Err(SessionError::InvalidCredentials);
        }
        if !user.is_active {
            log::warn!("Login refused for disabled account {}", user.username);
            return Err(SessionError::AccountDisabled);
        }

        Ok(SessionUser::from(&user))
    }

    /// Log in and record the current user.
    ///
    /// With `remember`, the username and encoded password are also kept in
    /// cookies for [`REMEMBER_DAYS`] days and the marker is written to the
    /// persistent scope. A rejected cookie falls back to the persistent scope.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        remember: bool,
        jar: &CookieJar,
    ) -> SessionResult<SessionUser> {
        let user = self.authenticate(username, password).await?;
        set_item(self.store.as_ref(), Scope::Session, CURRENT_USER_KEY, &user).await?;

        if remember {
            let encoded = STANDARD.encode(password);
            if !jar.set_cookie(LAST_USER_COOKIE, &user.username, REMEMBER_DAYS) {
                set_item(self.store.as_ref(), Scope::Persistent, LAST_USER_COOKIE, &user.username)
                    .await?;
            }
            if !jar.set_cookie(LAST_PASS_COOKIE, &encoded, REMEMBER_DAYS) {
                set_item(self.store.as_ref(), Scope::Persistent, LAST_PASS_COOKIE, &encoded).await?;
            }
            set_item(self.store.as_ref(), Scope::Persistent, CURRENT_USER_KEY, &user).await?;
        }

        log::info!("{} logged in as {}", user.username, user.role);
        Ok(user)
    }

    /// Logged-in user: session scope first, then the remembered one
    pub async fn current_user(&self) -> SessionResult<Option<SessionUser>> {
        for scope in [Scope::Session, Scope::Persistent] {
            let user: Option<SessionUser> =
                get_item(self.store.as_ref(), scope, CURRENT_USER_KEY).await?;
            if let Some(user) = user.filter(|u| !u.username.is_empty()) {
                return Ok(Some(user));
            }
        }
        Ok(None)
    }

    /// Forget the current user and the remember-me cookies
    pub async fn logout(&self, jar: &CookieJar) -> SessionResult<()> {
        let store = self.store.as_ref();
        remove_item(store, Scope::Session, CURRENT_USER_KEY).await?;
        remove_item(store, Scope::Persistent, CURRENT_USER_KEY).await?;
        remove_item(store, Scope::Persistent, LAST_USER_COOKIE).await?;
        remove_item(store, Scope::Persistent, LAST_PASS_COOKIE).await?;
        jar.delete_cookie(LAST_USER_COOKIE);
        jar.delete_cookie(LAST_PASS_COOKIE);
        Ok(())
    }

    /// Login form prefill from the remember-me cookies
    pub async fn remembered_login(&self, jar: &CookieJar) -> SessionResult<Option<RememberedLogin>> {
        let username = match jar.get_cookie(LAST_USER_COOKIE) {
            Some(username) => Some(username),
            None => get_item(self.store.as_ref(), Scope::Persistent, LAST_USER_COOKIE).await?,
        };
        let Some(username) = username else {
            return Ok(None);
        };

        let encoded = match jar.get_cookie(LAST_PASS_COOKIE) {
            Some(encoded) => Some(encoded),
            None => get_item::<_, String>(self.store.as_ref(), Scope::Persistent, LAST_PASS_COOKIE)
                .await?,
        };
        let password = encoded
            .and_then(|e| STANDARD.decode(e).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok());

        Ok(Some(RememberedLogin { username, password }))
    }

    /// Landing page for the user's role
    pub fn home_route(user: &SessionUser) -> &'static str {
        user.home_route()
    }

    // === Bearer tokens ===

    /// Issue an opaque token for the account behind `user`.
    ///
    /// Expired tokens are dropped in the same write.
    ///
    /// # Errors
    ///
    /// * `SessionNotFound` - The account no longer exists
    pub async fn issue_token(&self, user: &SessionUser) -> SessionResult<String> {
        let account = self
            .users
            .find_by_username(&user.username)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.token_ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let record = SessionToken {
            token: uuid::Uuid::new_v4().simple().to_string(),
            user_id: account.id,
            expires_at,
        };

        self.tokens
            .modify(|tokens| {
                tokens.retain(|t| !t.is_expired(now));
                tokens.push(record.clone());
                Ok::<_, StoreError>(())
            })
            .await?;
        Ok(record.token)
    }

    /// Current profile of the account the token was issued to.
    ///
    /// Role and names come from the directory, not from the login snapshot.
    ///
    /// # Errors
    ///
    /// * `SessionNotFound` - Unknown, revoked, or expired token, or the
    ///   account was deleted
    /// * `AccountDisabled` - The account was deactivated after login
    pub async fn resolve_token(&self, token: &str) -> SessionResult<SessionUser> {
        let record = self
            .tokens
            .find(token)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        if record.is_expired(Utc::now()) {
            self.tokens.remove(token).await?;
            return Err(SessionError::SessionNotFound);
        }

        let Some(user) = self.users.find(&record.user_id).await? else {
            self.tokens.remove(token).await?;
            return Err(SessionError::SessionNotFound);
        };
        if !user.is_active {
            log::warn!("Token refused for disabled account {}", user.username);
            return Err(SessionError::AccountDisabled);
        }

        Ok(SessionUser::from(&user))
    }

    pub async fn revoke_token(&self, token: &str) -> SessionResult<()> {
        self.tokens.remove(token).await?;
        Ok(())
    }
}
