//! Login sessions, the current-user marker, and remember-me cookies.
//!
//! The logged-in user is kept under `currentUser` in the session scope (and in
//! the persistent scope when "remember me" is checked). Server clients get an
//! opaque bearer token bound to their account id; it expires after
//! [`TOKEN_TTL_HOURS`] and is checked against the directory on every use.

pub mod errors;
pub mod manager;
pub mod models;

pub use errors::{SessionError, SessionResult};
pub use manager::{
    CURRENT_USER_KEY, LAST_PASS_COOKIE, LAST_USER_COOKIE, REMEMBER_DAYS, SessionManager,
    TOKEN_TTL_HOURS,
};
pub use models::{RememberedLogin, SessionToken, SessionUser};
