//! Session data models.

use crate::directory::{Role, User};
use crate::store::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Minimal profile of the logged-in user (never carries the password)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firstname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

impl From<&User> for SessionUser {
    fn from(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            role: user.role,
            firstname: non_empty(&user.firstname),
            lastname: non_empty(&user.lastname),
            email: non_empty(&user.email),
        }
    }
}

impl SessionUser {
    pub fn has_role(&self, roles: &[Role]) -> bool {
        roles.contains(&self.role)
    }

    pub fn home_route(&self) -> &'static str {
        self.role.home_route()
    }
}

/// Login form prefill from remember-me cookies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RememberedLogin {
    pub username: String,
    pub password: Option<String>,
}

/// Bearer token issued at login, bound to the account id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionToken {
    pub token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

impl SessionToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl Record for SessionToken {
    const COLLECTION: &'static str = "sessionTokens";

    fn id(&self) -> &str {
        &self.token
    }
}
