//! Small per-client string cookies with an expiry.
//!
//! Signed cookies carry `value.hexdigest` where the digest is HMAC-SHA256 over
//! the value with the jar secret.

use chrono::{DateTime, TimeDelta, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
struct Cookie {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Cookie storage for one client
#[derive(Debug)]
pub struct CookieJar {
    cookies: Mutex<HashMap<String, Cookie>>,
    secret: Vec<u8>,
}

impl CookieJar {
    /// Create an empty jar that signs with `secret`
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            cookies: Mutex::new(HashMap::new()),
            secret: secret.into(),
        }
    }

    fn cookies(&self) -> MutexGuard<'_, HashMap<String, Cookie>> {
        self.cookies
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Store `value` for `ttl_days`.
    ///
    /// Returns whether reading the cookie back yields `value`. Empty names,
    /// non-positive lifetimes, and expiries past the representable range are
    /// not accepted.
    pub fn set_cookie(&self, name: &str, value: &str, ttl_days: i64) -> bool {
        if name.is_empty() || ttl_days <= 0 {
            return false;
        }

        let Some(expires_at) = TimeDelta::try_days(ttl_days)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
        else {
            return false;
        };
        self.cookies().insert(
            name.to_string(),
            Cookie {
                value: value.to_string(),
                expires_at,
            },
        );

        self.get_cookie(name).as_deref() == Some(value)
    }

    /// Raw cookie value, unless missing or expired
    pub fn get_cookie(&self, name: &str) -> Option<String> {
        let mut cookies = self.cookies();
        match cookies.get(name) {
            Some(cookie) if cookie.expires_at > Utc::now() => Some(cookie.value.clone()),
            Some(_) => {
                cookies.remove(name);
                None
            }
            None => None,
        }
    }

    /// Expire a cookie immediately
    pub fn delete_cookie(&self, name: &str) {
        self.cookies().remove(name);
    }

    fn signature(&self, value: &str) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(value.as_bytes());
        Some(mac)
    }

    /// Store `value` with an HMAC signature appended
    pub fn set_signed_cookie(&self, name: &str, value: &str, ttl_days: i64) -> bool {
        let Some(mac) = self.signature(value) else {
            return false;
        };
        let signed = format!("{value}.{}", hex::encode(mac.finalize().into_bytes()));
        self.set_cookie(name, &signed, ttl_days)
    }

    /// Signed cookie value; tampered or unsigned values read as missing
    pub fn get_signed_cookie(&self, name: &str) -> Option<String> {
        let raw = self.get_cookie(name)?;
        let (value, digest) = raw.rsplit_once('.')?;
        let digest = hex::decode(digest).ok()?;

        let mac = self.signature(value)?;
        match mac.verify_slice(&digest) {
            Ok(()) => Some(value.to_string()),
            Err(_) => {
                log::warn!("Rejected cookie {name} with a bad signature");
                None
            }
        }
    }

    /// Force a cookie's expiry (used to simulate time passing)
    #[cfg(test)]
    fn expire(&self, name: &str) {
        if let Some(cookie) = self.cookies().get_mut(name) {
            cookie.expires_at = Utc::now() - TimeDelta::seconds(1);
        }
    }
}

impl Default for CookieJar {
    fn default() -> Self {
        Self::new(b"campus-ledger-dev-secret".to_vec())
    }
}
