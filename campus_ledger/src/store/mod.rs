//! Key-value storage with persistent and session scopes.
//!
//! Every ledger component persists its records through the [`KeyValueStore`]
//! trait. Values are JSON text; the typed helpers [`set_item`] and [`get_item`]
//! handle serialization. Implementations:
//!
//! - [`MemoryStore`]: both scopes in memory (tests, demos)
//! - [`FileStore`]: persistent scope in a JSON file on disk
//! - [`PgStore`]: persistent scope in a PostgreSQL table
//!
//! [`Collection`] layers a typed, compare-and-swap repository on top, and
//! [`CookieJar`] covers the small remember-me cookies.
//!
//! ## Example
//!
//! ```
//! use campus_ledger::store::{get_item, set_item, MemoryStore, Scope};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::new();
//! set_item(&store, Scope::Session, "greeting", &"hello").await?;
//! let value: Option<String> = get_item(&store, Scope::Session, "greeting").await?;
//! assert_eq!(value.as_deref(), Some("hello"));
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

pub mod collection;
pub mod config;
pub mod cookies;
pub mod errors;
pub mod file;
pub mod memory;
pub mod postgres;

pub use collection::{Collection, MAX_CAS_RETRIES, Record};
pub use config::DatabaseConfig;
pub use cookies::CookieJar;
pub use errors::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Survives restarts
    Persistent,
    /// Dropped when the session ends
    Session,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Scope::Persistent => write!(f, "persistent"),
            Scope::Session => write!(f, "session"),
        }
    }
}

/// Raw string storage shared by every ledger component
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the raw value under `key`
    async fn get(&self, scope: Scope, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    async fn set(&self, scope: Scope, key: &str, value: String) -> StoreResult<()>;

    /// Remove `key` (no-op when absent)
    async fn remove(&self, scope: Scope, key: &str) -> StoreResult<()>;

    /// Write `new` only if the current value equals `expected`.
    ///
    /// `expected = None` means the key must be absent. Returns whether the
    /// write happened.
    async fn compare_and_swap(
        &self,
        scope: Scope,
        key: &str,
        expected: Option<&str>,
        new: String,
    ) -> StoreResult<bool>;

    /// Drop every key in `scope`
    async fn clear_scope(&self, scope: Scope) -> StoreResult<()>;
}

/// Serialize `value` as JSON and store it under `key`
pub async fn set_item<S, T>(store: &S, scope: Scope, key: &str, value: &T) -> StoreResult<()>
where
    S: KeyValueStore + ?Sized,
    T: Serialize + Sync + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.set(scope, key, raw).await
}

/// Read and deserialize the value under `key`.
///
/// Absent keys and malformed values both read as `None`.
pub async fn get_item<S, T>(store: &S, scope: Scope, key: &str) -> StoreResult<Option<T>>
where
    S: KeyValueStore + ?Sized,
    T: DeserializeOwned,
{
    let Some(raw) = store.get(scope, key).await? else {
        return Ok(None);
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            log::warn!("Ignoring malformed {scope} value under {key}: {e}");
            Ok(None)
        }
    }
}

/// Remove the value under `key`
pub async fn remove_item<S>(store: &S, scope: Scope, key: &str) -> StoreResult<()>
where
    S: KeyValueStore + ?Sized,
{
    store.remove(scope, key).await
}
