//! In-memory key-value store.

use super::{KeyValueStore, Scope, StoreResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Both scopes held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    persistent: Mutex<HashMap<String, String>>,
    session: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, scope: Scope) -> MutexGuard<'_, HashMap<String, String>> {
        let lock = match scope {
            Scope::Persistent => &self.persistent,
            Scope::Session => &self.session,
        };
        // Every critical section is a single map call, so poisoning is harmless
        lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of keys in `scope`
    pub fn len(&self, scope: Scope) -> usize {
        self.map(scope).len()
    }

    pub fn is_empty(&self, scope: Scope) -> bool {
        self.map(scope).is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, scope: Scope, key: &str) -> StoreResult<Option<String>> {
        Ok(self.map(scope).get(key).cloned())
    }

    async fn set(&self, scope: Scope, key: &str, value: String) -> StoreResult<()> {
        self.map(scope).insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, scope: Scope, key: &str) -> StoreResult<()> {
        self.map(scope).remove(key);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        scope: Scope,
        key: &str,
        expected: Option<&str>,
        new: String,
    ) -> StoreResult<bool> {
        let mut map = self.map(scope);
        if map.get(key).map(String::as_str) != expected {
            return Ok(false);
        }
        map.insert(key.to_string(), new);
        Ok(true)
    }

    async fn clear_scope(&self, scope: Scope) -> StoreResult<()> {
        self.map(scope).clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_and_swap_requires_expected_value() {
        let store = MemoryStore::new();

        // Absent key: only `None` matches
        assert!(
            !store
                .compare_and_swap(Scope::Persistent, "k", Some("x"), "1".to_string())
                .await
                .unwrap()
        );
        assert!(
            store
                .compare_and_swap(Scope::Persistent, "k", None, "1".to_string())
                .await
                .unwrap()
        );

        // Stale expectation loses
        assert!(
            !store
                .compare_and_swap(Scope::Persistent, "k", None, "2".to_string())
                .await
                .unwrap()
        );
        assert!(
            store
                .compare_and_swap(Scope::Persistent, "k", Some("1"), "2".to_string())
                .await
                .unwrap()
        );

        assert_eq!(
            store.get(Scope::Persistent, "k").await.unwrap().as_deref(),
            Some("2")
        );
    }

    #[tokio::test]
    async fn test_clear_session_keeps_persistent() {
        let store = MemoryStore::new();
        store
            .set(Scope::Persistent, "users", "[]".to_string())
            .await
            .unwrap();
        store
            .set(Scope::Session, "currentUser", "{}".to_string())
            .await
            .unwrap();

        store.clear_scope(Scope::Session).await.unwrap();

        assert!(store.is_empty(Scope::Session));
        assert_eq!(store.len(Scope::Persistent), 1);
    }
}
