//! File-backed key-value store.
//!
//! The persistent scope is a single JSON object on disk, rewritten after every
//! mutation (write to a sibling temp file, then rename). The in-memory copy
//! only changes once the rewrite has succeeded. The session scope lives
//! in memory and ends with the process.

use super::{KeyValueStore, MemoryStore, Scope, StoreResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Key-value store persisted to a JSON file
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    persistent: Mutex<BTreeMap<String, String>>,
    session: MemoryStore,
}

impl FileStore {
    /// Open the store at `path`, loading existing data if the file exists
    ///
    /// # Errors
    ///
    /// * `StoreError::Io` - File exists but cannot be read
    /// * `StoreError::Serialization` - File is not a JSON object of strings
    pub async fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();

        let persistent = match tokio::fs::read_to_string(&path).await {
            Ok(text) if text.trim().is_empty() => BTreeMap::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        log::info!(
            "Opened file store at {} ({} keys)",
            path.display(),
            persistent.len()
        );

        Ok(Self {
            path,
            persistent: Mutex::new(persistent),
            session: MemoryStore::new(),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn flush(&self, map: &BTreeMap<String, String>) -> StoreResult<()> {
        let text = serde_json::to_string_pretty(map)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, text).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, scope: Scope, key: &str) -> StoreResult<Option<String>> {
        match scope {
            Scope::Session => self.session.get(scope, key).await,
            Scope::Persistent => Ok(self.persistent.lock().await.get(key).cloned()),
        }
    }

    async fn set(&self, scope: Scope, key: &str, value: String) -> StoreResult<()> {
        match scope {
            Scope::Session => self.session.set(scope, key, value).await,
            Scope::Persistent => {
                let mut map = self.persistent.lock().await;
                let mut next = map.clone();
                next.insert(key.to_string(), value);
                self.flush(&next).await?;
                *map = next;
                Ok(())
            }
        }
    }

    async fn remove(&self, scope: Scope, key: &str) -> StoreResult<()> {
        match scope {
            Scope::Session => self.session.remove(scope, key).await,
            Scope::Persistent => {
                let mut map = self.persistent.lock().await;
                if !map.contains_key(key) {
                    return Ok(());
                }
                let mut next = map.clone();
                next.remove(key);
                self.flush(&next).await?;
                *map = next;
                Ok(())
            }
        }
    }

    async fn compare_and_swap(
        &self,
        scope: Scope,
        key: &str,
        expected: Option<&str>,
        new: String,
    ) -> StoreResult<bool> {
        match scope {
            Scope::Session => {
                self.session
                    .compare_and_swap(scope, key, expected, new)
                    .await
            }
            Scope::Persistent => {
                let mut map = self.persistent.lock().await;
                if map.get(key).map(String::as_str) != expected {
                    return Ok(false);
                }
                let mut next = map.clone();
                next.insert(key.to_string(), new);
                self.flush(&next).await?;
                *map = next;
                Ok(true)
            }
        }
    }

    async fn clear_scope(&self, scope: Scope) -> StoreResult<()> {
        match scope {
            Scope::Session => self.session.clear_scope(scope).await,
            Scope::Persistent => {
                let mut map = self.persistent.lock().await;
                self.flush(&BTreeMap::new()).await?;
                map.clear();
                Ok(())
            }
        }
    }
}
