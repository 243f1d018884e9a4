//! Typed record collections with atomic single-record updates.
//!
//! A collection is one JSON array stored under a fixed key, in the persistent
//! scope unless built with [`Collection::in_scope`]. Every
//! write reads the array, edits it, and writes it back with compare-and-swap
//! against the exact text it read. When another writer got there first the
//! edit is replayed on fresh data, so concurrent writers never lose updates.

use super::{KeyValueStore, Scope, StoreError, StoreResult};
use serde::{Serialize, de::DeserializeOwned};
use std::marker::PhantomData;
use std::sync::Arc;

/// Attempts before a contended write gives up with [`StoreError::Conflict`]
pub const MAX_CAS_RETRIES: usize = 16;

/// A record stored in a [`Collection`]
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Persistent key holding the collection
    const COLLECTION: &'static str;

    /// Record identifier
    fn id(&self) -> &str;
}

/// Repository over one record type
pub struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    scope: Scope,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            scope: self.scope,
            _record: PhantomData,
        }
    }
}

impl<T: Record> Collection<T> {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::in_scope(store, Scope::Persistent)
    }

    /// Collection kept in `scope`
    pub fn in_scope(store: Arc<dyn KeyValueStore>, scope: Scope) -> Self {
        Self {
            store,
            scope,
            _record: PhantomData,
        }
    }

    /// Read the raw text and the parsed records
    async fn load(&self) -> StoreResult<(Option<String>, Vec<T>)> {
        let raw = self.store.get(self.scope, T::COLLECTION).await?;
        let records = match raw.as_deref() {
            None => Vec::new(),
            Some(text) => serde_json::from_str(text)
                .map_err(|_| StoreError::Corrupt(T::COLLECTION.to_string()))?,
        };
        Ok((raw, records))
    }

    /// All records; a malformed collection reads as empty
    pub async fn all(&self) -> StoreResult<Vec<T>> {
        match self.load().await {
            Ok((_, records)) => Ok(records),
            Err(StoreError::Corrupt(key)) => {
                log::warn!("Collection {key} is malformed, reading as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Records matching `pred`
    pub async fn filter(&self, pred: impl Fn(&T) -> bool + Send) -> StoreResult<Vec<T>> {
        let mut records = self.all().await?;
        records.retain(|r| pred(r));
        Ok(records)
    }

    /// Record with the given id
    pub async fn find(&self, id: &str) -> StoreResult<Option<T>> {
        Ok(self.all().await?.into_iter().find(|r| r.id() == id))
    }

    /// Edit the whole collection atomically.
    ///
    /// `f` may run more than once when another writer wins the race, so it must
    /// only touch the vector it is given. Returning `Err` aborts without writing.
    pub async fn modify<R, E, F>(&self, mut f: F) -> Result<R, E>
    where
        F: FnMut(&mut Vec<T>) -> Result<R, E> + Send,
        E: From<StoreError>,
        R: Send,
    {
        for attempt in 1..=MAX_CAS_RETRIES {
            let (raw, mut records) = self.load().await?;
            let out = f(&mut records)?;

            let next = serde_json::to_string(&records).map_err(StoreError::from)?;
            if raw.as_deref() == Some(next.as_str()) {
                return Ok(out);
            }

            let swapped = self
                .store
                .compare_and_swap(self.scope, T::COLLECTION, raw.as_deref(), next)
                .await?;
            if swapped {
                return Ok(out);
            }

            log::debug!(
                "Write conflict on {} (attempt {attempt}/{MAX_CAS_RETRIES})",
                T::COLLECTION
            );
            tokio::task::yield_now().await;
        }

        Err(StoreError::Conflict(T::COLLECTION.to_string()).into())
    }

    /// Append a record
    pub async fn insert(&self, record: T) -> StoreResult<T> {
        self.modify(|records| {
            records.push(record.clone());
            Ok::<_, StoreError>(())
        })
        .await?;
        Ok(record)
    }

    /// Write `records` only if the collection has never been written
    pub async fn seed(&self, records: Vec<T>) -> StoreResult<bool> {
        let text = serde_json::to_string(&records)?;
        self.store
            .compare_and_swap(self.scope, T::COLLECTION, None, text)
            .await
    }

    /// Atomically edit the first record matching `pred`.
    ///
    /// Returns the edited record, or `None` when nothing matched.
    pub async fn update_where<P, F, E>(&self, pred: P, mut f: F) -> Result<Option<T>, E>
    where
        P: Fn(&T) -> bool + Send + Sync,
        F: FnMut(&mut T) -> Result<(), E> + Send,
        E: From<StoreError>,
    {
        self.modify(|records| match records.iter_mut().find(|r| pred(r)) {
            Some(record) => {
                f(record)?;
                Ok(Some(record.clone()))
            }
            None => Ok(None),
        })
        .await
    }

    /// Atomically edit the record with the given id
    pub async fn update<F, E>(&self, id: &str, f: F) -> Result<Option<T>, E>
    where
        F: FnMut(&mut T) -> Result<(), E> + Send,
        E: From<StoreError>,
    {
        self.update_where(|r: &T| r.id() == id, f).await
    }

    /// Remove the record with the given id; returns whether it existed
    pub async fn remove(&self, id: &str) -> StoreResult<bool> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|r| r.id() != id);
            Ok::<_, StoreError>(records.len() != before)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counter {
        id: String,
        value: i64,
    }

    impl Record for Counter {
        const COLLECTION: &'static str = "counters";

        fn id(&self) -> &str {
            &self.id
        }
    }

    fn counters() -> (Arc<MemoryStore>, Collection<Counter>) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), Collection::new(store))
    }

    #[tokio::test]
    async fn test_insert_find_remove() {
        let (_, col) = counters();
        col.insert(Counter {
            id: "a".to_string(),
            value: 1,
        })
        .await
        .unwrap();

        assert_eq!(col.find("a").await.unwrap().map(|c| c.value), Some(1));
        assert!(col.find("b").await.unwrap().is_none());

        assert!(col.remove("a").await.unwrap());
        assert!(!col.remove("a").await.unwrap());
        assert!(col.all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_unknown_id_returns_none() {
        let (_, col) = counters();
        let result = col
            .update("missing", |c| {
                c.value += 1;
                Ok::<_, StoreError>(())
            })
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_error_aborts_write() {
        let (_, col) = counters();
        col.insert(Counter {
            id: "a".to_string(),
            value: 5,
        })
        .await
        .unwrap();

        let result = col
            .update("a", |c| {
                c.value = -1;
                Err(StoreError::Conflict("rejected".to_string()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(col.find("a").await.unwrap().unwrap().value, 5);
    }

    #[tokio::test]
    async fn test_malformed_collection_reads_empty_but_refuses_writes() {
        let (store, col) = counters();
        store
            .set(Scope::Persistent, "counters", "{oops".to_string())
            .await
            .unwrap();

        assert!(col.all().await.unwrap().is_empty());

        let result = col
            .insert(Counter {
                id: "a".to_string(),
                value: 1,
            })
            .await;
        assert!(matches!(result, Err(StoreError::Corrupt(_))));
        assert_eq!(
            store
                .get(Scope::Persistent, "counters")
                .await
                .unwrap()
                .as_deref(),
            Some("{oops")
        );
    }

    #[tokio::test]
    async fn test_seed_only_writes_once() {
        let (_, col) = counters();
        let first = vec![Counter {
            id: "a".to_string(),
            value: 1,
        }];
        assert!(col.seed(first).await.unwrap());
        assert!(!col.seed(Vec::new()).await.unwrap());
        assert_eq!(col.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let (_, col) = counters();
        col.insert(Counter {
            id: "a".to_string(),
            value: 0,
        })
        .await
        .unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let col = col.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..10 {
                    col.update("a", |c| {
                        c.value += 1;
                        Ok::<_, StoreError>(())
                    })
                    .await
                    .unwrap();
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(col.find("a").await.unwrap().unwrap().value, 80);
    }

    #[tokio::test]
    async fn test_session_scoped_collection() {
        let (store, _) = counters();
        let col: Collection<Counter> = Collection::in_scope(store.clone(), Scope::Session);
        col.insert(Counter {
            id: "a".to_string(),
            value: 1,
        })
        .await
        .unwrap();

        assert!(store.get(Scope::Persistent, "counters").await.unwrap().is_none());
        store.clear_scope(Scope::Session).await.unwrap();
        assert!(col.all().await.unwrap().is_empty());
    }
}
