//! Per-key memoized fetches
//!
//! Every collection a screen shows is keyed by its parent id (topics by
//! class, materials by topic, files by task, ...). Each key is fetched
//! until one fetch succeeds, then kept until it is invalidated; callers
//! that arrive while a fetch is pending wait on it instead of issuing
//! their own.

use crate::error::Result;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Memoized values keyed by parent id.
///
/// A key holds a cell that is created before the fetch starts, so
/// concurrent `ensure_loaded` calls for the same key share one fetch.
pub struct EntityCache<K, V> {
    entries: Mutex<HashMap<K, Arc<OnceCell<V>>>>,
}

/// Cache of child collections
pub type CollectionCache<K, T> = EntityCache<K, Arc<Vec<T>>>;

impl<K, V> Default for EntityCache<K, V> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<K, V> EntityCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached value, if the key has finished loading
    pub fn get(&self, key: &K) -> Option<V> {
        let cell = self.entries.lock().get(key).cloned()?;
        cell.get().cloned()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Return the cached value or run `fetcher` to fill it.
    ///
    /// A failed fetch leaves the entry empty, so the next call fetches
    /// again. A caller waiting on a fetch that fails runs its own.
    pub async fn ensure_loaded<F, Fut>(&self, key: K, fetcher: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        let cell = {
            let mut entries = self.entries.lock();
            entries
                .entry(key.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        if let Some(value) = cell.get() {
            tracing::debug!("Cache hit for {:?}", key);
            return Ok(value.clone());
        }

        let key_ref = &key;
        let value = cell
            .get_or_try_init(move || async move {
                tracing::debug!("Cache miss for {:?}, fetching", key_ref);
                fetcher().await
            })
            .await?;
        Ok(value.clone())
    }

    /// Like `ensure_loaded`, but a failed fetch stores the default value.
    ///
    /// The error is still returned; the empty entry stays until it is
    /// invalidated.
    pub async fn ensure_loaded_or_default<F, Fut>(&self, key: K, fetcher: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        match self.ensure_loaded(key.clone(), fetcher).await {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::debug!("Caching empty value for {:?} after failure", key);
                self.put(key, V::default());
                Err(e)
            }
        }
    }

    /// Store a value fetched elsewhere, replacing any cached one
    pub fn put(&self, key: K, value: V) {
        let cell = Arc::new(OnceCell::new_with(Some(value)));
        self.entries.lock().insert(key, cell);
    }

    /// Drop one entry; returns whether it existed
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    pub fn invalidate_many<'a>(&self, keys: impl IntoIterator<Item = &'a K>)
    where
        K: 'a,
    {
        let mut entries = self.entries.lock();
        for key in keys {
            entries.remove(key);
        }
    }

    /// Keys with an entry, loaded or pending
    pub fn keys(&self) -> Vec<K> {
        self.entries.lock().keys().cloned().collect()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl<K, T> EntityCache<K, Arc<Vec<T>>>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
{
    /// Cached collection, or an empty one on a miss
    pub fn list(&self, key: &K) -> Arc<Vec<T>> {
        let cell = self.entries.lock().get(key).cloned();
        cell.and_then(|c| c.get().cloned()).unwrap_or_default()
    }
}
