//! In-memory store using moka.
//!
//! Moka gives lock-free reads and bounded capacity; once `max_entries` is
//! exceeded the least recently used keys are evicted, which for a cache of
//! resolved cells is the same as a miss.

use moka::future::Cache as MokaCache;

use super::{BoxFuture, KeyValueStore, StoreError};

/// Default capacity: comfortably more level-5 cells than a long road trip
/// touches.
pub const DEFAULT_MAX_ENTRIES: u64 = 100_000;

/// In-memory key-value store.
pub struct MemoryStore {
    cache: MokaCache<String, String>,
}

impl MemoryStore {
    /// Create a store bounded to `max_entries` keys.
    pub fn new(max_entries: u64) -> Self {
        Self {
            cache: MokaCache::builder().max_capacity(max_entries).build(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ENTRIES)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.get(&key).await) })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            self.cache.insert(key, value).await;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let key = key.to_string();
        Box::pin(async move { Ok(self.cache.remove(&key).await.is_some()) })
    }

    fn list_keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            self.cache.run_pending_tasks().await;
            Ok(self.cache.iter().map(|(k, _)| (*k).clone()).collect())
        })
    }
}
