//! Spatial TTL cache of resolved classifications.
//!
//! Positions are quantized to a level-5 geohash cell (roughly 4.9km square)
//! and stored under `geo:gh:5:<hash>` in a [`KeyValueStore`]. Any two
//! positions in the same cell share one entry.
//!
//! # Failure Policy
//!
//! `get` and `set` never surface errors: store failures, corrupt entries and
//! invalid coordinates are logged and treated as a miss (or a skipped
//! write). `try_get` / `try_set` expose the underlying [`CacheError`] for
//! callers that want it.
//!
//! # Expiry
//!
//! Expired entries are evicted lazily by `get` and in bulk by
//! [`SpatialCache::sweep_expired`], which the [`CacheSweeper`] runs on an
//! interval. Both use the same rule: an entry is valid strictly before
//! `timestamp + ttl`.

mod entry;
mod sweeper;

pub use entry::{CacheEntry, CacheValue};
pub use sweeper::CacheSweeper;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::{geohash_encode, CoordError};
use crate::store::{KeyValueStore, StoreError};
use crate::time::Clock;

/// Namespace prefix for every cache key.
pub const CACHE_KEY_PREFIX: &str = "geo:gh:5:";

/// Geohash length used for cache cells.
pub const CACHE_GEOHASH_PRECISION: usize = 5;

/// Default entry lifetime: 30 days.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(2_592_000);

/// Default interval between background sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Cache errors.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cannot derive cache key: {0}")]
    Key(#[from] CoordError),

    #[error("Failed to read '{key}': {source}")]
    Read {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to write '{key}': {source}")]
    Write {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to list cache keys: {0}")]
    List(#[source] StoreError),

    #[error("Corrupt entry '{key}': {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Failed to encode entry: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Lifetime of newly written entries.
    pub ttl: Duration,
    /// Interval between background sweeps.
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
        }
    }
}

impl CacheConfig {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}

/// Snapshot of cache contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Cache-namespaced keys in the store.
    pub total_entries: usize,
    /// Entries that parse and have not expired.
    pub valid_entries: usize,
    /// Entries that have expired or fail to parse.
    pub expired_entries: usize,
    /// Sum of serialized entry lengths.
    pub total_bytes: u64,
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entries ({} valid, {} expired), {:.1} KB",
            self.total_entries,
            self.valid_entries,
            self.expired_entries,
            self.total_bytes as f64 / 1024.0
        )
    }
}

/// Build the store key for a position.
pub fn cache_key(lat: f64, lng: f64) -> Result<String, CoordError> {
    let hash = geohash_encode(lat, lng, CACHE_GEOHASH_PRECISION)?;
    Ok(format!("{}{}", CACHE_KEY_PREFIX, hash))
}

fn ttl_secs(ttl: Duration) -> u64 {
    ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0)
}

/// Geohash-keyed TTL cache over a [`KeyValueStore`].
#[derive(Clone)]
pub struct SpatialCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SpatialCache {
    /// Create a cache with the default 30 day TTL.
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Override the TTL used by [`SpatialCache::set`].
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// TTL applied to new entries.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the cell containing `(lat, lng)`.
    ///
    /// Returns `None` on a miss, on expiry, and on any failure.
    pub async fn get(&self, lat: f64, lng: f64) -> Option<CacheValue> {
        match self.try_get(lat, lng).await {
            Ok(value) => value,
            Err(e) => {
                warn!(lat, lng, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Like [`SpatialCache::get`] but reports failures.
    ///
    /// Expired entries are evicted and reported as `Ok(None)`. Corrupt
    /// entries are evicted and reported as `CacheError::Corrupt`.
    pub async fn try_get(&self, lat: f64, lng: f64) -> Result<Option<CacheValue>, CacheError> {
        let key = cache_key(lat, lng)?;
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(source) => return Err(CacheError::Read { key, source }),
        };

        let entry: CacheEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                self.evict(&key).await;
                return Err(CacheError::Corrupt {
                    key,
                    reason: e.to_string(),
                });
            }
        };

        if entry.is_expired(self.clock.now_millis()) {
            debug!(key = %key, "Cache entry expired");
            self.evict(&key).await;
            return Ok(None);
        }

        debug!(key = %key, country = %entry.value.country, "Cache hit");
        Ok(Some(entry.value))
    }

    /// Store `value` for the cell containing `(lat, lng)` with the default TTL.
    ///
    /// Failures are logged and swallowed.
    pub async fn set(&self, lat: f64, lng: f64, value: CacheValue) {
        self.set_with_ttl(lat, lng, value, self.ttl).await;
    }

    /// Store with an explicit TTL. Failures are logged and swallowed.
    pub async fn set_with_ttl(&self, lat: f64, lng: f64, value: CacheValue, ttl: Duration) {
        if let Err(e) = self.try_set(lat, lng, value, ttl).await {
            warn!(lat, lng, error = %e, "Cache write failed");
        }
    }

    /// Store with an explicit TTL, reporting failures.
    ///
    /// Entries record whole seconds; a fractional TTL rounds up.
    pub async fn try_set(
        &self,
        lat: f64,
        lng: f64,
        value: CacheValue,
        ttl: Duration,
    ) -> Result<(), CacheError> {
        let key = cache_key(lat, lng)?;
        let entry = CacheEntry {
            value,
            timestamp: self.clock.now_millis(),
            ttl: ttl_secs(ttl),
        };
        let raw = serde_json::to_string(&entry)?;

        self.store
            .set(&key, raw)
            .await
            .map_err(|source| CacheError::Write { key, source })
    }

    /// Delete every expired or unparseable cache entry.
    ///
    /// Returns the number of entries removed. Keys outside the cache
    /// namespace are left alone.
    pub async fn sweep_expired(&self) -> usize {
        let keys = match self.cache_keys().await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(error = %e, "Cache sweep could not list keys");
                return 0;
            }
        };

        let now = self.clock.now_millis();
        let mut removed = 0;

        for key in keys {
            let stale = match self.store.get(&key).await {
                Ok(Some(raw)) => serde_json::from_str::<CacheEntry>(&raw)
                    .map(|entry| entry.is_expired(now))
                    .unwrap_or(true),
                // Vanished between list and read
                Ok(None) => false,
                Err(e) => {
                    warn!(key = %key, error = %e, "Cache sweep could not read entry");
                    false
                }
            };

            if stale {
                match self.store.remove(&key).await {
                    Ok(true) => removed += 1,
                    Ok(false) => {}
                    Err(e) => warn!(key = %key, error = %e, "Cache sweep could not remove entry"),
                }
            }
        }

        debug!(removed, "Cache sweep complete");
        removed
    }

    /// Delete every cache entry regardless of age.
    pub async fn clear_all(&self) -> Result<usize, CacheError> {
        let mut removed = 0;
        for key in self.cache_keys().await? {
            if self
                .store
                .remove(&key)
                .await
                .map_err(|source| CacheError::Write {
                    key: key.clone(),
                    source,
                })?
            {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Count entries by validity and total their size.
    pub async fn stats(&self) -> Result<CacheStats, CacheError> {
        let now = self.clock.now_millis();
        let mut stats = CacheStats::default();

        for key in self.cache_keys().await? {
            let raw = match self.store.get(&key).await {
                Ok(Some(raw)) => raw,
                Ok(None) => continue,
                Err(source) => return Err(CacheError::Read { key, source }),
            };

            stats.total_entries += 1;
            stats.total_bytes += raw.len() as u64;
            match serde_json::from_str::<CacheEntry>(&raw) {
                Ok(entry) if !entry.is_expired(now) => stats.valid_entries += 1,
                _ => stats.expired_entries += 1,
            }
        }

        Ok(stats)
    }

    async fn cache_keys(&self) -> Result<Vec<String>, CacheError> {
        let keys = self.store.list_keys().await.map_err(CacheError::List)?;
        Ok(keys
            .into_iter()
            .filter(|k| k.starts_with(CACHE_KEY_PREFIX))
            .collect())
    }

    async fn evict(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!(key = %key, error = %e, "Failed to evict cache entry");
        }
    }
}
