//! Serialized cache entry format.
//!
//! Each entry is one JSON document:
//!
//! ```text
//! {"value":{"country":"CL","region":"RM"},"timestamp":1700000000000,"ttl":2592000}
//! ```
//!
//! `timestamp` is the creation time in epoch milliseconds and `ttl` is in
//! seconds.

use serde::{Deserialize, Serialize};

use crate::country::CountryCode;

/// A resolved classification for one spatial cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheValue {
    pub country: CountryCode,
    #[serde(default)]
    pub region: Option<String>,
}

impl CacheValue {
    pub fn new(country: CountryCode, region: Option<String>) -> Self {
        Self { country, region }
    }
}

/// Stored entry: the value plus its creation time and lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub value: CacheValue,
    /// Creation time, epoch milliseconds.
    pub timestamp: i64,
    /// Lifetime in seconds.
    pub ttl: u64,
}

impl CacheEntry {
    /// Instant (epoch ms) from which the entry is no longer valid.
    pub fn expires_at(&self) -> i64 {
        let ttl_ms = i64::try_from(self.ttl)
            .unwrap_or(i64::MAX)
            .saturating_mul(1000);
        self.timestamp.saturating_add(ttl_ms)
    }

    /// Valid strictly before `expires_at`, expired from it onward.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at()
    }
}
