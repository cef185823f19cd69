//! Persistent key-value storage backing the spatial cache.
//!
//! The `KeyValueStore` trait is deliberately small: string keys, string
//! values, whole-value replacement. Each `set` lands atomically, so two
//! writers racing on the same key leave one complete value behind (last
//! write wins) and never a torn one.
//!
//! # Providers
//!
//! - [`MemoryStore`]: moka-backed, process-local. Used in tests and for
//!   sessions that don't need persistence.
//! - [`DiskStore`]: one file per key under a directory, written through a
//!   temp file and renamed into place.
//!
//! # Dyn Compatibility
//!
//! Async methods return `Pin<Box<dyn Future>>` so the cache can hold an
//! `Arc<dyn KeyValueStore>` and callers pick the backend at runtime.

mod disk;
mod memory;

pub use disk::DiskStore;
pub use memory::MemoryStore;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors raised by storage providers.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error from a disk-backed store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key cannot be represented by this provider.
    #[error("Invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    /// Provider-specific error.
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Asynchronous string key-value store.
///
/// All implementations must be `Send + Sync` for use across async tasks.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key does not exist.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Delete `key`.
    ///
    /// Returns `Ok(true)` if the key existed.
    fn remove(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Enumerate every key currently in the store, in no particular order.
    fn list_keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>>;
}
