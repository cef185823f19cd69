//! On-disk store, one file per key.
//!
//! # File Layout
//!
//! ```text
//! {dir}/{hex(key)}.entry
//! ```
//!
//! Keys are hex-encoded so any key maps to a filename that is valid on every
//! platform and can be decoded back for `list_keys`. Values are written to a
//! uniquely named `.tmp` sibling and renamed over the target, so readers only
//! ever observe a complete value.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, warn};

use super::{BoxFuture, KeyValueStore, StoreError};

const ENTRY_EXTENSION: &str = "entry";
const TEMP_EXTENSION: &str = "tmp";

/// Longest key we accept; hex doubles it, keeping filenames under 255 bytes.
pub const MAX_KEY_LEN: usize = 120;

/// Directory-backed key-value store.
pub struct DiskStore {
    directory: PathBuf,
    temp_counter: AtomicU64,
}

impl DiskStore {
    /// Open a store rooted at `directory`, creating it if needed.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;
        debug!(dir = %directory.display(), "Disk store opened");
        Ok(Self {
            directory,
            temp_counter: AtomicU64::new(0),
        })
    }

    /// Root directory of the store.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        if key.is_empty() || key.len() > MAX_KEY_LEN {
            return Err(StoreError::InvalidKey {
                key: key.to_string(),
                reason: format!("length must be between 1 and {} bytes", MAX_KEY_LEN),
            });
        }
        Ok(self
            .directory
            .join(format!("{}.{}", hex_encode(key), ENTRY_EXTENSION)))
    }

    fn temp_path(&self, entry: &Path) -> PathBuf {
        let n = self.temp_counter.fetch_add(1, Ordering::Relaxed);
        entry.with_extension(format!("{}.{}.{}", std::process::id(), n, TEMP_EXTENSION))
    }
}

impl KeyValueStore for DiskStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<String>, StoreError>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            match tokio::fs::read_to_string(path?).await {
                Ok(value) => Ok(Some(value)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn set(&self, key: &str, value: String) -> BoxFuture<'_, Result<(), StoreError>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            let path = path?;
            let temp = self.temp_path(&path);

            tokio::fs::write(&temp, value.as_bytes()).await?;
            if let Err(e) = tokio::fs::rename(&temp, &path).await {
                let _ = tokio::fs::remove_file(&temp).await;
                return Err(e.into());
            }
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let path = self.entry_path(key);
        Box::pin(async move {
            match tokio::fs::remove_file(path?).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn list_keys(&self) -> BoxFuture<'_, Result<Vec<String>, StoreError>> {
        Box::pin(async move {
            let mut keys = Vec::new();
            let mut entries = tokio::fs::read_dir(&self.directory).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                    continue;
                }
                let decoded = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .and_then(hex_decode);
                match decoded {
                    Some(key) => keys.push(key),
                    None => warn!(path = %path.display(), "Skipping unrecognised store file"),
                }
            }

            Ok(keys)
        })
    }
}

fn hex_encode(key: &str) -> String {
    key.bytes().map(|b| format!("{:02x}", b)).collect()
}

fn hex_decode(name: &str) -> Option<String> {
    if name.len() % 2 != 0 {
        return None;
    }
    let bytes = (0..name.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(name.get(i..i + 2)?, 16).ok())
        .collect::<Option<Vec<u8>>>()?;
    String::from_utf8(bytes).ok()
}
