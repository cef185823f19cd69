//! Background expiry daemon.
//!
//! Runs [`SpatialCache::sweep_expired`] once at startup and then on a fixed
//! interval, on its own task, until shut down. The detection hot path never
//! waits on it.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::SpatialCache;

/// Handle to a running sweep daemon.
pub struct CacheSweeper {
    shutdown: CancellationToken,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl CacheSweeper {
    /// Spawn the daemon on the current tokio runtime.
    ///
    /// The daemon also stops when `parent` is cancelled.
    pub fn start(cache: SpatialCache, interval: Duration, parent: &CancellationToken) -> Self {
        let shutdown = parent.child_token();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            run_sweep_daemon(cache, interval, token).await;
        });

        Self {
            shutdown,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Stop the daemon and wait for any in-progress sweep to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();

        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Whether the daemon task has exited.
    pub fn is_finished(&self) -> bool {
        self.handle
            .lock()
            .as_ref()
            .map(|h| h.is_finished())
            .unwrap_or(true)
    }
}

async fn run_sweep_daemon(cache: SpatialCache, interval: Duration, shutdown: CancellationToken) {
    info!(interval_secs = interval.as_secs(), "Cache sweep daemon started");

    let removed = cache.sweep_expired().await;
    if removed > 0 {
        info!(removed, "Initial cache sweep removed expired entries");
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Cache sweep daemon shutting down");
                break;
            }
            _ = tokio::time::sleep(interval) => {
                let removed = cache.sweep_expired().await;
                if removed > 0 {
                    info!(removed, "Cache sweep removed expired entries");
                }
            }
        }
    }
}
