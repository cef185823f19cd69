//! Location provider interface.
//!
//! A provider pushes [`LocationEvent`]s into a tokio channel until its
//! [`LocationSubscription`] is stopped. Delivery is throttled by
//! [`WatchOptions`]: a fix is only emitted once both the interval has
//! elapsed and the device has moved far enough.

mod filter;
mod replay;

pub use filter::FixFilter;
pub use replay::ReplayProvider;

use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::coord::GeoPoint;

/// Default minimum time between emitted fixes.
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(10);

/// Default minimum movement between emitted fixes.
pub const DEFAULT_WATCH_MIN_DISTANCE_M: f64 = 100.0;

/// One raw position from the platform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub latitude: f64,
    pub longitude: f64,
    /// Horizontal accuracy radius; `None` when the platform doesn't report it.
    pub accuracy_m: Option<f64>,
    /// Fix time, epoch milliseconds.
    pub timestamp_ms: i64,
}

impl PositionFix {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Location errors.
#[derive(Debug, Error)]
pub enum LocationError {
    /// The user or platform refused location access. Ends the session.
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid track at line {line}: {reason}")]
    InvalidTrack { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Item delivered by a provider.
#[derive(Debug)]
pub enum LocationEvent {
    Fix(PositionFix),
    Error(LocationError),
}

/// Delivery throttling.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchOptions {
    pub interval: Duration,
    pub min_distance_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WATCH_INTERVAL,
            min_distance_m: DEFAULT_WATCH_MIN_DISTANCE_M,
        }
    }
}

impl WatchOptions {
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_min_distance_m(mut self, min_distance_m: f64) -> Self {
        self.min_distance_m = min_distance_m;
        self
    }
}

/// Source of position fixes.
pub trait LocationProvider: Send + Sync {
    /// Begin delivering events into `tx`.
    ///
    /// Must be called from within a tokio runtime.
    fn start(
        &self,
        options: WatchOptions,
        tx: mpsc::Sender<LocationEvent>,
    ) -> Result<LocationSubscription, LocationError>;
}

/// Running delivery task. Dropping it cancels delivery.
pub struct LocationSubscription {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl LocationSubscription {
    pub fn new(cancel: CancellationToken, handle: JoinHandle<()>) -> Self {
        Self {
            cancel,
            handle: Some(handle),
        }
    }

    /// Stop delivery and wait for the provider task to exit.
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }
}

impl Drop for LocationSubscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_options_defaults() {
        let options = WatchOptions::default();
        assert_eq!(options.interval, Duration::from_secs(10));
        assert_eq!(options.min_distance_m, 100.0);

        let custom = options
            .with_interval(Duration::from_secs(1))
            .with_min_distance_m(0.0);
        assert_eq!(custom.interval, Duration::from_secs(1));
        assert_eq!(custom.min_distance_m, 0.0);
    }

    #[test]
    fn test_permission_denied_message() {
        assert_eq!(
            LocationError::PermissionDenied.to_string(),
            "Location permission denied"
        );
    }

    #[tokio::test]
    async fn test_subscription_stop_cancels_task() {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let handle = tokio::spawn(async move { token.cancelled().await });

        let subscription = LocationSubscription::new(cancel, handle);
        assert!(!subscription.is_finished());
        subscription.stop().await;
    }
}
