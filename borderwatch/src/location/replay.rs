//! Recorded-track playback.
//!
//! # Track Format
//!
//! One fix per line, comma separated:
//!
//! ```text
//! # timestamp_ms,latitude,longitude[,accuracy_m]
//! 1700000000000,-33.4489,-70.6693,12.0
//! 1700000010000,-33.4400,-70.6500
//! ```
//!
//! Blank lines and lines starting with `#` are ignored, as is a first line
//! whose first field is not a number (a CSV header).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::{
    FixFilter, LocationError, LocationEvent, LocationProvider, LocationSubscription, PositionFix,
    WatchOptions,
};
use crate::coord::GeoPoint;

/// Plays back a recorded track as a location stream.
#[derive(Debug, Clone)]
pub struct ReplayProvider {
    fixes: Arc<Vec<PositionFix>>,
    speed: f64,
}

impl ReplayProvider {
    /// Provider over in-memory fixes, delivered without delay.
    pub fn new(fixes: Vec<PositionFix>) -> Self {
        Self {
            fixes: Arc::new(fixes),
            speed: 0.0,
        }
    }

    /// Parse a track from text.
    pub fn parse(text: &str) -> Result<Self, LocationError> {
        let mut fixes = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match parse_line(line) {
                Ok(fix) => fixes.push(fix),
                // Tolerate a header row
                Err(_) if fixes.is_empty() && is_header(line) => continue,
                Err(reason) => {
                    return Err(LocationError::InvalidTrack {
                        line: idx + 1,
                        reason,
                    })
                }
            }
        }

        Ok(Self::new(fixes))
    }

    /// Load a track file.
    pub async fn load(path: &Path) -> Result<Self, LocationError> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::parse(&text)
    }

    /// Playback speed relative to the recorded timestamps.
    ///
    /// `1.0` is real time, `60.0` plays an hour in a minute, and `0.0` (the
    /// default) delivers as fast as the consumer reads.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = if speed.is_finite() && speed > 0.0 {
            speed
        } else {
            0.0
        };
        self
    }

    pub fn fixes(&self) -> &[PositionFix] {
        &self.fixes
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    fn delay_between(&self, from_ms: i64, to_ms: i64) -> Duration {
        if self.speed <= 0.0 || to_ms <= from_ms {
            return Duration::ZERO;
        }
        Duration::from_secs_f64((to_ms - from_ms) as f64 / 1000.0 / self.speed)
    }
}

impl LocationProvider for ReplayProvider {
    fn start(
        &self,
        options: WatchOptions,
        tx: mpsc::Sender<LocationEvent>,
    ) -> Result<LocationSubscription, LocationError> {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let provider = self.clone();

        let handle = tokio::spawn(async move {
            let mut filter = FixFilter::new(options);
            let mut previous: Option<i64> = None;
            let mut delivered = 0usize;

            for fix in provider.fixes.iter() {
                if !filter.accept(fix) {
                    continue;
                }

                let delay = previous
                    .map(|prev| provider.delay_between(prev, fix.timestamp_ms))
                    .unwrap_or(Duration::ZERO);
                previous = Some(fix.timestamp_ms);

                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(delivered, "Replay cancelled");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }

                tokio::select! {
                    _ = token.cancelled() => {
                        debug!(delivered, "Replay cancelled");
                        return;
                    }
                    sent = tx.send(LocationEvent::Fix(*fix)) => {
                        if sent.is_err() {
                            debug!(delivered, "Replay receiver closed");
                            return;
                        }
                    }
                }
                delivered += 1;
            }

            info!(delivered, total = provider.fixes.len(), "Replay finished");
        });

        Ok(LocationSubscription::new(cancel, handle))
    }
}

fn parse_line(line: &str) -> Result<PositionFix, String> {
    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    if !(3..=4).contains(&fields.len()) {
        return Err(format!("expected 3 or 4 fields, found {}", fields.len()));
    }

    let timestamp_ms = fields[0]
        .parse::<i64>()
        .map_err(|e| format!("timestamp '{}': {}", fields[0], e))?;
    let latitude = parse_f64("latitude", fields[1])?;
    let longitude = parse_f64("longitude", fields[2])?;
    GeoPoint::try_new(latitude, longitude).map_err(|e| e.to_string())?;

    let accuracy_m = match fields.get(3) {
        Some(v) if !v.is_empty() => Some(parse_f64("accuracy", v)?),
        _ => None,
    };

    Ok(PositionFix {
        latitude,
        longitude,
        accuracy_m,
        timestamp_ms,
    })
}

fn parse_f64(name: &str, value: &str) -> Result<f64, String> {
    value
        .parse::<f64>()
        .map_err(|e| format!("{} '{}': {}", name, value, e))
}

fn is_header(line: &str) -> bool {
    line.split(',')
        .next()
        .map(|first| first.trim().parse::<f64>().is_err())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = "\
timestamp_ms,latitude,longitude,accuracy_m
# Santiago eastbound
1700000000000,-33.4489,-70.6693,12.0

1700000010000,-33.4400,-70.6500
1700000020000,-33.4300,-70.6300,8
";

    fn zero_options() -> WatchOptions {
        WatchOptions::default()
            .with_interval(Duration::ZERO)
            .with_min_distance_m(0.0)
    }

    #[test]
    fn test_parse_track() {
        let provider = ReplayProvider::parse(TRACK).unwrap();
        assert_eq!(provider.len(), 3);

        let first = provider.fixes()[0];
        assert_eq!(first.timestamp_ms, 1_700_000_000_000);
        assert_eq!(first.accuracy_m, Some(12.0));
        assert_eq!(provider.fixes()[1].accuracy_m, None);
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = ReplayProvider::parse("1,0,0\n2,abc,0\n").unwrap_err();
        match err {
            LocationError::InvalidTrack { line, reason } => {
                assert_eq!(line, 2);
                assert!(reason.contains("latitude"), "reason: {}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_out_of_range() {
        assert!(ReplayProvider::parse("1,95.0,0").is_err());
        assert!(ReplayProvider::parse("1,0").is_err());
    }

    #[test]
    fn test_header_only_allowed_first() {
        assert!(ReplayProvider::parse("1,0,0\nts,lat,lng\n").is_err());
    }

    #[test]
    fn test_speed_scaling() {
        let provider = ReplayProvider::new(vec![]).with_speed(10.0);
        assert_eq!(provider.delay_between(0, 10_000), Duration::from_secs(1));
        assert_eq!(provider.delay_between(10_000, 0), Duration::ZERO);

        let instant = ReplayProvider::new(vec![]).with_speed(f64::NAN);
        assert_eq!(instant.delay_between(0, 10_000), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_replay_delivers_all_then_closes() {
        let provider = ReplayProvider::parse(TRACK).unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        let _subscription = provider.start(zero_options(), tx).unwrap();

        let mut timestamps = Vec::new();
        while let Some(event) = rx.recv().await {
            match event {
                LocationEvent::Fix(fix) => timestamps.push(fix.timestamp_ms),
                LocationEvent::Error(e) => panic!("unexpected error {}", e),
            }
        }
        assert_eq!(
            timestamps,
            vec![1_700_000_000_000, 1_700_000_010_000, 1_700_000_020_000]
        );
    }

    #[tokio::test]
    async fn test_replay_applies_watch_options() {
        let provider = ReplayProvider::parse(TRACK).unwrap();
        let (tx, mut rx) = mpsc::channel(8);

        let options = WatchOptions::default().with_interval(Duration::from_secs(15));
        let _subscription = provider.start(options, tx).unwrap();

        let mut count = 0;
        while rx.recv().await.is_some() {
            count += 1;
        }
        assert_eq!(count, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_replay_stop_mid_track() {
        let provider = ReplayProvider::parse(TRACK).unwrap().with_speed(1.0);
        let (tx, mut rx) = mpsc::channel(8);

        let subscription = provider.start(zero_options(), tx).unwrap();
        assert!(matches!(rx.recv().await, Some(LocationEvent::Fix(_))));

        subscription.stop().await;
        assert!(rx.recv().await.is_none());
    }
}
