//! Interval and distance throttling for raw fixes.

use super::{PositionFix, WatchOptions};
use crate::coord::haversine_m;
use crate::time::duration_millis;

/// Passes a fix only when both the interval has elapsed and the position has
/// moved at least `min_distance_m` since the last fix it passed.
#[derive(Debug, Clone)]
pub struct FixFilter {
    options: WatchOptions,
    last: Option<PositionFix>,
}

impl FixFilter {
    pub fn new(options: WatchOptions) -> Self {
        Self {
            options,
            last: None,
        }
    }

    /// Whether `fix` should be delivered. Records it if so.
    pub fn accept(&mut self, fix: &PositionFix) -> bool {
        if let Some(last) = &self.last {
            let elapsed = fix.timestamp_ms.saturating_sub(last.timestamp_ms);
            if elapsed < duration_millis(self.options.interval) {
                return false;
            }
            if haversine_m(last.position(), fix.position()) < self.options.min_distance_m {
                return false;
            }
        }
        self.last = Some(*fix);
        true
    }
}
