//! Country-change hysteresis.
//!
//! Turns a stream of classified readings into a stable current country.
//! A change is only accepted when a quorum of the last `window_size`
//! readings agrees on a different country *and* at least `dwell_time` has
//! passed since the previous change.
//!
//! # Decision Order
//!
//! ```text
//! 1. buffer < window_size            -> no change
//! 2. majority (first-seen max wins)
//! 3. no current country              -> change (initial detection)
//! 4. majority == current             -> no change
//! 5. count >= min_matches AND dwell  -> change
//! ```
//!
//! # Ownership
//!
//! [`HysteresisState`] is a plain value. [`Hysteresis`] holds only the
//! configuration and exposes pure transitions that consume a state and
//! return the next one; the detector owns the single live state.

mod config;
mod decision;

pub use config::{HysteresisConfig, HysteresisConfigError};
pub use decision::{ChangeDecision, CountryChange, DecisionReason};

use std::collections::VecDeque;

use crate::coord::{haversine_m, GeoPoint};
use crate::country::CountryCode;
use crate::time::duration_millis;

/// One classified position.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub country: CountryCode,
    pub region: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    /// Fix time, epoch milliseconds.
    pub timestamp_ms: i64,
    pub accuracy_m: Option<f64>,
}

impl Reading {
    pub fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Live hysteresis state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HysteresisState {
    pub current_country: Option<CountryCode>,
    pub current_region: Option<String>,
    /// Epoch ms of the last applied change; 0 if never changed.
    pub last_change_ms: i64,
    /// Most recent readings, oldest first.
    pub buffer: VecDeque<Reading>,
    /// Position of the last accepted reading. Only used for movement gating.
    pub last_position: Option<GeoPoint>,
}

/// Pure transition functions over [`HysteresisState`].
#[derive(Debug, Clone, Default)]
pub struct Hysteresis {
    config: HysteresisConfig,
}

impl Hysteresis {
    pub fn new(config: HysteresisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HysteresisConfig {
        &self.config
    }

    /// Append a reading unless it is within `min_distance_m` of the last
    /// accepted one. The buffer keeps the newest `window_size` readings.
    pub fn add_reading(&self, mut state: HysteresisState, reading: Reading) -> HysteresisState {
        let position = reading.position();

        if let Some(last) = state.last_position {
            let moved = haversine_m(last, position);
            if moved < self.config.min_distance_m {
                tracing::trace!(
                    moved_m = moved,
                    min_m = self.config.min_distance_m,
                    "Reading discarded, not enough movement"
                );
                return state;
            }
        }

        state.buffer.push_back(reading);
        while state.buffer.len() > self.config.window_size {
            state.buffer.pop_front();
        }
        state.last_position = Some(position);
        state
    }

    /// Evaluate whether the buffered readings justify a country change at
    /// time `now_ms`. Never mutates the state.
    pub fn should_change_country(&self, state: &HysteresisState, now_ms: i64) -> ChangeDecision {
        let window = self.config.window_size;
        if state.buffer.len() < window {
            return ChangeDecision::hold(DecisionReason::BufferNotFull {
                have: state.buffer.len(),
                need: window,
            });
        }

        let Some((winner, count)) = majority(&state.buffer) else {
            return ChangeDecision::hold(DecisionReason::NoMajority);
        };
        let region = latest_region(&state.buffer, winner);

        let Some(current) = state.current_country else {
            return ChangeDecision::change(winner, region, DecisionReason::InitialDetection);
        };

        if winner == current {
            return ChangeDecision::hold(DecisionReason::SameCountry);
        }

        if count < self.config.min_matches {
            return ChangeDecision::hold(DecisionReason::InsufficientMatches {
                count,
                required: self.config.min_matches,
            });
        }

        let elapsed_ms = now_ms.saturating_sub(state.last_change_ms);
        let required_ms = duration_millis(self.config.dwell_time);
        if elapsed_ms < required_ms {
            return ChangeDecision::hold(DecisionReason::DwellTimeNotMet {
                elapsed_ms,
                required_ms,
            });
        }

        ChangeDecision::change(
            winner,
            region,
            DecisionReason::MajorityWithDwell { count, window },
        )
    }

    /// Commit a change: new current values, change time, empty buffer.
    pub fn apply_country_change(
        &self,
        mut state: HysteresisState,
        country: CountryCode,
        region: Option<String>,
        now_ms: i64,
    ) -> HysteresisState {
        tracing::info!(
            from = ?state.current_country.map(|c| c.to_string()),
            to = %country,
            region = ?region,
            "Country change applied"
        );

        state.current_country = Some(country);
        state.current_region = region;
        state.last_change_ms = now_ms;
        state.buffer.clear();
        state
    }

    /// A fresh state with no country and an empty buffer.
    pub fn reset(&self) -> HysteresisState {
        HysteresisState::default()
    }

    /// A fresh state pinned to `country`, as after a manual override.
    pub fn seed(
        &self,
        country: CountryCode,
        region: Option<String>,
        now_ms: i64,
    ) -> HysteresisState {
        HysteresisState {
            current_country: Some(country),
            current_region: region,
            last_change_ms: now_ms,
            ..HysteresisState::default()
        }
    }
}

/// Most frequent country in the buffer.
///
/// Counts accumulate in first-seen order and a later country must *exceed*
/// the running maximum to win, so ties go to the country seen first.
fn majority(buffer: &VecDeque<Reading>) -> Option<(CountryCode, usize)> {
    let mut counts: Vec<(CountryCode, usize)> = Vec::new();
    for reading in buffer {
        match counts.iter_mut().find(|(c, _)| *c == reading.country) {
            Some((_, n)) => *n += 1,
            None => counts.push((reading.country, 1)),
        }
    }

    let mut best: Option<(CountryCode, usize)> = None;
    for (country, n) in counts {
        if best.map_or(true, |(_, max)| n > max) {
            best = Some((country, n));
        }
    }
    best
}

/// Region of the newest buffered reading for `country` that has one.
fn latest_region(buffer: &VecDeque<Reading>, country: CountryCode) -> Option<String> {
    buffer
        .iter()
        .rev()
        .filter(|r| r.country == country)
        .find_map(|r| r.region.clone())
}
