//! Geo detection orchestrator.
//!
//! Runs every position fix through the classification pipeline and feeds
//! the result to the hysteresis state machine:
//!
//! ```text
//! fix ─► accuracy gate ─► cache ─hit─────────────────────────┐
//!                          │ miss                            │
//!                          ▼                                 ▼
//!                     bbox candidates ─trusted─► cache write ─► hysteresis ─► publish
//!                          │ ambiguous              ▲
//!                          ▼                        │
//!                  precise resolver (timeout) ──────┘
//! ```
//!
//! The detector owns the only live [`HysteresisState`]. Fixes are processed
//! one at a time to completion; the state is only replaced after the last
//! suspension point of a fix, so dropping an in-flight fix (cancellation,
//! timeout) leaves it untouched.
//!
//! Host-visible state is published through a `tokio::sync::watch` channel.

mod error;
mod state;

pub use error::DetectionError;
pub use state::{ClassificationSource, DebugInfo, DetectionState};

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::bbox::BBoxIndex;
use crate::border::BorderPolicy;
use crate::cache::{CacheValue, SpatialCache};
use crate::config::DetectorConfig;
use crate::coord::GeoPoint;
use crate::country::CountryCode;
use crate::hysteresis::{ChangeDecision, Hysteresis, HysteresisState, Reading};
use crate::location::{LocationError, LocationEvent, LocationProvider, PositionFix, WatchOptions};
use crate::resolver::PreciseResolver;
use crate::time::Clock;

/// Host instructions delivered alongside location events.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectorCommand {
    /// Pin the stable country, bypassing quorum and dwell. `None` resets.
    Override {
        country: Option<CountryCode>,
        region: Option<String>,
    },
    /// Forget everything and start over.
    Reset,
}

/// Result of one successfully classified fix.
#[derive(Debug, Clone, PartialEq)]
pub struct FixOutcome {
    pub reading: Reading,
    pub source: ClassificationSource,
    pub decision: ChangeDecision,
}

/// Per-session detection pipeline.
pub struct GeoDetector {
    config: DetectorConfig,
    cache: SpatialCache,
    policy: BorderPolicy,
    resolver: Arc<dyn PreciseResolver>,
    clock: Arc<dyn Clock>,
    hysteresis: Hysteresis,
    state: HysteresisState,
    /// Last classified fix timestamp minus the clock reading at that moment.
    fix_clock_offset_ms: Option<i64>,
    /// An override happened before any fix; anchor its dwell to the next one.
    anchor_override: bool,
    published: watch::Sender<DetectionState>,
}

impl GeoDetector {
    /// Create a detector over the built-in bounding-box table.
    pub fn new(
        config: DetectorConfig,
        cache: SpatialCache,
        resolver: Arc<dyn PreciseResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policy = BorderPolicy::new(Arc::new(BBoxIndex::builtin()))
            .with_threshold_km(config.near_border_km);
        let hysteresis = Hysteresis::new(config.hysteresis.clone());
        let (published, _) = watch::channel(DetectionState::default());

        Self {
            config,
            cache,
            policy,
            resolver,
            clock,
            hysteresis,
            state: HysteresisState::default(),
            fix_clock_offset_ms: None,
            anchor_override: false,
            published,
        }
    }

    /// Replace the border policy (custom bbox table or threshold).
    pub fn with_policy(mut self, policy: BorderPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Receiver for host state updates.
    pub fn subscribe(&self) -> watch::Receiver<DetectionState> {
        self.published.subscribe()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> DetectionState {
        self.published.borrow().clone()
    }

    pub fn hysteresis_state(&self) -> &HysteresisState {
        &self.state
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Run one fix through the pipeline.
    ///
    /// Rejected and dropped fixes publish their error and return it; they
    /// never touch the hysteresis state.
    pub async fn process_fix(&mut self, fix: PositionFix) -> Result<FixOutcome, DetectionError> {
        self.published.send_modify(|s| s.is_detecting = true);

        if let Some(accuracy) = fix.accuracy_m {
            if !accuracy.is_finite() || accuracy > self.config.min_accuracy_m {
                let err = DetectionError::LowAccuracy {
                    accuracy_m: accuracy,
                    limit_m: self.config.min_accuracy_m,
                };
                debug!(accuracy_m = accuracy, "Fix rejected: {}", err);
                self.publish_error(&err, fix.accuracy_m);
                return Err(err);
            }
        }

        if let Err(e) = GeoPoint::try_new(fix.latitude, fix.longitude) {
            let err = DetectionError::from(e);
            self.publish_error(&err, fix.accuracy_m);
            return Err(err);
        }

        let (value, source) = match self.classify(&fix).await {
            Ok(classified) => classified,
            Err(err) => {
                warn!(
                    lat = fix.latitude,
                    lng = fix.longitude,
                    error = %err,
                    "Fix dropped"
                );
                self.published.send_modify(|s| {
                    s.is_detecting = false;
                    s.error = Some(err.to_string());
                    s.accuracy = fix.accuracy_m;
                    s.debug.cache_hit = false;
                    s.debug.used_precise = true;
                });
                return Err(err);
            }
        };

        let reading = Reading {
            country: value.country,
            region: value.region,
            latitude: fix.latitude,
            longitude: fix.longitude,
            timestamp_ms: fix.timestamp_ms,
            accuracy_m: fix.accuracy_m,
        };

        // No suspension points from here on
        let now = fix.timestamp_ms;
        self.fix_clock_offset_ms = Some(now.saturating_sub(self.clock.now_millis()));
        let mut state = std::mem::take(&mut self.state);
        if std::mem::take(&mut self.anchor_override) {
            state.last_change_ms = now;
        }
        let state = self.hysteresis.add_reading(state, reading.clone());
        let decision = self.hysteresis.should_change_country(&state, now);

        debug!(
            country = %reading.country,
            source = %source,
            buffer = state.buffer.len(),
            reason = %decision.reason,
            "Fix classified"
        );

        self.state = match &decision.change {
            Some(change) => self.hysteresis.apply_country_change(
                state,
                change.country,
                change.region.clone(),
                now,
            ),
            None => state,
        };

        let near_border = decision
            .change
            .as_ref()
            .map(|c| self.policy.is_near_border(fix.latitude, fix.longitude, c.country));
        let buffer_size = self.state.buffer.len();
        let current_country = self.state.current_country;
        let current_region = self.state.current_region.clone();
        let last_reading = reading.clone();

        self.published.send_modify(|s| {
            if let Some(near) = near_border {
                s.current_country = current_country;
                s.current_region = current_region;
                s.is_near_border = near;
            }
            s.is_detecting = false;
            s.error = None;
            s.accuracy = fix.accuracy_m;
            s.debug = DebugInfo {
                last_reading: Some(last_reading),
                buffer_size,
                cache_hit: source == ClassificationSource::Cache,
                used_precise: source == ClassificationSource::Precise,
            };
        });

        Ok(FixOutcome {
            reading,
            source,
            decision,
        })
    }

    /// Cache, then bounding boxes, then the precise resolver.
    async fn classify(
        &self,
        fix: &PositionFix,
    ) -> Result<(CacheValue, ClassificationSource), DetectionError> {
        let (lat, lng) = (fix.latitude, fix.longitude);

        if let Some(value) = self.cache.get(lat, lng).await {
            return Ok((value, ClassificationSource::Cache));
        }

        let candidates = self.policy.index().candidates(lat, lng);
        if let [only] = candidates.as_slice() {
            if !self.policy.needs_precise_resolution(lat, lng, &candidates) {
                let value = CacheValue::new(*only, None);
                self.cache.set(lat, lng, value.clone()).await;
                return Ok((value, ClassificationSource::BoundingBox));
            }
        }

        debug!(lat, lng, candidates = candidates.len(), "Using precise resolution");
        let timeout = self.config.resolve_timeout;
        let resolution = tokio::time::timeout(timeout, self.resolver.resolve(lat, lng))
            .await
            .map_err(|_| DetectionError::PreciseResolutionTimeout(timeout))??;

        let value = CacheValue::new(resolution.country, resolution.region);
        self.cache.set(lat, lng, value.clone()).await;
        Ok((value, ClassificationSource::Precise))
    }

    /// Current time on the fix timestamp timeline.
    ///
    /// Dwell is measured between fix timestamps, so host-side events are
    /// mapped onto that timeline through the offset seen on the last fix.
    /// `None` until a fix has been classified.
    fn fix_time_now(&self) -> Option<i64> {
        self.fix_clock_offset_ms
            .map(|offset| self.clock.now_millis().saturating_add(offset))
    }

    /// Pin the stable country. `None` is equivalent to [`GeoDetector::reset`].
    ///
    /// Dwell for the next change counts from the override, expressed in fix
    /// time. Before any fix has been seen it counts from the next fix.
    pub fn override_country(&mut self, country: Option<CountryCode>, region: Option<String>) {
        let Some(country) = country else {
            self.reset();
            return;
        };

        let (now, anchor_override) = match self.fix_time_now() {
            Some(now) => (now, false),
            None => (self.clock.now_millis(), true),
        };
        self.anchor_override = anchor_override;

        info!(country = %country, region = ?region, "Manual country override");
        self.state = self.hysteresis.seed(country, region.clone(), now);

        self.published.send_modify(|s| {
            s.current_country = Some(country);
            s.current_region = region;
            s.is_near_border = false;
            s.error = None;
            s.debug.buffer_size = 0;
        });
    }

    /// Drop all hysteresis state and published values.
    pub fn reset(&mut self) {
        info!("Detector reset");
        self.state = self.hysteresis.reset();
        self.anchor_override = false;
        self.published.send_replace(DetectionState::default());
    }

    /// Apply a host command.
    pub fn apply_command(&mut self, command: DetectorCommand) {
        match command {
            DetectorCommand::Override { country, region } => self.override_country(country, region),
            DetectorCommand::Reset => self.reset(),
        }
    }

    /// Publish a provider error. Permission denial is returned as fatal.
    pub fn handle_location_error(&mut self, error: LocationError) -> Result<(), DetectionError> {
        let err = DetectionError::from(error);
        warn!(error = %err, "Location provider error");
        self.published.send_modify(|s| {
            s.is_detecting = false;
            s.error = Some(err.to_string());
        });

        if err.is_fatal() {
            Err(err)
        } else {
            Ok(())
        }
    }

    /// Consume location events and host commands until cancelled or the
    /// location stream ends.
    ///
    /// Returns `Err(PermissionDenied)` if the provider reports it. All other
    /// per-fix errors are published and the loop continues. State survives
    /// the call, so a later `run` resumes with the existing buffer.
    pub async fn run(
        &mut self,
        mut locations: mpsc::Receiver<LocationEvent>,
        mut commands: mpsc::Receiver<DetectorCommand>,
        cancel: CancellationToken,
    ) -> Result<(), DetectionError> {
        let mut commands_open = true;
        info!("Geo detection started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                command = commands.recv(), if commands_open => match command {
                    Some(command) => self.apply_command(command),
                    None => commands_open = false,
                },

                event = locations.recv() => match event {
                    Some(LocationEvent::Fix(fix)) => {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            result = self.process_fix(fix) => {
                                if let Err(e) = result {
                                    debug!(error = %e, "Fix not used");
                                }
                            }
                        }
                    }
                    Some(LocationEvent::Error(e)) => self.handle_location_error(e)?,
                    None => {
                        info!("Location stream ended");
                        break;
                    }
                },
            }
        }

        self.published.send_modify(|s| s.is_detecting = false);
        info!("Geo detection stopped");
        Ok(())
    }

    /// Start `provider`, run until cancelled or the stream ends, then stop
    /// the provider.
    pub async fn run_with_provider(
        &mut self,
        provider: &dyn LocationProvider,
        options: WatchOptions,
        commands: mpsc::Receiver<DetectorCommand>,
        cancel: CancellationToken,
    ) -> Result<(), DetectionError> {
        let (tx, rx) = mpsc::channel(32);
        let subscription = match provider.start(options, tx) {
            Ok(subscription) => subscription,
            Err(e) => {
                let err = DetectionError::from(e);
                self.published
                    .send_modify(|s| s.error = Some(err.to_string()));
                return Err(err);
            }
        };

        let result = self.run(rx, commands, cancel).await;
        subscription.stop().await;
        result
    }

    fn publish_error(&self, err: &DetectionError, accuracy: Option<f64>) {
        self.published.send_modify(|s| {
            s.is_detecting = false;
            s.error = Some(err.to_string());
            s.accuracy = accuracy;
        });
    }
}
