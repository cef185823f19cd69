//! Borderwatch - debounced country detection from a stream of GPS fixes
//!
//! Each position fix is classified through a three tier pipeline:
//!
//! 1. a spatial TTL cache keyed by level-5 geohash cells ([`cache`]),
//! 2. a table of country bounding boxes ([`bbox`]) guarded by a border
//!    proximity policy ([`border`]),
//! 3. a precise remote resolver for ambiguous positions ([`resolver`]).
//!
//! Classified readings feed a hysteresis state machine ([`hysteresis`])
//! that only changes the reported country after a quorum of readings and a
//! minimum dwell time. [`detector::GeoDetector`] ties the pieces together.

pub mod bbox;
pub mod border;
pub mod cache;
pub mod config;
pub mod coord;
pub mod country;
pub mod detector;
pub mod hysteresis;
pub mod location;
pub mod logging;
pub mod resolver;
pub mod store;
pub mod time;

pub use country::CountryCode;
pub use detector::{DetectionError, DetectionState, DetectorCommand, GeoDetector};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
