//! Coordinate types and constants.

use std::fmt;

use thiserror::Error;

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;

/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;

/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;

/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// Longest geohash we will produce (~3.7cm cells).
pub const MAX_GEOHASH_PRECISION: usize = 12;

/// Mean Earth radius used for great-circle distances, in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a point without validation.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a point, rejecting non-finite or out-of-range values.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, CoordError> {
        validate(latitude, longitude)?;
        Ok(Self::new(latitude, longitude))
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// Rectangle covered by a geohash cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeohashBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GeohashBounds {
    /// Center of the cell.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.lat_min + self.lat_max) / 2.0,
            (self.lng_min + self.lng_max) / 2.0,
        )
    }

    /// Inclusive containment test.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        (self.lat_min..=self.lat_max).contains(&lat) && (self.lng_min..=self.lng_max).contains(&lng)
    }
}

/// Coordinate errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordError {
    #[error("Invalid latitude: {0} (must be between -90 and 90)")]
    InvalidLatitude(f64),

    #[error("Invalid longitude: {0} (must be between -180 and 180)")]
    InvalidLongitude(f64),

    #[error("Invalid geohash precision: {0} (must be between 1 and 12)")]
    InvalidPrecision(usize),

    #[error("Invalid geohash '{hash}': unexpected character '{ch}'")]
    InvalidGeohash { hash: String, ch: char },
}

pub(crate) fn validate(latitude: f64, longitude: f64) -> Result<(), CoordError> {
    // NaN fails both range checks
    if !(MIN_LAT..=MAX_LAT).contains(&latitude) {
        return Err(CoordError::InvalidLatitude(latitude));
    }
    if !(MIN_LON..=MAX_LON).contains(&longitude) {
        return Err(CoordError::InvalidLongitude(longitude));
    }
    Ok(())
}
