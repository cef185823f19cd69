//! Country bounding-box index.
//!
//! A cheap pre-filter: each country is approximated by one lat/lng
//! rectangle. A lookup returns every rectangle containing the point, in
//! table order, and the distance from the point to a rectangle's nearest
//! edge tells the border policy how much to trust a single match.
//!
//! # Distance Approximation
//!
//! ```text
//! north/south: |dlat| * 111 km
//! east/west:   |dlng| * 111 km * cos(lat)
//! ```
//!
//! Good enough for a 20 km proximity threshold; not a geodesic.

mod table;

use std::fmt;

use thiserror::Error;

use crate::country::CountryCode;
use crate::coord::GeoPoint;

/// Kilometers per degree of latitude (and of longitude at the equator).
pub const KM_PER_DEGREE: f64 = 111.0;

/// Bounding-box construction errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BBoxError {
    #[error("{country}: latitude range {min}..{max} is empty or out of bounds")]
    InvalidLatRange { country: CountryCode, min: f64, max: f64 },

    #[error("{country}: longitude range {min}..{max} is empty or out of bounds")]
    InvalidLngRange { country: CountryCode, min: f64, max: f64 },
}

/// Axis-aligned rectangle approximating one country.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CountryBBox {
    pub country: CountryCode,
    /// `(min, max)` latitude in degrees.
    pub lat_range: (f64, f64),
    /// `(min, max)` longitude in degrees.
    pub lng_range: (f64, f64),
}

impl CountryBBox {
    /// Create a validated bounding box.
    pub fn new(
        country: CountryCode,
        lat_range: (f64, f64),
        lng_range: (f64, f64),
    ) -> Result<Self, BBoxError> {
        let (lat_min, lat_max) = lat_range;
        if !(lat_min <= lat_max && lat_min >= -90.0 && lat_max <= 90.0) {
            return Err(BBoxError::InvalidLatRange {
                country,
                min: lat_min,
                max: lat_max,
            });
        }
        let (lng_min, lng_max) = lng_range;
        if !(lng_min <= lng_max && lng_min >= -180.0 && lng_max <= 180.0) {
            return Err(BBoxError::InvalidLngRange {
                country,
                min: lng_min,
                max: lng_max,
            });
        }
        Ok(Self {
            country,
            lat_range,
            lng_range,
        })
    }

    pub(crate) const fn from_static(
        code: &'static str,
        lat_range: (f64, f64),
        lng_range: (f64, f64),
    ) -> Self {
        Self {
            country: CountryCode::from_static(code),
            lat_range,
            lng_range,
        }
    }

    /// Inclusive point-in-rectangle test.
    #[inline]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        lat >= self.lat_range.0
            && lat <= self.lat_range.1
            && lng >= self.lng_range.0
            && lng <= self.lng_range.1
    }

    /// Distance in km from an inside point to the nearest edge.
    ///
    /// Returns `0.0` for points outside the rectangle.
    pub fn distance_to_edge_km(&self, lat: f64, lng: f64) -> f64 {
        if !self.contains(lat, lng) {
            return 0.0;
        }

        let to_north = (self.lat_range.1 - lat).abs() * KM_PER_DEGREE;
        let to_south = (lat - self.lat_range.0).abs() * KM_PER_DEGREE;

        let km_per_lng_degree = KM_PER_DEGREE * lat.to_radians().cos();
        let to_east = (self.lng_range.1 - lng).abs() * km_per_lng_degree;
        let to_west = (lng - self.lng_range.0).abs() * km_per_lng_degree;

        to_north.min(to_south).min(to_east).min(to_west)
    }

    /// Geometric center of the rectangle.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.lat_range.0 + self.lat_range.1) / 2.0,
            (self.lng_range.0 + self.lng_range.1) / 2.0,
        )
    }
}

impl fmt::Display for CountryBBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [lat {}..{}, lng {}..{}]",
            self.country, self.lat_range.0, self.lat_range.1, self.lng_range.0, self.lng_range.1
        )
    }
}

/// Ordered collection of country rectangles.
#[derive(Debug, Clone)]
pub struct BBoxIndex {
    boxes: Vec<CountryBBox>,
}

impl BBoxIndex {
    /// Index over a custom table. Lookup order is the order given.
    pub fn new(boxes: Vec<CountryBBox>) -> Self {
        Self { boxes }
    }

    /// The built-in Americas + Europe table.
    pub fn builtin() -> Self {
        Self::new(table::BUILTIN_BBOXES.to_vec())
    }

    /// Countries whose rectangle contains the point, in table order.
    pub fn candidates(&self, lat: f64, lng: f64) -> Vec<CountryCode> {
        self.boxes
            .iter()
            .filter(|b| b.contains(lat, lng))
            .map(|b| b.country)
            .collect()
    }

    /// Rectangle for a country, if indexed. First entry wins on duplicates.
    pub fn get(&self, country: CountryCode) -> Option<&CountryBBox> {
        self.boxes.iter().find(|b| b.country == country)
    }

    /// Distance to the nearest edge of `country`'s rectangle.
    ///
    /// `None` when the country is not indexed.
    pub fn distance_to_edge_km(&self, lat: f64, lng: f64, country: CountryCode) -> Option<f64> {
        self.get(country).map(|b| b.distance_to_edge_km(lat, lng))
    }

    /// All rectangles, in lookup order.
    pub fn iter(&self) -> impl Iterator<Item = &CountryBBox> {
        self.boxes.iter()
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

impl Default for BBoxIndex {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> CountryCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_builtin_table_is_valid() {
        let index = BBoxIndex::builtin();
        assert_eq!(index.len(), 44);

        for b in index.iter() {
            assert!(
                CountryBBox::new(b.country, b.lat_range, b.lng_range).is_ok(),
                "Invalid built-in box {}",
                b
            );
        }
    }

    #[test]
    fn test_builtin_table_order() {
        let first: Vec<_> = BBoxIndex::builtin()
            .iter()
            .take(3)
            .map(|b| b.country.to_string())
            .collect();
        assert_eq!(first, vec!["AR", "CL", "BR"]);
    }

    #[test]
    fn test_every_center_is_a_candidate_of_its_country() {
        let index = BBoxIndex::builtin();
        for b in index.iter() {
            let c = b.center();
            assert!(
                index.candidates(c.latitude, c.longitude).contains(&b.country),
                "Center of {} not matched",
                b
            );
        }
    }

    #[test]
    fn test_candidates_overlap_in_table_order() {
        let index = BBoxIndex::builtin();
        // Buenos Aires sits inside both the AR and UY rectangles
        assert_eq!(index.candidates(-34.6037, -58.3816), vec![code("AR"), code("UY")]);
    }

    #[test]
    fn test_candidates_single_match() {
        let index = BBoxIndex::builtin();
        // Concepcion is south of the BR box and west of the AR box
        assert_eq!(index.candidates(-36.8201, -73.0444), vec![code("CL")]);
        assert_eq!(index.candidates(40.4168, -3.7038), vec![code("ES")]);
        // Santiago also falls inside the BR rectangle
        assert_eq!(index.candidates(-33.4489, -70.6693), vec![code("CL"), code("BR")]);
    }

    #[test]
    fn test_candidates_open_ocean() {
        let index = BBoxIndex::builtin();
        assert!(index.candidates(0.0, -150.0).is_empty());
        assert!(index.candidates(-40.0, 0.0).is_empty());
        assert!(index.candidates(-89.0, 170.0).is_empty());
    }

    #[test]
    fn test_contains_is_inclusive() {
        let b = CountryBBox::new(code("XX"), (0.0, 10.0), (20.0, 30.0)).unwrap();
        assert!(b.contains(0.0, 20.0));
        assert!(b.contains(10.0, 30.0));
        assert!(!b.contains(10.0001, 25.0));
    }

    #[test]
    fn test_distance_zero_outside_and_on_edge() {
        let b = CountryBBox::new(code("XX"), (0.0, 10.0), (20.0, 30.0)).unwrap();
        assert_eq!(b.distance_to_edge_km(-1.0, 25.0), 0.0);
        assert_eq!(b.distance_to_edge_km(10.0, 25.0), 0.0);
    }

    #[test]
    fn test_distance_uses_latitude_scale() {
        let b = CountryBBox::new(code("XX"), (0.0, 10.0), (0.0, 60.0)).unwrap();
        // 1 degree below the north edge, far from east/west
        let d = b.distance_to_edge_km(9.0, 30.0);
        assert!((d - 111.0).abs() < 1e-9, "got {}", d);
    }

    #[test]
    fn test_distance_uses_longitude_scale() {
        let b = CountryBBox::new(code("XX"), (-10.0, 70.0), (0.0, 2.0)).unwrap();
        // At 60N one degree of longitude is ~55.5 km
        let d = b.distance_to_edge_km(60.0, 1.0);
        assert!((d - 55.5).abs() < 1e-6, "got {}", d);
    }

    #[test]
    fn test_distance_strictly_decreases_toward_limiting_edge() {
        let b = CountryBBox::new(code("XX"), (0.0, 10.0), (0.0, 60.0)).unwrap();
        let distances: Vec<f64> = [6.0, 7.0, 8.0, 9.0, 9.9]
            .iter()
            .map(|&lat| b.distance_to_edge_km(lat, 30.0))
            .collect();
        assert!(
            distances.windows(2).all(|w| w[1] < w[0]),
            "Not strictly decreasing: {:?}",
            distances
        );
    }

    #[test]
    fn test_index_lookup_helpers() {
        let index = BBoxIndex::builtin();
        assert_eq!(index.get(code("GR")).unwrap().lat_range, (34.8, 41.7));
        assert!(index.get(code("JP")).is_none());
        assert!(index.distance_to_edge_km(0.0, 0.0, code("JP")).is_none());
    }

    #[test]
    fn test_new_rejects_inverted_ranges() {
        assert!(matches!(
            CountryBBox::new(code("XX"), (10.0, 0.0), (0.0, 1.0)),
            Err(BBoxError::InvalidLatRange { .. })
        ));
        assert!(matches!(
            CountryBBox::new(code("XX"), (0.0, 1.0), (0.0, 181.0)),
            Err(BBoxError::InvalidLngRange { .. })
        ));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_distance_non_increasing_moving_east(
                idx in 0usize..44,
                u in 0.0..1.0_f64,
                v in 0.0..1.0_f64,
                step in 0.0..1.0_f64,
            ) {
                let index = BBoxIndex::builtin();
                let b = index.iter().nth(idx).unwrap();
                let lat = b.lat_range.0 + (b.lat_range.1 - b.lat_range.0) * u;
                let lng = b.lng_range.0 + (b.lng_range.1 - b.lng_range.0) * v;
                let closer = lng + (b.lng_range.1 - lng) * step;

                // Only meaningful once the east edge is nearer than the west
                if lng >= (b.lng_range.0 + b.lng_range.1) / 2.0 {
                    let before = b.distance_to_edge_km(lat, lng);
                    let after = b.distance_to_edge_km(lat, closer);
                    prop_assert!(after <= before + 1e-9, "{} -> {}", before, after);
                }
            }

            #[test]
            fn test_distance_never_negative_or_nan(
                lat in -90.0..=90.0_f64,
                lng in -180.0..=180.0_f64,
            ) {
                for b in BBoxIndex::builtin().iter() {
                    let d = b.distance_to_edge_km(lat, lng);
                    prop_assert!(d >= 0.0 && d.is_finite());
                    if !b.contains(lat, lng) {
                        prop_assert_eq!(d, 0.0);
                    }
                }
            }
        }
    }
}
