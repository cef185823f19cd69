//! Border-proximity policy.
//!
//! Decides whether a bounding-box classification can be trusted or the
//! position needs the precise (remote) resolver:
//!
//! | candidates | decision                                         |
//! |------------|--------------------------------------------------|
//! | 0          | precise: unknown or offshore                     |
//! | 1          | precise only within `threshold_km` of its edge   |
//! | 2+         | precise: overlapping rectangles                  |

use std::sync::Arc;

use crate::bbox::BBoxIndex;
use crate::country::CountryCode;

/// Default distance from a rectangle edge that counts as "near a border".
pub const DEFAULT_NEAR_BORDER_THRESHOLD_KM: f64 = 20.0;

/// Pure decision function over a bounding-box index.
#[derive(Debug, Clone)]
pub struct BorderPolicy {
    index: Arc<BBoxIndex>,
    threshold_km: f64,
}

impl BorderPolicy {
    pub fn new(index: Arc<BBoxIndex>) -> Self {
        Self {
            index,
            threshold_km: DEFAULT_NEAR_BORDER_THRESHOLD_KM,
        }
    }

    pub fn with_threshold_km(mut self, threshold_km: f64) -> Self {
        self.threshold_km = threshold_km;
        self
    }

    pub fn threshold_km(&self) -> f64 {
        self.threshold_km
    }

    pub fn index(&self) -> &BBoxIndex {
        &self.index
    }

    /// Whether `(lat, lng)` must go to the precise resolver.
    ///
    /// A single candidate missing from the index is treated as ambiguous.
    pub fn needs_precise_resolution(&self, lat: f64, lng: f64, candidates: &[CountryCode]) -> bool {
        match candidates {
            [] => true,
            [only] => match self.index.distance_to_edge_km(lat, lng, *only) {
                Some(distance) => distance <= self.threshold_km,
                None => true,
            },
            _ => true,
        }
    }

    /// Whether the point is inside `country`'s rectangle and within the
    /// threshold of its edge. Unknown countries are never near a border.
    pub fn is_near_border(&self, lat: f64, lng: f64, country: CountryCode) -> bool {
        match self.index.get(country) {
            Some(b) if b.contains(lat, lng) => b.distance_to_edge_km(lat, lng) <= self.threshold_km,
            _ => false,
        }
    }

    /// Every candidate country whose edge is within the threshold.
    pub fn near_border_countries(&self, lat: f64, lng: f64) -> Vec<CountryCode> {
        self.index
            .iter()
            .filter(|b| b.contains(lat, lng) && b.distance_to_edge_km(lat, lng) <= self.threshold_km)
            .map(|b| b.country)
            .collect()
    }
}

impl Default for BorderPolicy {
    fn default() -> Self {
        Self::new(Arc::new(BBoxIndex::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::CountryBBox;

    fn code(s: &str) -> CountryCode {
        s.parse().unwrap()
    }

    /// One box, lat 0..10, lng 0..60: the north edge limits near lat 10.
    fn single_box_policy() -> BorderPolicy {
        let b = CountryBBox::new(code("XX"), (0.0, 10.0), (0.0, 60.0)).unwrap();
        BorderPolicy::new(Arc::new(BBoxIndex::new(vec![b])))
    }

    #[test]
    fn test_zero_candidates_needs_precise() {
        let policy = BorderPolicy::default();
        assert!(policy.needs_precise_resolution(0.0, -150.0, &[]));
    }

    #[test]
    fn test_multiple_candidates_needs_precise() {
        let policy = BorderPolicy::default();
        let candidates = policy.index().candidates(-34.6037, -58.3816);
        assert_eq!(candidates.len(), 2);
        assert!(policy.needs_precise_resolution(-34.6037, -58.3816, &candidates));
    }

    #[test]
    fn test_single_candidate_deep_inside_is_cheap() {
        let policy = BorderPolicy::default();
        let candidates = policy.index().candidates(-36.8201, -73.0444);
        assert_eq!(candidates, vec![code("CL")]);
        assert!(!policy.needs_precise_resolution(-36.8201, -73.0444, &candidates));

        let candidates = policy.index().candidates(40.4168, -3.7038);
        assert_eq!(candidates, vec![code("ES")]);
        assert!(!policy.needs_precise_resolution(40.4168, -3.7038, &candidates));
    }

    #[test]
    fn test_overlapping_boxes_need_precise() {
        let policy = BorderPolicy::default();
        let candidates = policy.index().candidates(-33.4489, -70.6693);
        assert_eq!(candidates, vec![code("CL"), code("BR")]);
        assert!(policy.needs_precise_resolution(-33.4489, -70.6693, &candidates));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        // One degree below the north edge is exactly 111 km
        let policy = single_box_policy().with_threshold_km(111.0);
        let xx = [code("XX")];
        assert_eq!(policy.threshold_km(), 111.0);

        assert!(policy.needs_precise_resolution(9.0, 30.0, &xx));
        assert!(policy.is_near_border(9.0, 30.0, code("XX")));

        assert!(!policy.needs_precise_resolution(8.9, 30.0, &xx));
        assert!(!policy.is_near_border(8.9, 30.0, code("XX")));
    }

    #[test]
    fn test_default_threshold() {
        let policy = single_box_policy();
        assert_eq!(policy.threshold_km(), 20.0);
        assert!(policy.needs_precise_resolution(9.9, 30.0, &[code("XX")]));
        assert!(!policy.needs_precise_resolution(9.0, 30.0, &[code("XX")]));
    }

    #[test]
    fn test_single_unknown_candidate_needs_precise() {
        let policy = single_box_policy();
        assert!(policy.needs_precise_resolution(5.0, 30.0, &[code("ZZ")]));
    }

    #[test]
    fn test_is_near_border_unknown_or_outside() {
        let policy = single_box_policy();
        assert!(!policy.is_near_border(5.0, 30.0, code("ZZ")));
        assert!(!policy.is_near_border(20.0, 30.0, code("XX")));
    }

    #[test]
    fn test_near_border_countries() {
        let policy = BorderPolicy::default();
        // Just inside the UY west edge at -58.4, deep inside AR
        let near = policy.near_border_countries(-34.0, -58.35);
        assert_eq!(near, vec![code("UY")]);
        assert!(policy.near_border_countries(-36.8201, -73.0444).is_empty());
    }
}
