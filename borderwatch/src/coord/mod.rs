//! Coordinate utilities
//!
//! Geohash quantization for spatial cache keys and great-circle distances
//! for movement gating.

mod types;

pub use types::{
    CoordError, GeoPoint, GeohashBounds, EARTH_RADIUS_M, MAX_GEOHASH_PRECISION, MAX_LAT, MAX_LON,
    MIN_LAT, MIN_LON,
};

/// Geohash base32 alphabet (no `a`, `i`, `l`, `o`).
const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Encodes a position as a geohash of `precision` characters.
///
/// Bits alternate between longitude (even bits) and latitude (odd bits),
/// starting from the full `[-180, 180] x [-90, 90]` range. A value strictly
/// greater than the midpoint selects the upper half.
///
/// # Errors
///
/// Returns `CoordError` for out-of-range or non-finite coordinates, or a
/// precision outside `1..=12`.
pub fn geohash_encode(lat: f64, lng: f64, precision: usize) -> Result<String, CoordError> {
    types::validate(lat, lng)?;
    if precision == 0 || precision > MAX_GEOHASH_PRECISION {
        return Err(CoordError::InvalidPrecision(precision));
    }

    let mut lat_range = (MIN_LAT, MAX_LAT);
    let mut lng_range = (MIN_LON, MAX_LON);
    let mut hash = String::with_capacity(precision);
    let mut even = true;
    let mut bit = 0u8;
    let mut ch = 0usize;

    while hash.len() < precision {
        let (range, value) = if even {
            (&mut lng_range, lng)
        } else {
            (&mut lat_range, lat)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value > mid {
            ch = (ch << 1) | 1;
            range.0 = mid;
        } else {
            ch <<= 1;
            range.1 = mid;
        }
        even = !even;

        bit += 1;
        if bit == 5 {
            hash.push(BASE32[ch] as char);
            bit = 0;
            ch = 0;
        }
    }

    Ok(hash)
}

/// Decodes a geohash into the rectangle it covers.
pub fn geohash_decode(hash: &str) -> Result<GeohashBounds, CoordError> {
    if hash.is_empty() || hash.len() > MAX_GEOHASH_PRECISION {
        return Err(CoordError::InvalidPrecision(hash.len()));
    }

    let mut lat_range = (MIN_LAT, MAX_LAT);
    let mut lng_range = (MIN_LON, MAX_LON);
    let mut even = true;

    for c in hash.chars() {
        let idx = BASE32
            .iter()
            .position(|&b| b as char == c)
            .ok_or_else(|| CoordError::InvalidGeohash {
                hash: hash.to_string(),
                ch: c,
            })?;

        for shift in (0..5).rev() {
            let range = if even {
                &mut lng_range
            } else {
                &mut lat_range
            };
            let mid = (range.0 + range.1) / 2.0;
            if (idx >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Ok(GeohashBounds {
        lat_min: lat_range.0,
        lat_max: lat_range.1,
        lng_min: lng_range.0,
        lng_max: lng_range.1,
    })
}

/// Great-circle distance between two points in meters (haversine).
#[inline]
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlng = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geohash_known_cities() {
        assert_eq!(geohash_encode(-33.4489, -70.6693, 5).unwrap(), "66j9x");
        assert_eq!(geohash_encode(-34.6037, -58.3816, 5).unwrap(), "69y7p");
        assert_eq!(geohash_encode(40.7128, -74.006, 5).unwrap(), "dr5re");
        assert_eq!(geohash_encode(51.5074, -0.1278, 5).unwrap(), "gcpvj");
    }

    #[test]
    fn test_geohash_origin_falls_in_lower_halves() {
        // 0.0 is never strictly greater than a 0.0 midpoint
        assert_eq!(geohash_encode(0.0, 0.0, 5).unwrap(), "7zzzz");
    }

    #[test]
    fn test_geohash_precision_bounds() {
        assert_eq!(
            geohash_encode(10.0, 10.0, 0),
            Err(CoordError::InvalidPrecision(0))
        );
        assert_eq!(
            geohash_encode(10.0, 10.0, 13),
            Err(CoordError::InvalidPrecision(13))
        );
        assert_eq!(geohash_encode(10.0, 10.0, 12).unwrap().len(), 12);
    }

    #[test]
    fn test_geohash_rejects_invalid_coordinates() {
        assert!(matches!(
            geohash_encode(91.0, 0.0, 5),
            Err(CoordError::InvalidLatitude(_))
        ));
        assert!(matches!(
            geohash_encode(0.0, -180.5, 5),
            Err(CoordError::InvalidLongitude(_))
        ));
        assert!(geohash_encode(f64::NAN, 0.0, 5).is_err());
    }

    #[test]
    fn test_geohash_decode_contains_city() {
        let bounds = geohash_decode("66j9x").unwrap();
        assert!(bounds.contains(-33.4489, -70.6693));

        // Level 5 cells are roughly 4.9km x 4.9km at the equator
        assert!((bounds.lat_max - bounds.lat_min - 180.0 / 4096.0).abs() < 1e-12);
        assert!((bounds.lng_max - bounds.lng_min - 360.0 / 8192.0).abs() < 1e-12);
    }

    #[test]
    fn test_geohash_decode_rejects_bad_chars() {
        let err = geohash_decode("66a9x").unwrap_err();
        assert_eq!(
            err,
            CoordError::InvalidGeohash {
                hash: "66a9x".to_string(),
                ch: 'a'
            }
        );
        assert!(geohash_decode("").is_err());
    }

    #[test]
    fn test_haversine_zero_for_same_point() {
        let p = GeoPoint::new(-33.45, -70.66);
        assert_eq!(haversine_m(p, p), 0.0);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let d = haversine_m(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        // 6371km * pi / 180
        assert!((d - 111_194.9).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_haversine_santiago_to_mendoza() {
        let santiago = GeoPoint::new(-33.4489, -70.6693);
        let mendoza = GeoPoint::new(-32.8895, -68.8458);
        let km = haversine_m(santiago, mendoza) / 1000.0;
        assert!((175.0..185.0).contains(&km), "got {}km", km);
    }

    #[test]
    fn test_geo_point_try_new() {
        assert!(GeoPoint::try_new(-33.0, -70.0).is_ok());
        assert!(GeoPoint::try_new(-95.0, -70.0).is_err());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_encode_is_deterministic_and_well_formed(
                lat in -90.0..=90.0_f64,
                lng in -180.0..=180.0_f64,
            ) {
                let a = geohash_encode(lat, lng, 5)?;
                let b = geohash_encode(lat, lng, 5)?;
                prop_assert_eq!(&a, &b);
                prop_assert_eq!(a.len(), 5);
                prop_assert!(a.bytes().all(|c| BASE32.contains(&c)));
            }

            #[test]
            fn test_decoded_cell_contains_point(
                lat in -90.0..=90.0_f64,
                lng in -180.0..=180.0_f64,
                precision in 1usize..=12,
            ) {
                let hash = geohash_encode(lat, lng, precision)?;
                let bounds = geohash_decode(&hash)?;
                prop_assert!(
                    bounds.contains(lat, lng),
                    "{} not in cell {} {:?}", GeoPoint::new(lat, lng), hash, bounds
                );
            }

            #[test]
            fn test_shorter_hash_is_prefix(
                lat in -90.0..=90.0_f64,
                lng in -180.0..=180.0_f64,
            ) {
                let long = geohash_encode(lat, lng, 9)?;
                let short = geohash_encode(lat, lng, 5)?;
                prop_assert!(long.starts_with(&short));
            }

            #[test]
            fn test_haversine_is_symmetric(
                lat1 in -80.0..80.0_f64, lng1 in -179.0..179.0_f64,
                lat2 in -80.0..80.0_f64, lng2 in -179.0..179.0_f64,
            ) {
                let a = GeoPoint::new(lat1, lng1);
                let b = GeoPoint::new(lat2, lng2);
                prop_assert!((haversine_m(a, b) - haversine_m(b, a)).abs() < 1e-6);
            }
        }
    }
}
