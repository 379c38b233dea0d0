//! Geographic primitives
//!
//! Coordinate validation and great-circle distance. Distances are computed
//! with the haversine formula over a spherical earth model; accuracy is well
//! within what dispatch radius filtering needs (better than 0.5%).

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters (IUGG spherical approximation)
const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Meters per statute mile
pub const METERS_PER_MILE: f64 = 1_609.344;

/// A WGS-84 latitude/longitude pair in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Construct a point, rejecting out-of-range coordinates
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !latitude.is_finite() {
            return Err(Error::InvalidInput(format!(
                "latitude out of range [-90, 90]: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) || !longitude.is_finite() {
            return Err(Error::InvalidInput(format!(
                "longitude out of range [-180, 180]: {longitude}"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Great-circle distance between two points in meters (haversine)
///
/// Pure and deterministic: symmetric in its arguments and exactly zero for
/// identical points. Assumes both points hold valid coordinates; range
/// checks belong to [`GeoPoint::new`] and request validation upstream.
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    if a == b {
        return 0.0;
    }

    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push h a hair past 1.0 for near-antipodal pairs, where
    // asin would return NaN; clamp to the domain of asin.
    2.0 * EARTH_RADIUS_METERS * h.sqrt().min(1.0).asin()
}

/// Convert a radius in statute miles to meters
pub fn miles_to_meters(miles: f64) -> f64 {
    miles * METERS_PER_MILE
}

/// Width of a bounding box around `center` that fully contains a circle of
/// `radius_meters`, as (latitude delta, longitude delta) in degrees.
///
/// Used as a coarse SQL prefilter; the exact haversine cut happens after the
/// candidate fetch. The longitude delta widens toward the poles and is capped
/// at 180 degrees where the cosine collapses.
pub fn bounding_deltas(center: GeoPoint, radius_meters: f64) -> (f64, f64) {
    let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let cos_lat = center.latitude.to_radians().cos();
    let lon_delta = if cos_lat <= 1e-6 {
        180.0
    } else {
        (lat_delta / cos_lat).min(180.0)
    };
    (lat_delta, lon_delta)
}

/// Axis-aligned coordinate box fully containing a search circle
///
/// Coarse prefilter only: candidates inside the box still need the exact
/// haversine cut. Clamped at the coordinate range edges; a circle crossing
/// the antimeridian is truncated at +/-180 (dispatch regions do not span it).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn around(center: GeoPoint, radius_meters: f64) -> Self {
        let (lat_delta, lon_delta) = bounding_deltas(center, radius_meters);
        Self {
            min_latitude: (center.latitude - lat_delta).max(-90.0),
            max_latitude: (center.latitude + lat_delta).min(90.0),
            min_longitude: (center.longitude - lon_delta).max(-180.0),
            max_longitude: (center.longitude + lon_delta).min(180.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_identical_points_is_zero() {
        let p = point(38.8977, -77.0365);
        assert_eq!(distance_meters(p, p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = point(40.7128, -74.0060); // New York
        let b = point(34.0522, -118.2437); // Los Angeles
        assert_eq!(distance_meters(a, b), distance_meters(b, a));
    }

    #[test]
    fn test_distance_known_city_pair() {
        // New York -> Los Angeles great-circle distance is ~3936 km
        let a = point(40.7128, -74.0060);
        let b = point(34.0522, -118.2437);
        let d = distance_meters(a, b);
        assert!((3_900_000.0..4_000_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_distance_short_range() {
        // Two points ~1.11 km apart (0.01 degrees of latitude)
        let a = point(45.0, 10.0);
        let b = point(45.01, 10.0);
        let d = distance_meters(a, b);
        assert!((1_100.0..1_120.0).contains(&d), "got {d}");
    }

    #[test]
    fn test_distance_near_antipodal_is_finite() {
        // This pair drives the haversine intermediate just past 1.0 in f64,
        // which used to produce NaN out of asin
        let a = point(57.406497379019385, -117.57651129186456);
        let b = point(-57.40649787903853, 62.42348873149064);
        let d = distance_meters(a, b);
        assert!(d.is_finite(), "got {d}");
        // Half the spherical circumference, within rounding
        assert!((d - std::f64::consts::PI * 6_371_000.0).abs() < 1.0, "got {d}");
        assert_eq!(d, distance_meters(b, a));
    }

    #[test]
    fn test_point_rejects_out_of_range() {
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(-91.0, 0.0).is_err());
        assert!(GeoPoint::new(0.0, 180.5).is_err());
        assert!(GeoPoint::new(0.0, -181.0).is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(90.0, -180.0).is_ok());
    }

    #[test]
    fn test_miles_to_meters() {
        assert!((miles_to_meters(1.0) - 1_609.344).abs() < 1e-9);
        assert!((miles_to_meters(500.0) - 804_672.0).abs() < 1e-6);
    }

    #[test]
    fn test_bounding_deltas_contain_radius() {
        let center = point(38.0, -77.0);
        let radius = miles_to_meters(50.0);
        let (lat_d, lon_d) = bounding_deltas(center, radius);

        // Points at the cardinal edges of the circle must fall inside the box
        let north = point(center.latitude + lat_d, center.longitude);
        assert!(distance_meters(center, north) >= radius * 0.999);
        assert!(lon_d > lat_d); // longitude degrees shrink away from equator
    }

    #[test]
    fn test_bounding_box_clamps_at_coordinate_edges() {
        let near_pole = point(89.9, 0.0);
        let bb = BoundingBox::around(near_pole, miles_to_meters(100.0));
        assert!(bb.max_latitude <= 90.0);
        assert_eq!(bb.min_longitude, -180.0);
        assert_eq!(bb.max_longitude, 180.0);

        let bb = BoundingBox::around(point(38.0, -77.0), miles_to_meters(25.0));
        assert!(bb.min_latitude < 38.0 && bb.max_latitude > 38.0);
        assert!(bb.min_longitude < -77.0 && bb.max_longitude > -77.0);
    }
}
