//! Utility functions for coordinate conversions
//!
//! Geodetic points are embedded into a Cartesian frame in meters so that
//! segment intersection can be done with plain vector arithmetic.

use crate::GeoPoint;
use nalgebra::Vector3;

/// Mean earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Meters per kilometer
pub const METERS_PER_KM: f64 = 1000.0;

/// Haversine central angle (radians) between two lat/lon pairs given in radians
#[inline(always)]
pub(crate) fn central_angle(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let delta_lat = lat2 - lat1;
    let delta_lon = lon2 - lon1;

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Project a geodetic point into the local Cartesian frame
///
/// Each point is mapped independently: its haversine arc length from the
/// reference origin (0° lat, 0° lon) plus its altitude is used as the radius
/// along the point's direction on the unit sphere.
///
/// # Arguments
/// * `point` - Geodetic point (altitude in meters)
/// * `earth_radius_km` - Radius of the reference sphere
///
/// # Returns
/// A `Vector3<f64>` in meters
///
/// This is not a geodesic projection. It is good enough for crossing tests
/// over field-sized extents and distorts near the ±180° meridian.
#[inline(always)]
pub fn project(point: &GeoPoint, earth_radius_km: f64) -> Vector3<f64> {
    let lon = point.longitude().to_radians();
    let lat = point.latitude().to_radians();

    let distance = earth_radius_km * METERS_PER_KM * central_angle(lat, lon, 0.0, 0.0);
    let radius = distance + point.altitude();

    Vector3::new(
        radius * lat.cos() * lon.cos(),
        radius * lat.cos() * lon.sin(),
        radius * lat.sin(),
    )
}

/// Project every point of a sequence
pub fn project_all(points: &[GeoPoint], earth_radius_km: f64) -> Vec<Vector3<f64>> {
    points
        .iter()
        .map(|p| project(p, earth_radius_km))
        .collect()
}
