//! Distance accumulation on the sphere
//!
//! Two numerically distinct distances are used:
//! - [`haversine_km`]: great-circle distance on the sphere, altitude ignored
//! - [`distance_3d_km`]: the 2D distance combined with the altitude difference,
//!   `sqrt(d2D² + Δalt²)`. This is a flat-earth correction layered on top of
//!   the curved-earth distance, not a true 3D geodesic.
//!
//! All functions are pure and only read the slices they are given.

use crate::GeoPoint;
use crate::utils::{METERS_PER_KM, central_angle};

/// Great-circle distance between two points in kilometers, ignoring altitude
#[inline]
pub fn haversine_km(p1: &GeoPoint, p2: &GeoPoint, earth_radius_km: f64) -> f64 {
    earth_radius_km
        * central_angle(
            p1.latitude().to_radians(),
            p1.longitude().to_radians(),
            p2.latitude().to_radians(),
            p2.longitude().to_radians(),
        )
}

/// Distance between two points in kilometers including the altitude difference
#[inline]
pub fn distance_3d_km(p1: &GeoPoint, p2: &GeoPoint, earth_radius_km: f64) -> f64 {
    let planar = haversine_km(p1, p2, earth_radius_km);
    let rise = (p1.altitude() - p2.altitude()).abs() / METERS_PER_KM;
    planar.hypot(rise)
}

/// Sum of 3D edge lengths from `start_index` to `end_index`
///
/// Sums edges `[start, start+1) .. [end-1, end)`. An empty or inverted range
/// yields 0 and `end_index` is clamped to the last point.
pub fn along_polyline_km(
    points: &[GeoPoint],
    start_index: usize,
    end_index: usize,
    earth_radius_km: f64,
) -> f64 {
    let end_index = end_index.min(points.len().saturating_sub(1));
    if start_index >= end_index {
        return 0.0;
    }

    points[start_index..=end_index]
        .windows(2)
        .map(|pair| distance_3d_km(&pair[0], &pair[1], earth_radius_km))
        .sum()
}

/// Total 2D length of a polyline in kilometers
pub fn polyline_length_2d_km(points: &[GeoPoint], earth_radius_km: f64) -> f64 {
    points
        .windows(2)
        .map(|pair| haversine_km(&pair[0], &pair[1], earth_radius_km))
        .sum()
}

/// Total 3D length of a polyline in kilometers
#[inline]
pub fn polyline_length_3d_km(points: &[GeoPoint], earth_radius_km: f64) -> f64 {
    along_polyline_km(points, 0, points.len(), earth_radius_km)
}
