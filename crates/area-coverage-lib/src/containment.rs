//! Point-in-region testing by even-odd ray casting
//!
//! The test runs in the raw (latitude, longitude) plane rather than the
//! projected frame: only planar topology matters here. The axis convention is
//! fixed throughout this module: `x` is latitude and `y` is longitude. A ray
//! is cast from the test point towards increasing latitude and every ring edge
//! straddling the point's longitude with an intercept beyond it is counted.
//!
//! Crossings are summed over all rings before taking parity, so a hole given
//! as an inner ring removes containment.
//!
//! A point lying exactly on an edge may land on either side.

use crate::GeoPoint;

/// Number of ring edges crossed by the ray cast from `point`
///
/// Edges are `(ring[i], ring[(i + 1) % n])`, so unclosed rings are closed
/// implicitly. An empty ring contributes no crossings.
pub fn ring_crossings(point: &GeoPoint, ring: &[GeoPoint]) -> usize {
    let x = point.latitude();
    let y = point.longitude();
    let n = ring.len();

    (0..n)
        .filter(|&i| {
            let v1 = &ring[i];
            let v2 = &ring[(i + 1) % n];
            let straddles = (v1.longitude() > y) != (v2.longitude() > y);
            straddles
                && x < (v2.latitude() - v1.latitude()) * (y - v1.longitude())
                    / (v2.longitude() - v1.longitude())
                    + v1.latitude()
        })
        .count()
}

/// Whether `point` lies inside a single ring
#[inline]
pub fn point_in_ring(point: &GeoPoint, ring: &[GeoPoint]) -> bool {
    ring_crossings(point, ring) % 2 == 1
}

/// Whether `point` lies inside the region bounded by all `rings`
pub fn point_in_rings<R: AsRef<[GeoPoint]>>(point: &GeoPoint, rings: &[R]) -> bool {
    let crossings: usize = rings
        .iter()
        .map(|ring| ring_crossings(point, ring.as_ref()))
        .sum();
    crossings % 2 == 1
}
