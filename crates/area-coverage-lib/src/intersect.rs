//! Finite segment intersection in the projected frame

use nalgebra::Vector3;

/// Vector form of "no intersection", for callers that store raw points
pub const NO_INTERSECTION: Vector3<f64> = Vector3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);

/// Whether a vector is the [`NO_INTERSECTION`] sentinel
#[inline]
pub fn is_no_intersection(point: &Vector3<f64>) -> bool {
    point.iter().all(|c| *c == f64::INFINITY)
}

/// Intersection of segment `p1 -> p2` with segment `q1 -> q2`
///
/// The parameters along each segment are computed from cross-product
/// magnitudes, `t = |(q1-p1) x s| / |r x s|` and `u = |(q1-p1) x r| / |r x s|`.
/// This is exact for coplanar segments only; the sign of the parameters is
/// lost, which [`within_both_segments`] compensates for.
///
/// Parallel, collinear and zero-length segments yield `None`.
pub fn segment_intersection(
    p1: &Vector3<f64>,
    p2: &Vector3<f64>,
    q1: &Vector3<f64>,
    q2: &Vector3<f64>,
    epsilon: f64,
) -> Option<Vector3<f64>> {
    let r = p2 - p1;
    let s = q2 - q1;
    let qmp = q1 - p1;

    let rxs = r.cross(&s).norm();
    if rxs.abs() < epsilon {
        return None;
    }

    let t = qmp.cross(&s).norm() / rxs;
    let u = qmp.cross(&r).norm() / rxs;

    let in_range = |v: f64| v >= -epsilon && v <= 1.0 + epsilon;
    if in_range(t) && in_range(u) {
        Some(p1 + r * t)
    } else {
        None
    }
}

/// Dot-product bounds re-check of a candidate point against both segments
///
/// The point must lie "after" each segment's start and "before" its end when
/// measured along that segment's own direction.
#[inline]
pub fn within_both_segments(
    point: &Vector3<f64>,
    p1: &Vector3<f64>,
    p2: &Vector3<f64>,
    q1: &Vector3<f64>,
    q2: &Vector3<f64>,
) -> bool {
    (point - q1).dot(&(q2 - q1)) >= 0.0
        && (point - q2).dot(&(q1 - q2)) >= 0.0
        && (point - p1).dot(&(p2 - p1)) >= 0.0
        && (point - p2).dot(&(p1 - p2)) >= 0.0
}
