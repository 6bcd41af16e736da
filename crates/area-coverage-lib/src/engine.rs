//! Intersection engine
//!
//! For one (route, area) pair the engine finds every crossing between the
//! route and the area boundary, collapses near-identical crossings, orders
//! them along the route, and walks them with a two-state machine to
//! accumulate the distance traveled inside the area.
//!
//! Evaluations share no mutable state, so pairs can be evaluated
//! concurrently (see [`crate::BatchRunner`]).

use crate::distance::{along_polyline_km, haversine_km};
use crate::intersect::{segment_intersection, within_both_segments};
use crate::utils::{EARTH_RADIUS_KM, METERS_PER_KM, project_all};
use crate::{Area, DataError, GeoPoint, Result, Route};
use nalgebra::Vector3;
use smallvec::SmallVec;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Fewest points a route needs to have a single edge
const MIN_ROUTE_POINTS: usize = 2;

/// Fewest points of a closed ring (triangle plus closing point)
const MIN_RING_POINTS: usize = 4;

/// Largest gap between a ring's first and last point still considered closed
const CLOSURE_TOLERANCE_KM: f64 = 1e-6;

/// Tunable constants of the engine
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EngineConfig {
    /// Crossings closer than this in both projected X and Y are merged (km)
    pub dedup_threshold_km: f64,
    /// Radius of the reference sphere (km)
    pub earth_radius_km: f64,
    /// Tolerance of the segment parallelism and bounds tests
    pub epsilon: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dedup_threshold_km: 0.003,
            earth_radius_km: EARTH_RADIUS_KM,
            epsilon: f64::EPSILON,
        }
    }
}

/// A crossing found on route edge `index` at projected position `point` (m)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawIntersection {
    /// Edge of the route, between points `index` and `index + 1`
    pub index: usize,
    /// Crossing position in the projected frame
    pub point: Vector3<f64>,
}

impl RawIntersection {
    #[inline]
    pub fn new(index: usize, point: Vector3<f64>) -> Self {
        Self { index, point }
    }
}

/// Position of the walker relative to the area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraversalState {
    Outside,
    Inside,
}

impl TraversalState {
    #[inline]
    fn initial(start_inside: bool) -> Self {
        if start_inside {
            Self::Inside
        } else {
            Self::Outside
        }
    }

    /// State after crossing the boundary once
    #[inline]
    pub fn toggled(self) -> Self {
        match self {
            Self::Outside => Self::Inside,
            Self::Inside => Self::Outside,
        }
    }
}

/// Full outcome of evaluating one route against one area
#[derive(Debug, Clone)]
pub struct PairEvaluation {
    /// Deduplicated crossings ordered by route edge
    pub intersections: Vec<RawIntersection>,
    /// Whether the first route point lies inside the area
    pub start_inside: bool,
    /// Whether the last route point lies inside the area
    pub end_inside: bool,
    /// Distance accumulated while walking the crossings (km)
    pub along_km: f64,
    /// Start and end legs contributed by inside endpoints (km)
    pub boundary_km: f64,
}

impl PairEvaluation {
    #[inline]
    pub fn has_crossings(&self) -> bool {
        !self.intersections.is_empty()
    }

    /// Traversed distance inside the area (km)
    #[inline]
    pub fn total_km(&self) -> f64 {
        self.along_km + self.boundary_km
    }
}

/// Traversed distance of one route inside one area
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntersectionResult {
    pub route_name: String,
    pub distance_km: f64,
}

/// Every route that crossed one area, in route processing order
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AreaResult {
    pub name: String,
    pub intersection_results: Vec<IntersectionResult>,
}

impl AreaResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            intersection_results: Vec::new(),
        }
    }

    #[inline]
    pub fn has_intersecting_routes(&self) -> bool {
        !self.intersection_results.is_empty()
    }

    /// Sum of traversed distance of all routes (km)
    pub fn total_distance_km(&self) -> f64 {
        self.intersection_results
            .iter()
            .map(|r| r.distance_km)
            .sum()
    }
}

/// Crossing detection and distance accounting for (route, area) pairs
#[derive(Debug, Clone, Default)]
pub struct IntersectionEngine {
    config: EngineConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl IntersectionEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Check the geometry of a pair before evaluating it
    pub fn validate(&self, route: &Route, area: &Area) -> Result<()> {
        if route.total_points() < MIN_ROUTE_POINTS {
            return Err(DataError::InsufficientPoints {
                feature: route.name().to_string(),
                required: MIN_ROUTE_POINTS,
                found: route.total_points(),
            });
        }

        let rings = area.rings();
        if rings.is_empty() {
            return Err(DataError::InsufficientPoints {
                feature: area.name().to_string(),
                required: MIN_RING_POINTS,
                found: 0,
            });
        }

        for (ring_index, ring) in rings.iter().enumerate() {
            if ring.len() < MIN_RING_POINTS {
                return Err(DataError::InsufficientPoints {
                    feature: area.name().to_string(),
                    required: MIN_RING_POINTS,
                    found: ring.len(),
                });
            }
            if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
                if haversine_km(first, last, self.config.earth_radius_km) > CLOSURE_TOLERANCE_KM {
                    return Err(DataError::UnclosedRing {
                        feature: area.name().to_string(),
                        ring: ring_index,
                    });
                }
            }
        }

        Ok(())
    }

    /// Evaluate one route against one area
    pub fn evaluate(&self, route: &Route, area: &Area) -> Result<PairEvaluation> {
        self.validate(route, area)?;

        // Validated routes have at least MIN_ROUTE_POINTS points
        let points = route.points();
        let (first, last) = (&points[0], &points[points.len() - 1]);

        let start_inside = area.contains(first);
        let end_inside = area.contains(last);

        let projected = project_all(points, self.config.earth_radius_km);
        let intersections = self.find_intersections(&projected, area);
        let (along_km, boundary_km) =
            self.accumulate(points, &intersections, start_inside, end_inside);

        tracing::debug!(
            "Route '{}' x area '{}': {} crossings, start inside: {}, end inside: {}, {:.3} km",
            route.name(),
            area.name(),
            intersections.len(),
            start_inside,
            end_inside,
            along_km + boundary_km
        );

        Ok(PairEvaluation {
            intersections,
            start_inside,
            end_inside,
            along_km,
            boundary_km,
        })
    }

    /// Evaluate a pair and keep only what the area report needs
    ///
    /// Returns `None` when the route never crosses the boundary, even if it
    /// lies entirely inside the area.
    pub fn evaluate_pair(&self, route: &Route, area: &Area) -> Result<Option<IntersectionResult>> {
        let evaluation = self.evaluate(route, area)?;
        Ok(evaluation.has_crossings().then(|| IntersectionResult {
            route_name: route.name().to_string(),
            distance_km: evaluation.total_km(),
        }))
    }

    /// Crossings of a projected route with every boundary edge of `area`
    ///
    /// The result is deduplicated and sorted by route edge; crossings on the
    /// same edge keep their discovery order.
    pub fn find_intersections(&self, route: &[Vector3<f64>], area: &Area) -> Vec<RawIntersection> {
        let mut accepted: SmallVec<[RawIntersection; 8]> = SmallVec::new();

        for ring in area.rings() {
            let ring = project_all(ring, self.config.earth_radius_km);
            for boundary in ring.windows(2) {
                let (v1, v2) = (&boundary[0], &boundary[1]);
                for (index, step) in route.windows(2).enumerate() {
                    let (w1, w2) = (&step[0], &step[1]);

                    let Some(point) = segment_intersection(v1, v2, w1, w2, self.config.epsilon)
                    else {
                        continue;
                    };
                    if !within_both_segments(&point, v1, v2, w1, w2) {
                        continue;
                    }

                    let candidate = RawIntersection::new(index, point);
                    if !self.is_duplicate(&accepted, &candidate) {
                        accepted.push(candidate);
                    }
                }
            }
        }

        let mut accepted = accepted.into_vec();
        accepted.sort_by_key(|i| i.index);
        accepted
    }

    /// Whether `candidate` lies within the threshold of an accepted crossing
    ///
    /// Only projected X and Y are compared; altitude differences are ignored.
    pub fn is_duplicate(&self, accepted: &[RawIntersection], candidate: &RawIntersection) -> bool {
        let threshold = self.config.dedup_threshold_km * METERS_PER_KM;
        accepted.iter().any(|existing| {
            (existing.point.x - candidate.point.x).abs() < threshold
                && (existing.point.y - candidate.point.y).abs() < threshold
        })
    }

    /// Keep the first of every group of near-identical crossings
    pub fn deduplicate(
        &self,
        candidates: impl IntoIterator<Item = RawIntersection>,
    ) -> Vec<RawIntersection> {
        let mut accepted = Vec::new();
        for candidate in candidates {
            if !self.is_duplicate(&accepted, &candidate) {
                accepted.push(candidate);
            }
        }
        accepted
    }

    /// Walk the ordered crossings and sum the distance spent inside
    ///
    /// Returns (along_km, boundary_km). Each crossing toggles the state; while
    /// inside, the route from the current crossing edge to the next one (or to
    /// the last point) is added. A route starting inside begins in the inside
    /// state and contributes the leg from its first point to the first
    /// crossing. A route ending inside contributes the closing leg only when
    /// the walk did not already end inside.
    fn accumulate(
        &self,
        points: &[GeoPoint],
        crossings: &[RawIntersection],
        start_inside: bool,
        end_inside: bool,
    ) -> (f64, f64) {
        let radius = self.config.earth_radius_km;
        let last_index = points.len().saturating_sub(1);

        let (Some(first), Some(last)) = (crossings.first(), crossings.last()) else {
            return (0.0, 0.0);
        };

        let mut boundary_km = 0.0;
        if start_inside {
            boundary_km += along_polyline_km(points, 0, first.index, radius);
        }

        let mut state = TraversalState::initial(start_inside);
        let mut along_km = 0.0;
        for (i, crossing) in crossings.iter().enumerate() {
            state = state.toggled();
            if state == TraversalState::Inside {
                let next_index = crossings.get(i + 1).map_or(last_index, |next| next.index);
                along_km += along_polyline_km(points, crossing.index, next_index, radius);
            }
        }

        if end_inside && state == TraversalState::Outside {
            boundary_km += along_polyline_km(points, last.index, last_index, radius);
        }

        (along_km, boundary_km)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::distance_3d_km;
    use crate::utils::project;
    use approx::assert_abs_diff_eq;

    const R: f64 = EARTH_RADIUS_KM;

    /// 0.01° square west of Sacramento: lon -121.50..-121.49, lat 38.50..38.51
    fn square() -> Area {
        Area::polygon(
            "Sector A",
            vec![vec![
                GeoPoint::new(-121.50, 38.50),
                GeoPoint::new(-121.50, 38.51),
                GeoPoint::new(-121.49, 38.51),
                GeoPoint::new(-121.49, 38.50),
                GeoPoint::new(-121.50, 38.50),
            ]],
        )
    }

    fn route(name: &str, lons: &[f64]) -> Route {
        Route::new(
            name,
            lons.iter().map(|&lon| GeoPoint::new(lon, 38.505)).collect(),
        )
    }

    fn sum_edges(points: &[GeoPoint], start: usize, end: usize) -> f64 {
        (start..end)
            .map(|i| distance_3d_km(&points[i], &points[i + 1], R))
            .sum()
    }

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.dedup_threshold_km, 0.003);
        assert_eq!(config.earth_radius_km, 6371.0);
        assert_eq!(config.epsilon, f64::EPSILON);
    }

    #[test]
    fn test_traversal_state_toggles() {
        assert_eq!(TraversalState::Outside.toggled(), TraversalState::Inside);
        assert_eq!(TraversalState::Inside.toggled(), TraversalState::Outside);
        assert_eq!(TraversalState::initial(true), TraversalState::Inside);
        assert_eq!(TraversalState::initial(false), TraversalState::Outside);
    }

    #[test]
    fn test_enter_and_exit_once() {
        let engine = IntersectionEngine::default();
        let route = route("Team 1", &[-121.52, -121.497, -121.493, -121.47]);

        let evaluation = engine.evaluate(&route, &square()).unwrap();
        assert!(!evaluation.start_inside);
        assert!(!evaluation.end_inside);
        let indices: Vec<usize> = evaluation.intersections.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(evaluation.boundary_km, 0.0);

        let result = engine.evaluate_pair(&route, &square()).unwrap().unwrap();
        assert_eq!(result.route_name, "Team 1");
        assert_abs_diff_eq!(
            result.distance_km,
            sum_edges(route.points(), 0, 2),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_route_outside_has_no_result() {
        let engine = IntersectionEngine::default();
        let route = route("Team 2", &[-121.60, -121.58, -121.55]);
        assert!(engine.evaluate_pair(&route, &square()).unwrap().is_none());
    }

    #[test]
    fn test_enclosed_route_without_crossings_has_no_result() {
        let engine = IntersectionEngine::default();
        let route = route("Team 3", &[-121.498, -121.495, -121.492]);

        let evaluation = engine.evaluate(&route, &square()).unwrap();
        assert!(evaluation.start_inside);
        assert!(evaluation.end_inside);
        assert!(!evaluation.has_crossings());
        assert_eq!(evaluation.total_km(), 0.0);
        assert!(engine.evaluate_pair(&route, &square()).unwrap().is_none());
    }

    #[test]
    fn test_start_inside_exit_once() {
        let engine = IntersectionEngine::default();
        let route = route("Team 4", &[-121.498, -121.495, -121.492, -121.485, -121.47]);

        let evaluation = engine.evaluate(&route, &square()).unwrap();
        assert!(evaluation.start_inside);
        assert!(!evaluation.end_inside);
        assert_eq!(evaluation.intersections.len(), 1);
        assert_eq!(evaluation.intersections[0].index, 2);

        let start_leg = sum_edges(route.points(), 0, 2);
        assert_abs_diff_eq!(evaluation.boundary_km, start_leg, epsilon = 1e-9);
        assert_eq!(evaluation.along_km, 0.0);
        assert_abs_diff_eq!(evaluation.total_km(), start_leg, epsilon = 1e-9);
    }

    #[test]
    fn test_enter_once_end_inside() {
        let engine = IntersectionEngine::default();
        let route = route("Team 5", &[-121.52, -121.497, -121.495, -121.493]);

        let evaluation = engine.evaluate(&route, &square()).unwrap();
        assert!(!evaluation.start_inside);
        assert!(evaluation.end_inside);
        assert_eq!(evaluation.intersections.len(), 1);

        // The walk ends inside, so the tail is counted exactly once
        let expected = sum_edges(route.points(), 0, 3);
        assert_abs_diff_eq!(evaluation.along_km, expected, epsilon = 1e-9);
        assert_eq!(evaluation.boundary_km, 0.0);
    }

    #[test]
    fn test_crossing_a_closed_track_area() {
        let engine = IntersectionEngine::default();
        let area = Area::from_track(
            "Segment 1",
            vec![
                GeoPoint::new(-121.49, 38.50),
                GeoPoint::new(-121.50, 38.50),
                GeoPoint::new(-121.50, 38.51),
                GeoPoint::new(-121.49, 38.51),
            ],
        );
        let route = route("Team 6", &[-121.52, -121.497, -121.493, -121.47]);

        // The east side is only present through the appended closing edge
        let evaluation = engine.evaluate(&route, &area).unwrap();
        let indices: Vec<usize> = evaluation.intersections.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2]);
    }

    /// Same square as [`square`] with the east side listed first
    fn square_east_first() -> Area {
        Area::polygon(
            "Sector B",
            vec![vec![
                GeoPoint::new(-121.49, 38.51),
                GeoPoint::new(-121.49, 38.50),
                GeoPoint::new(-121.50, 38.50),
                GeoPoint::new(-121.50, 38.51),
                GeoPoint::new(-121.49, 38.51),
            ]],
        )
    }

    #[test]
    fn test_crossings_sorted_by_route_edge() {
        // The exit on edge 2 is discovered before the entry on edge 0
        let engine = IntersectionEngine::default();
        let route = route("Team 9", &[-121.52, -121.497, -121.493, -121.47]);

        let evaluation = engine.evaluate(&route, &square_east_first()).unwrap();
        let indices: Vec<usize> = evaluation.intersections.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_abs_diff_eq!(
            evaluation.total_km(),
            sum_edges(route.points(), 0, 2),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_same_edge_crossings_keep_discovery_order() {
        let engine = IntersectionEngine::default();
        let route = route("Team 10", &[-121.52, -121.47]);
        let projected = project_all(route.points(), R);
        let west = project(&GeoPoint::new(-121.50, 38.505), R);
        let east = project(&GeoPoint::new(-121.49, 38.505), R);

        for (area, first_side, second_side) in [
            (square(), west, east),
            (square_east_first(), east, west),
        ] {
            let crossings = engine.find_intersections(&projected, &area);
            assert_eq!(crossings.len(), 2);
            assert!(crossings.iter().all(|c| c.index == 0));
            let (a, b) = (crossings[0].point, crossings[1].point);
            assert!((a - first_side).norm() < (a - second_side).norm());
            assert!((b - second_side).norm() < (b - first_side).norm());
        }
    }

    #[test]
    fn test_start_inside_exit_reenter_end_inside() {
        let engine = IntersectionEngine::default();
        let route = Route::new(
            "Team 11",
            vec![
                GeoPoint::new(-121.498, 38.505),
                GeoPoint::new(-121.495, 38.505),
                GeoPoint::new(-121.485, 38.505),
                GeoPoint::new(-121.485, 38.507),
                GeoPoint::new(-121.495, 38.507),
                GeoPoint::new(-121.497, 38.507),
            ],
        );

        let evaluation = engine.evaluate(&route, &square()).unwrap();
        assert!(evaluation.start_inside);
        assert!(evaluation.end_inside);
        let indices: Vec<usize> = evaluation.intersections.iter().map(|i| i.index).collect();
        assert_eq!(indices, vec![1, 3]);

        // The walk ends inside, so no closing leg is added on top
        let points = route.points();
        assert_abs_diff_eq!(
            evaluation.boundary_km,
            sum_edges(points, 0, 1),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!(
            evaluation.along_km,
            sum_edges(points, 3, 5),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_end_leg_added_when_walk_ends_outside() {
        // An even number of crossings with the last point inside, as left
        // behind when a crossing is merged away
        let engine = IntersectionEngine::default();
        let route = route("Team 12", &[-121.52, -121.497, -121.495, -121.494, -121.493]);
        let points = route.points();
        let crossings = [
            RawIntersection::new(0, Vector3::zeros()),
            RawIntersection::new(1, Vector3::new(1000.0, 0.0, 0.0)),
        ];

        let (along_km, boundary_km) = engine.accumulate(points, &crossings, false, true);
        assert_abs_diff_eq!(along_km, sum_edges(points, 0, 1), epsilon = 1e-9);
        assert_abs_diff_eq!(boundary_km, sum_edges(points, 1, 4), epsilon = 1e-9);

        // Same crossings with the last point outside: no closing leg
        let (_, boundary_km) = engine.accumulate(points, &crossings, false, false);
        assert_eq!(boundary_km, 0.0);
    }

    #[test]
    fn test_deduplicate_within_threshold() {
        let engine = IntersectionEngine::default();
        let a = RawIntersection::new(1, Vector3::new(1000.0, 2000.0, 3000.0));
        let b = RawIntersection::new(1, Vector3::new(1001.0, 2001.5, 9000.0));
        let deduped = engine.deduplicate([a, b]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0], a);
    }

    #[test]
    fn test_deduplicate_keeps_distinct() {
        let engine = IntersectionEngine::default();
        let a = RawIntersection::new(1, Vector3::new(1000.0, 2000.0, 0.0));
        // Differs by more than 3 m in X only
        let b = RawIntersection::new(2, Vector3::new(1004.0, 2000.0, 0.0));
        // Differs by more than 3 m in Y only
        let c = RawIntersection::new(3, Vector3::new(1000.0, 2003.5, 0.0));
        assert_eq!(engine.deduplicate([a, b, c]).len(), 3);
    }

    #[test]
    fn test_deduplicate_threshold_is_configurable() {
        let engine = IntersectionEngine::new(EngineConfig {
            dedup_threshold_km: 0.01,
            ..EngineConfig::default()
        });
        let a = RawIntersection::new(1, Vector3::new(0.0, 0.0, 0.0));
        let b = RawIntersection::new(2, Vector3::new(5.0, 5.0, 0.0));
        assert_eq!(engine.deduplicate([a, b]).len(), 1);
    }

    #[test]
    fn test_short_route_is_rejected() {
        let engine = IntersectionEngine::default();
        let lonely = route("Lonely", &[-121.495]);
        let err = engine.evaluate(&lonely, &square()).unwrap_err();
        assert!(matches!(
            err,
            DataError::InsufficientPoints {
                required: 2,
                found: 1,
                ..
            }
        ));

        let empty = route("Empty", &[]);
        assert!(matches!(
            engine.evaluate(&empty, &square()),
            Err(DataError::InsufficientPoints { found: 0, .. })
        ));
    }

    #[test]
    fn test_degenerate_area_is_rejected() {
        let engine = IntersectionEngine::default();
        let route = route("Team 7", &[-121.52, -121.47]);

        let empty = Area::polygon("Nothing", Vec::new());
        assert!(matches!(
            engine.evaluate(&route, &empty),
            Err(DataError::InsufficientPoints { found: 0, .. })
        ));

        let short_track = Area::from_track(
            "Segment 2",
            vec![GeoPoint::new(-121.5, 38.5), GeoPoint::new(-121.4, 38.5)],
        );
        assert!(matches!(
            engine.evaluate(&route, &short_track),
            Err(DataError::InsufficientPoints { found: 3, .. })
        ));
    }

    #[test]
    fn test_unclosed_ring_is_rejected() {
        let engine = IntersectionEngine::default();
        let route = route("Team 8", &[-121.52, -121.47]);
        let open = Area::polygon(
            "Open",
            vec![vec![
                GeoPoint::new(-121.50, 38.50),
                GeoPoint::new(-121.50, 38.51),
                GeoPoint::new(-121.49, 38.51),
                GeoPoint::new(-121.49, 38.50),
            ]],
        );
        assert!(matches!(
            engine.evaluate(&route, &open),
            Err(DataError::UnclosedRing { ring: 0, .. })
        ));
    }

    #[test]
    fn test_area_result_totals() {
        let mut area = AreaResult::new("Sector B");
        assert!(!area.has_intersecting_routes());
        area.intersection_results.push(IntersectionResult {
            route_name: "a".into(),
            distance_km: 1.25,
        });
        area.intersection_results.push(IntersectionResult {
            route_name: "b".into(),
            distance_km: 0.75,
        });
        assert!(area.has_intersecting_routes());
        assert_abs_diff_eq!(area.total_distance_km(), 2.0, epsilon = 1e-12);
    }
}
