//! Areas tested for route crossings
//!
//! An area is either a polygon (one or more closed rings) or a track
//! reinterpreted as a closed loop. Both shapes expose their boundary as a
//! list of rings so the engine dispatches on the shape only once.

use crate::{GeoPoint, Route, containment};

/// Boundary geometry of an [`Area`]
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AreaShape {
    /// Closed rings: outer boundary first, then holes
    Polygon(Vec<Vec<GeoPoint>>),
    /// A track closed into a single ring (closing point already appended)
    ClosedTrack(Vec<GeoPoint>),
}

/// A named region whose crossings are being counted
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Area {
    name: String,
    shape: AreaShape,
}

impl Area {
    /// Create a polygon area from its rings
    pub fn polygon(name: impl Into<String>, rings: Vec<Vec<GeoPoint>>) -> Self {
        Self {
            name: name.into(),
            shape: AreaShape::Polygon(rings),
        }
    }

    /// Create an area from an open track, appending a copy of its first point
    pub fn from_track(name: impl Into<String>, mut points: Vec<GeoPoint>) -> Self {
        if let Some(first) = points.first().cloned() {
            points.push(first);
        }
        Self {
            name: name.into(),
            shape: AreaShape::ClosedTrack(points),
        }
    }

    /// Reinterpret a route as an area boundary
    pub fn from_route(route: &Route) -> Self {
        Self::from_track(route.name(), route.points().to_vec())
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn shape(&self) -> &AreaShape {
        &self.shape
    }

    /// Boundary rings of this area
    #[inline]
    pub fn rings(&self) -> &[Vec<GeoPoint>] {
        match &self.shape {
            AreaShape::Polygon(rings) => rings,
            AreaShape::ClosedTrack(points) => std::slice::from_ref(points),
        }
    }

    /// Whether this area was built from a track
    #[inline]
    pub fn is_closed_track(&self) -> bool {
        matches!(self.shape, AreaShape::ClosedTrack(_))
    }

    /// Even-odd containment over all rings
    #[inline]
    pub fn contains(&self, point: &GeoPoint) -> bool {
        containment::point_in_rings(point, self.rings())
    }

    /// Total number of boundary vertices across all rings
    pub fn total_points(&self) -> usize {
        self.rings().iter().map(Vec::len).sum()
    }
}
