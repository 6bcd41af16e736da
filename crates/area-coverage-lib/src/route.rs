//! Route storage module
//!
//! This module provides the `Route` struct: an ordered track a team traveled,
//! with precomputed metadata like bounding box and 2D/3D lengths.

use crate::distance::{polyline_length_2d_km, polyline_length_3d_km};
use crate::utils::EARTH_RADIUS_KM;
use crate::{DataError, GeoPoint, Result};
use geo::Rect;

/// A named polyline with cached metadata
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    /// Name (GeoJSON `title`)
    name: String,
    /// Ordered track points
    points: Vec<GeoPoint>,
    /// Bounding box in degrees (x = lon, y = lat), `None` for an empty route
    bounding_box_wgs84: Option<Rect<f64>>,
    /// Cached length ignoring altitude, in kilometers
    cached_length_2d_km: f64,
    /// Cached length including altitude changes, in kilometers
    cached_length_3d_km: f64,
    /// Sphere radius the cached lengths were measured on
    earth_radius_km: f64,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Route {
    /// Create a new Route from its points
    ///
    /// Routes with fewer than two points are accepted here; the engine rejects
    /// them per evaluated pair so one bad track does not abort a batch.
    pub fn new(name: impl Into<String>, points: Vec<GeoPoint>) -> Self {
        Self::with_earth_radius(name, points, EARTH_RADIUS_KM)
    }

    /// Create a new Route whose lengths are measured on a sphere of the given radius
    pub fn with_earth_radius(
        name: impl Into<String>,
        points: Vec<GeoPoint>,
        earth_radius_km: f64,
    ) -> Self {
        let (bounding_box_wgs84, length_2d, length_3d) =
            Self::compute_metadata(&points, earth_radius_km);
        Self {
            name: name.into(),
            points,
            bounding_box_wgs84,
            cached_length_2d_km: length_2d,
            cached_length_3d_km: length_3d,
            earth_radius_km,
        }
    }

    /// Compute all metadata in a single place
    ///
    /// Returns (bounding_box, length_2d_km, length_3d_km)
    fn compute_metadata(
        points: &[GeoPoint],
        earth_radius_km: f64,
    ) -> (Option<Rect<f64>>, f64, f64) {
        let bounding_box = points.first().map(|first| {
            let mut min_x = first.longitude();
            let mut min_y = first.latitude();
            let mut max_x = min_x;
            let mut max_y = min_y;
            for point in &points[1..] {
                min_x = min_x.min(point.longitude());
                min_y = min_y.min(point.latitude());
                max_x = max_x.max(point.longitude());
                max_y = max_y.max(point.latitude());
            }
            Rect::new(
                geo::Coord { x: min_x, y: min_y },
                geo::Coord { x: max_x, y: max_y },
            )
        });

        (
            bounding_box,
            polyline_length_2d_km(points, earth_radius_km),
            polyline_length_3d_km(points, earth_radius_km),
        )
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[inline]
    pub fn total_points(&self) -> usize {
        self.points.len()
    }

    /// Radius of the sphere the lengths are measured on (km)
    #[inline]
    pub fn earth_radius_km(&self) -> f64 {
        self.earth_radius_km
    }

    #[inline]
    pub fn first_point(&self) -> Option<&GeoPoint> {
        self.points.first()
    }

    #[inline]
    pub fn last_point(&self) -> Option<&GeoPoint> {
        self.points.last()
    }

    /// Bounding box in degrees, `None` for an empty route
    #[inline]
    pub fn bounding_box(&self) -> Option<Rect<f64>> {
        self.bounding_box_wgs84
    }

    /// Length ignoring altitude, in kilometers
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn length_2d_km(&self) -> f64 {
        self.cached_length_2d_km
    }

    /// Length including altitude changes, in kilometers
    ///
    /// This is O(1) as the value is cached during construction.
    #[inline]
    pub fn length_3d_km(&self) -> f64 {
        self.cached_length_3d_km
    }

    /// Whether the name marks this track as an area boundary
    #[inline]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.name.starts_with(prefix)
    }

    /// Overwrite every altitude, e.g. after elevation lookup
    ///
    /// Fails if `altitudes` does not have exactly one value per point.
    pub fn set_altitudes(&mut self, altitudes: &[f64]) -> Result<()> {
        if altitudes.len() != self.points.len() {
            return Err(DataError::InvalidGeometry(format!(
                "route '{}' has {} points but {} altitudes were given",
                self.name,
                self.points.len(),
                altitudes.len()
            )));
        }

        self.points = self
            .points
            .iter()
            .zip(altitudes)
            .map(|(point, &altitude)| point.at_altitude(altitude))
            .collect();

        let (bounding_box, length_2d, length_3d) =
            Self::compute_metadata(&self.points, self.earth_radius_km);
        self.bounding_box_wgs84 = bounding_box;
        self.cached_length_2d_km = length_2d;
        self.cached_length_3d_km = length_3d;
        Ok(())
    }
}
