//! FeatureCollection - Top-level manager for routes, areas and waypoints
//!
//! This module provides the high-level API: ingest GeoJSON features, sort them
//! into routes and areas, and run the crossing analysis over all of them.

use crate::geojson_reader::{self, Feature};
use crate::{Area, BatchRunner, CoverageReport, DataError, EngineConfig, GeoPoint, Result, Route};

use geo::Rect;
use rayon::prelude::*;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for ingestion and analysis
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Engine constants used by [`FeatureCollection::run`]
    pub engine: EngineConfig,
    /// Line strings whose name starts with this are areas, not routes.
    /// Default: "Segment "
    pub area_name_prefix: String,
    /// Consecutive track points closer than this are dropped (km).
    /// Default: 0.001
    pub min_point_spacing_km: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            area_name_prefix: "Segment ".to_string(),
            min_point_spacing_km: 0.001,
        }
    }
}

/// Information about the feature collection
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CollectionInfo {
    /// Number of routes loaded
    pub route_count: usize,
    /// Number of areas loaded (polygons and closed tracks)
    pub area_count: usize,
    /// Number of standalone points
    pub waypoint_count: usize,
    /// Total number of route points
    pub total_points: usize,
    /// Total 3D length of all routes in kilometers
    pub total_distance_km: f64,
}

/// Cached route statistics, updated as routes are added
#[derive(Debug, Clone, Default)]
struct CachedStats {
    total_points: usize,
    total_distance_km: f64,
    bounding_box_wgs84: Option<Rect<f64>>,
}

/// Routes, areas and waypoints read from one or more GeoJSON documents
#[derive(Debug, Clone, Default)]
pub struct FeatureCollection {
    routes: Vec<Route>,
    areas: Vec<Area>,
    waypoints: Vec<GeoPoint>,
    config: Config,
    cached_stats: CachedStats,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl FeatureCollection {
    /// Create an empty collection with the given configuration
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Build a collection from already parsed features
    pub fn from_features(features: impl IntoIterator<Item = Feature>, config: Config) -> Self {
        let mut collection = Self::new(config);
        collection.add_features(features);
        collection
    }

    /// Parse GeoJSON text into a new collection
    pub fn from_geojson_str(text: &str, config: Config) -> Result<Self> {
        let features = geojson_reader::parse_str(text, &config)?;
        Ok(Self::from_features(features, config))
    }

    /// Classify and store one feature
    ///
    /// Polygons become areas. Line strings become areas when their name starts
    /// with the configured prefix, routes otherwise. Points are waypoints.
    pub fn add_feature(&mut self, feature: Feature) {
        match feature {
            Feature::Point(point) => self.waypoints.push(point),
            Feature::Polygon { name, rings } => self.areas.push(Area::polygon(name, rings)),
            Feature::LineString { name, points } => {
                if name.starts_with(&self.config.area_name_prefix) {
                    self.areas.push(Area::from_track(name, points));
                } else {
                    let radius = self.config.engine.earth_radius_km;
                    let route = Route::with_earth_radius(name, points, radius);
                    self.update_stats_for_added_route(&route);
                    self.routes.push(route);
                }
            }
        }
    }

    pub fn add_features(&mut self, features: impl IntoIterator<Item = Feature>) {
        for feature in features {
            self.add_feature(feature);
        }
    }

    /// Load GeoJSON files in parallel
    ///
    /// Features are added in the order of `paths`. Nothing is added if any
    /// file fails to load.
    pub fn load_from_files<P: AsRef<Path> + Send + Sync>(&mut self, paths: &[P]) -> Result<()> {
        #[cfg(feature = "profiling")]
        profiling::scope!("collection::load_from_files");

        let config = &self.config;
        let per_file: Vec<Vec<Feature>> = paths
            .par_iter()
            .map(|path| geojson_reader::read_file(path, config))
            .collect::<Result<_>>()?;

        for features in per_file {
            self.add_features(features);
        }

        tracing::info!(
            "Loaded {} files: {} routes, {} areas, {} waypoints",
            paths.len(),
            self.routes.len(),
            self.areas.len(),
            self.waypoints.len()
        );
        Ok(())
    }

    /// Evaluate every area against every route
    pub fn run(&self) -> CoverageReport {
        self.runner().run(&self.routes, &self.areas)
    }

    /// A batch runner configured like this collection
    pub fn runner(&self) -> BatchRunner {
        BatchRunner::new(self.config.engine.clone())
    }

    /// Replace the altitudes of one route, e.g. after an elevation lookup
    pub fn set_route_altitudes(&mut self, index: usize, altitudes: &[f64]) -> Result<()> {
        let Some(route) = self.routes.get_mut(index) else {
            return Err(DataError::InvalidGeometry(format!(
                "no route at index {index}"
            )));
        };
        route.set_altitudes(altitudes)?;
        self.rebuild_cached_stats();
        Ok(())
    }

    #[inline]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[inline]
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    #[inline]
    pub fn waypoints(&self) -> &[GeoPoint] {
        &self.waypoints
    }

    #[inline]
    pub fn get_route(&self, index: usize) -> Option<&Route> {
        self.routes.get(index)
    }

    #[inline]
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    #[inline]
    pub fn area_count(&self) -> usize {
        self.areas.len()
    }

    /// Total number of route points
    ///
    /// This is O(1) as the value is cached and updated incrementally.
    #[inline]
    pub fn total_points(&self) -> usize {
        self.cached_stats.total_points
    }

    /// Total 3D length of all routes in kilometers
    ///
    /// This is O(1) as the value is cached and updated incrementally.
    #[inline]
    pub fn total_distance_km(&self) -> f64 {
        self.cached_stats.total_distance_km
    }

    #[inline]
    pub fn get_info(&self) -> CollectionInfo {
        CollectionInfo {
            route_count: self.routes.len(),
            area_count: self.areas.len(),
            waypoint_count: self.waypoints.len(),
            total_points: self.cached_stats.total_points,
            total_distance_km: self.cached_stats.total_distance_km,
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty() && self.areas.is_empty() && self.waypoints.is_empty()
    }

    /// Remove every feature, keeping the configuration
    pub fn clear(&mut self) {
        self.routes.clear();
        self.areas.clear();
        self.waypoints.clear();
        self.cached_stats = CachedStats::default();
    }

    /// Combined bounding box of all routes in degrees (x = lon, y = lat)
    ///
    /// Returns `None` if no route has points.
    #[inline]
    pub fn bounding_box_wgs84(&self) -> Option<Rect<f64>> {
        self.cached_stats.bounding_box_wgs84
    }

    fn update_stats_for_added_route(&mut self, route: &Route) {
        self.cached_stats.total_points += route.total_points();
        self.cached_stats.total_distance_km += route.length_3d_km();

        let Some(route_bbox) = route.bounding_box() else {
            return;
        };
        self.cached_stats.bounding_box_wgs84 = Some(match self.cached_stats.bounding_box_wgs84 {
            Some(bbox) => Rect::new(
                geo::Coord {
                    x: bbox.min().x.min(route_bbox.min().x),
                    y: bbox.min().y.min(route_bbox.min().y),
                },
                geo::Coord {
                    x: bbox.max().x.max(route_bbox.max().x),
                    y: bbox.max().y.max(route_bbox.max().y),
                },
            ),
            None => route_bbox,
        });
    }

    fn rebuild_cached_stats(&mut self) {
        self.cached_stats = CachedStats::default();
        let routes = std::mem::take(&mut self.routes);
        for route in &routes {
            self.update_stats_for_added_route(route);
        }
        self.routes = routes;
    }
}
