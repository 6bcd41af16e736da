//! Area Coverage Library - Route x Area Crossing Engine
//!
//! This library ingests search-and-rescue GeoJSON (routes a team traveled and
//! areas of interest) and computes, per area, which routes crossed it and how
//! far each route traveled inside.
//!
//! # Architecture
//!
//! - **[`GeoPoint`]**, **[`Route`]**, **[`Area`]**: immutable geometry handed to the engine
//! - **[`utils`]**: projection of geodetic points into a Cartesian frame in meters
//! - **[`intersect`]**: finite 3D segment intersection
//! - **[`containment`]**: even-odd ray casting over one or more rings
//! - **[`distance`]**: haversine, 3D and along-polyline distances
//! - **[`IntersectionEngine`]**: per (route, area) crossings and traversed distance
//! - **[`FeatureCollection`]**: GeoJSON ingestion and route/area classification
//! - **[`BatchRunner`]**: parallel evaluation of every area against every route
//!
//! # Model limitations
//!
//! The projection embeds every point independently against a fixed origin at
//! (0°, 0°) on a spherical earth. It is adequate for crossing tests over
//! field-sized extents and degrades for geometries spanning very large areas or
//! the ±180° meridian.

mod area;
mod batch;
mod collection;
pub mod containment;
pub mod distance;
mod engine;
pub mod geojson_reader;
pub mod intersect;
mod point;
mod route;
pub mod utils;

// Public API exports
pub use area::{Area, AreaShape};
pub use batch::{BatchRunner, CoverageReport, PairFailure};
pub use collection::{CollectionInfo, Config, FeatureCollection};
pub use engine::{
    AreaResult, EngineConfig, IntersectionEngine, IntersectionResult, PairEvaluation,
    RawIntersection, TraversalState,
};
pub use geojson_reader::Feature;
pub use point::GeoPoint;
pub use route::Route;

/// Error types for the coverage library
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("GeoJSON parsing error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Insufficient points in '{feature}': need at least {required}, found {found}")]
    InsufficientPoints {
        feature: String,
        required: usize,
        found: usize,
    },

    #[error("Ring {ring} of '{feature}' is not closed")]
    UnclosedRing { feature: String, ring: usize },

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DataError>;
