//! GeoJSON ingestion
//!
//! Reads a GeoJSON document into [`Feature`]s. Only `Point`, `LineString` and
//! `Polygon` geometries are understood; anything else is skipped. A feature's
//! name is its `title` property.

use crate::utils::{METERS_PER_KM, project};
use crate::{Config, DataError, GeoPoint, Result};
use geojson::{GeoJson, Value};
use std::path::Path;

/// Name property used by the field mapping tools
const TITLE_PROPERTY: &str = "title";

/// File extensions accepted by [`read_file`] (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["json", "geojson", "txt"];

/// One parsed GeoJSON feature
#[derive(Clone, Debug)]
pub enum Feature {
    Point(GeoPoint),
    LineString { name: String, points: Vec<GeoPoint> },
    Polygon { name: String, rings: Vec<Vec<GeoPoint>> },
}

impl Feature {
    pub fn name(&self) -> &str {
        match self {
            Feature::Point(point) => point.name().unwrap_or_default(),
            Feature::LineString { name, .. } | Feature::Polygon { name, .. } => name,
        }
    }
}

/// Parse GeoJSON text
pub fn parse_str(text: &str, config: &Config) -> Result<Vec<Feature>> {
    let geojson = text.parse::<GeoJson>().map_err(|err| match err {
        geojson::Error::PositionTooShort(len) => {
            DataError::InvalidGeometry(format!("position with {len} values"))
        }
        other => DataError::from(other),
    })?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![geojson::Feature::from(geometry)],
    };

    let mut parsed = Vec::with_capacity(features.len());
    for feature in &features {
        if let Some(feature) = convert_feature(feature, config)? {
            parsed.push(feature);
        }
    }

    tracing::debug!(
        "Parsed {} of {} GeoJSON features",
        parsed.len(),
        features.len()
    );
    Ok(parsed)
}

/// Read and parse a GeoJSON file
pub fn read_file(path: impl AsRef<Path>, config: &Config) -> Result<Vec<Feature>> {
    let path = path.as_ref();
    check_extension(path)?;
    let text = std::fs::read_to_string(path)?;
    parse_str(&text, config)
}

/// Reject files whose extension is not one of [`SUPPORTED_EXTENSIONS`]
pub fn check_extension(path: &Path) -> Result<()> {
    let supported = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        });

    if supported {
        Ok(())
    } else {
        Err(DataError::UnsupportedFile(path.display().to_string()))
    }
}

fn feature_name(feature: &geojson::Feature) -> String {
    match feature.property(TITLE_PROPERTY) {
        Some(serde_json::Value::String(title)) => title.clone(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn convert_feature(feature: &geojson::Feature, config: &Config) -> Result<Option<Feature>> {
    let Some(geometry) = &feature.geometry else {
        tracing::debug!("Skipping feature without geometry");
        return Ok(None);
    };
    let name = feature_name(feature);

    let converted = match &geometry.value {
        Value::Point(position) => Feature::Point(to_point(position, &name)?.named(name)),
        Value::LineString(positions) => Feature::LineString {
            points: thin_track(positions, config, &name)?,
            name,
        },
        Value::Polygon(rings) => Feature::Polygon {
            rings: rings
                .iter()
                .map(|ring| {
                    ring.iter()
                        .map(|position| to_point(position, &name))
                        .collect::<Result<Vec<_>>>()
                })
                .collect::<Result<Vec<_>>>()?,
            name,
        },
        other => {
            tracing::debug!(
                "Skipping unsupported geometry '{}' of feature '{}'",
                geometry_kind(other),
                name
            );
            return Ok(None);
        }
    };

    Ok(Some(converted))
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// `[lon, lat, alt?]` to a point; altitude defaults to 0
fn to_point(position: &[f64], feature: &str) -> Result<GeoPoint> {
    match *position {
        [longitude, latitude] => Ok(GeoPoint::new(longitude, latitude)),
        [longitude, latitude, altitude, ..] => {
            Ok(GeoPoint::with_altitude(longitude, latitude, altitude))
        }
        _ => Err(DataError::InvalidGeometry(format!(
            "position with {} values in '{}'",
            position.len(),
            feature
        ))),
    }
}

/// Drop points closer than the configured spacing to the previous raw point
///
/// The comparison is against the point seen just before, kept or not, so a
/// slow drift is thinned without collapsing into one point.
fn thin_track(positions: &[Vec<f64>], config: &Config, feature: &str) -> Result<Vec<GeoPoint>> {
    let radius = config.engine.earth_radius_km;
    let min_spacing_m = config.min_point_spacing_km * METERS_PER_KM;

    let mut points = Vec::with_capacity(positions.len());
    let mut previous = None;
    for position in positions {
        let point = to_point(position, feature)?;
        let projected = project(&point, radius);

        let keep = previous.is_none_or(|prev: nalgebra::Vector3<f64>| {
            (projected - prev).norm() > min_spacing_m
        });
        if keep {
            points.push(point);
        }
        previous = Some(projected);
    }

    if points.len() < positions.len() {
        tracing::debug!(
            "Thinned '{}' from {} to {} points",
            feature,
            positions.len(),
            points.len()
        );
    }
    Ok(points)
}
