//! Text and JSON renderings of a coverage report

use area_coverage_lib::{Area, CoverageReport, FeatureCollection, Route};
use std::fmt::Write;
use std::path::Path;

const SEPARATOR: &str =
    "------------------------------------------------------------------------------------";

/// Render the text log
///
/// Areas and routes are listed first, then one block per area with the
/// distance traveled inside by every crossing route. Pairs that could not be
/// evaluated follow. With `verbose`, 2D and 3D route lengths are appended.
pub fn render_text(
    source: &Path,
    collection: &FeatureCollection,
    report: &CoverageReport,
    verbose: bool,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();

    writeln!(out, "Results:")?;
    writeln!(out, "Processing file: {}", source.display())?;
    writeln!(out, "{SEPARATOR}")?;

    writeln!(out, "Areas:")?;
    for area in collection.areas().iter().map(Area::name) {
        writeln!(out, "  {area}")?;
    }

    writeln!(out, "\nRoutes:")?;
    for route in collection.routes().iter().map(Route::name) {
        writeln!(out, "  {route}")?;
    }

    writeln!(out, "\nIntersection Results:")?;
    writeln!(out, "{SEPARATOR}")?;
    for area in &report.areas {
        writeln!(out, "Area: {}", area.name)?;
        for result in &area.intersection_results {
            writeln!(out, "--> Route: {}", result.route_name)?;
            writeln!(
                out,
                "  Total distance of route: {:.2} kilometers",
                result.distance_km
            )?;
        }

        if area.has_intersecting_routes() {
            writeln!(
                out,
                "Total traversed in Area {} --> {:.2} kilometers",
                area.name,
                area.total_distance_km()
            )?;
        } else {
            writeln!(out, "  No intersecting routes")?;
        }
        writeln!(out, "{SEPARATOR}")?;
    }

    if !report.failures.is_empty() {
        writeln!(out, "\nSkipped pairs:")?;
        for failure in &report.failures {
            writeln!(
                out,
                "  Area {} x Route {}: {}",
                failure.area, failure.route, failure.error
            )?;
        }
    }

    if report.cancelled {
        writeln!(out, "\nCancelled: results are partial")?;
    }

    if verbose {
        writeln!(out, "\nRoute lengths:")?;
        for route in collection.routes() {
            writeln!(
                out,
                "  {}: 2D {:.2} km, 3D {:.2} km, difference {:.2} km",
                route.name(),
                route.length_2d_km(),
                route.length_3d_km(),
                route.length_3d_km() - route.length_2d_km()
            )?;
        }
    }

    Ok(out)
}

/// Render the report as pretty-printed JSON
pub fn render_json(report: &CoverageReport) -> serde_json::Result<String> {
    serde_json::to_string_pretty(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use area_coverage_lib::{
        AreaResult, Config, DataError, Feature, GeoPoint, IntersectionResult, PairFailure,
    };

    fn create_test_collection() -> FeatureCollection {
        FeatureCollection::from_features(
            vec![
                Feature::Polygon {
                    name: "Sector A".to_string(),
                    rings: Vec::new(),
                },
                Feature::LineString {
                    name: "Segment 2".to_string(),
                    points: Vec::new(),
                },
                Feature::LineString {
                    name: "Team 1".to_string(),
                    points: vec![
                        GeoPoint::with_altitude(-121.50, 38.50, 0.0),
                        GeoPoint::with_altitude(-121.49, 38.50, 100.0),
                    ],
                },
            ],
            Config::default(),
        )
    }

    fn create_test_report() -> CoverageReport {
        let mut crossed = AreaResult::new("Sector A");
        crossed.intersection_results.push(IntersectionResult {
            route_name: "Team 1".to_string(),
            distance_km: 1.2345,
        });
        CoverageReport {
            areas: vec![crossed, AreaResult::new("Segment 2")],
            failures: vec![PairFailure {
                area: "Segment 2".to_string(),
                route: "Team 1".to_string(),
                error: DataError::InsufficientPoints {
                    feature: "Segment 2".to_string(),
                    required: 4,
                    found: 0,
                },
            }],
            cancelled: false,
        }
    }

    #[test]
    fn test_text_layout() {
        let text = render_text(
            Path::new("mission.geojson"),
            &create_test_collection(),
            &create_test_report(),
            false,
        )
        .unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Results:");
        assert_eq!(lines[1], "Processing file: mission.geojson");
        assert_eq!(lines[2], SEPARATOR);
        assert_eq!(lines[3], "Areas:");
        assert_eq!(lines[4], "  Sector A");
        assert_eq!(lines[5], "  Segment 2");
        assert_eq!(lines[6], "");
        assert_eq!(lines[7], "Routes:");
        assert_eq!(lines[8], "  Team 1");

        assert!(text.contains(
            "Area: Sector A\n--> Route: Team 1\n  Total distance of route: 1.23 kilometers\n\
             Total traversed in Area Sector A --> 1.23 kilometers\n"
        ));
        assert!(text.contains("Area: Segment 2\n  No intersecting routes\n"));
        assert!(text.contains("Skipped pairs:\n  Area Segment 2 x Route Team 1: Insufficient points"));
        assert!(!text.contains("Route lengths:"));
        assert!(!text.contains("Cancelled"));
    }

    #[test]
    fn test_verbose_adds_route_lengths() {
        let text = render_text(
            Path::new("mission.geojson"),
            &create_test_collection(),
            &CoverageReport::default(),
            true,
        )
        .unwrap();
        assert!(text.contains("Route lengths:\n  Team 1: 2D 0.87 km, 3D 0.88 km"));
        assert!(!text.contains("Skipped pairs:"));
    }

    #[test]
    fn test_cancelled_is_reported() {
        let report = CoverageReport {
            cancelled: true,
            ..CoverageReport::default()
        };
        let text = render_text(
            Path::new("mission.json"),
            &create_test_collection(),
            &report,
            false,
        )
        .unwrap();
        assert!(text.contains("Cancelled: results are partial"));
    }

    #[test]
    fn test_json() {
        let json = render_json(&create_test_report()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["areas"][0]["name"], "Sector A");
        assert_eq!(
            value["areas"][0]["intersection_results"][0]["route_name"],
            "Team 1"
        );
        assert_eq!(value["failures"][0]["area"], "Segment 2");
        assert!(
            value["failures"][0]["error"]
                .as_str()
                .unwrap()
                .starts_with("Insufficient points")
        );
        assert_eq!(value["cancelled"], false);
    }
}
