use area_coverage_lib::geojson_reader::check_extension;
use area_coverage_lib::{Config, EngineConfig};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// Area Coverage - Which search routes crossed which areas, and how far inside
pub struct Cli {
    /// GeoJSON data file (.json, .geojson or .txt)
    #[clap(value_parser = parse_data_file)]
    pub data_file: PathBuf,

    /// Where the text report is written
    #[clap(short = 'l', long = "log", default_value = "rt.log")]
    pub log_file: PathBuf,

    /// Echo the text report to stdout, including route lengths
    #[clap(short, long)]
    pub verbose: bool,

    /// Print the report as JSON on stdout
    #[clap(long)]
    pub json: bool,

    /// Crossings closer than this are merged (km)
    #[clap(long, default_value_t = 0.003, value_parser = parse_positive_km)]
    pub dedup_threshold: f64,

    /// Radius of the reference sphere (km)
    #[clap(long, default_value_t = 6371.0, value_parser = parse_positive_km)]
    pub earth_radius: f64,

    /// Line strings named with this prefix are areas
    #[clap(long, default_value = "Segment ")]
    pub area_prefix: String,
}

impl Cli {
    /// Library configuration for these arguments
    pub fn config(&self) -> Config {
        Config {
            engine: EngineConfig {
                dedup_threshold_km: self.dedup_threshold,
                earth_radius_km: self.earth_radius,
                ..EngineConfig::default()
            },
            area_name_prefix: self.area_prefix.clone(),
            ..Config::default()
        }
    }
}

fn parse_data_file(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    check_extension(&path).map_err(|_| {
        format!("'{value}' must have a .json, .geojson or .txt extension")
    })?;
    if !path.is_file() {
        return Err(format!("could not open file '{value}'"));
    }
    Ok(path)
}

fn parse_positive_km(value: &str) -> Result<f64, String> {
    match value.parse::<f64>() {
        Ok(km) if km.is_finite() && km > 0.0 => Ok(km),
        Ok(_) => Err(format!("'{value}' must be a positive number of kilometers")),
        Err(e) => Err(e.to_string()),
    }
}
