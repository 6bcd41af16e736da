//! Area Coverage CLI
//!
//! Reads one GeoJSON file, evaluates every area against every route and writes
//! a text log. Kept as a library so the whole run can be tested without
//! spawning the binary.

mod cli;
pub mod logging;
pub mod report;

pub use cli::Cli;

use anyhow::Context;
use area_coverage_lib::{CoverageReport, FeatureCollection};
use std::time::Instant;

/// Everything produced by one run
#[derive(Debug)]
pub struct Outcome {
    pub collection: FeatureCollection,
    pub report: CoverageReport,
    /// The text log, as written to the log file
    pub text: String,
}

/// Load the data file, evaluate it and write the text log
pub fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    #[cfg(feature = "profiling")]
    profiling::scope!("cli::run");

    let mut collection = FeatureCollection::new(cli.config());
    collection
        .load_from_files(&[&cli.data_file])
        .with_context(|| format!("Failed to process file '{}'", cli.data_file.display()))?;

    let info = collection.get_info();
    tracing::info!(
        "Read {} routes, {} areas and {} waypoints from '{}'",
        info.route_count,
        info.area_count,
        info.waypoint_count,
        cli.data_file.display()
    );

    let report = collection.run();
    let text = report::render_text(&cli.data_file, &collection, &report, cli.verbose)?;

    std::fs::write(&cli.log_file, &text)
        .with_context(|| format!("Failed to write log file '{}'", cli.log_file.display()))?;

    Ok(Outcome {
        collection,
        report,
        text,
    })
}

/// Run and print to stdout the way the command line tool does
pub fn execute(cli: &Cli) -> anyhow::Result<()> {
    let start = Instant::now();
    let outcome = run(cli)?;
    let elapsed = start.elapsed();

    if cli.json {
        println!("{}", report::render_json(&outcome.report)?);
    } else {
        if cli.verbose {
            print!("{}", outcome.text);
        }
        println!("Processing complete. Check the output file for results.");
        println!("Execution time: {} ms", elapsed.as_millis());
    }

    tracing::info!(
        "Wrote '{}' in {} ms ({} failed pairs)",
        cli.log_file.display(),
        elapsed.as_millis(),
        outcome.report.failures.len()
    );
    Ok(())
}
