use area_coverage_cli::{Cli, execute, logging};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::setup_logging();
    execute(&cli)
}
