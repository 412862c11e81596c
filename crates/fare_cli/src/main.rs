mod cli;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use crate::cli::Cli;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let stats = cli::run(&cli)?;

    info!(
        "wrote {} fares ({} records read, {} skipped, {} segments rejected)",
        stats.fares_written, stats.records_read, stats.records_skipped, stats.segments_rejected
    );
    Ok(())
}
