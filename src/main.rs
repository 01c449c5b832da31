//! EU Vaccine Report - CLI entry point
//!
//! Downloads the ECDC vaccination, variant and country-code CSV files,
//! aggregates them and writes the summary tables and charts.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eu_vaccine_report::config::Config;
use eu_vaccine_report::Pipeline;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};

const DEFAULT_LOGGING_LEVEL: &str = "info";

#[derive(Parser, Debug)]
#[command(name = "eu_vaccine_report")]
#[command(about = "EU COVID-19 vaccine rollout report", long_about = None)]
struct Cli {
    /// TOML config file; defaults are used when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for the downloaded CSV files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Directory for exported tables and charts
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download the three source CSV files
    Fetch,
    /// Aggregate the cached CSV files and render the charts
    Report {
        /// Open the charts in the system viewer afterwards
        #[arg(long)]
        show: bool,
    },
    /// Fetch, then report
    Run {
        #[arg(long)]
        show: bool,
    },
}

fn main() -> Result<()> {
    // Set RUST_LOG to `DEFAULT_LOGGING_LEVEL` if not set
    let _ =
        std::env::var("RUST_LOG").map_err(|_| std::env::set_var("RUST_LOG", DEFAULT_LOGGING_LEVEL));
    pretty_env_logger::init_timed();

    let args = Cli::parse();
    debug!("args: {args:?}");
    let config = read_config(&args)?;
    let pipeline = Pipeline::new(config);

    match args.command {
        Command::Fetch => {
            pipeline.fetch()?;
        }
        Command::Report { show } => report(&pipeline, show)?,
        Command::Run { show } => {
            pipeline.fetch()?;
            report(&pipeline, show)?;
        }
    }
    Ok(())
}

fn read_config(args: &Cli) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_toml_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    Ok(config)
}

fn report(pipeline: &Pipeline, show: bool) -> Result<()> {
    let output = pipeline.report()?;
    info!(
        "Wrote {} tables and {} charts",
        output.tables.len(),
        output.charts.len()
    );
    if show {
        output.charts.iter().for_each(|chart| open_chart(chart));
    }
    Ok(())
}

fn open_chart(path: &Path) {
    if let Err(e) = open::that(path) {
        warn!("Could not open {}: {e}", path.display());
    }
}
