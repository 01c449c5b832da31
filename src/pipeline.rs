//! Fetch → clean → join → aggregate → present, as one linear run.

use crate::aggregate::{self, AggregateViews, JoinDiagnostics};
use crate::charts::StaticChartRenderer;
use crate::config::Config;
use crate::data::{DataLoader, DataProcessor};
use crate::fetch::{self, Fetched};
use anyhow::{Context, Result};
use log::{debug, info};
use polars::prelude::*;
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};

pub const ROLLOUT_CSV: &str = "rollout.csv";
pub const SUPPLY_CSV: &str = "supply.csv";
pub const BREAKDOWN_CSV: &str = "vaccine_breakdown.csv";
pub const DOSE_STAGES_CSV: &str = "dose_stages.csv";
pub const SUMMARY_JSON: &str = "summary.json";

/// The three cleaned source tables.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub vaccinations: DataFrame,
    pub countries: DataFrame,
    pub variants: DataFrame,
}

/// Counts describing one run; written next to the exported views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub vaccination_rows: usize,
    pub country_rows: usize,
    pub variant_rows: usize,
    pub variant_columns: usize,
    pub join: JoinDiagnostics,
    pub rollout_countries: usize,
    pub vaccine_types: usize,
    pub dose_stage_rows: usize,
}

/// Aggregate views plus the summary of how they were produced.
#[derive(Debug, Clone)]
pub struct Report {
    pub views: AggregateViews,
    pub summary: RunSummary,
}

/// Files written by [`Pipeline::report`].
#[derive(Debug, Clone, Default)]
pub struct ReportOutput {
    pub tables: Vec<PathBuf>,
    pub charts: Vec<PathBuf>,
}

pub struct Pipeline {
    pub config: Config,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        debug!("config: {config:?}");
        Self { config }
    }

    /// Download every configured source into the data directory.
    pub fn fetch(&self) -> Result<Vec<Fetched>> {
        let sources = self.config.sources.all();
        fetch::download_all(&sources, &self.config.data_dir, self.config.parallel_fetch)
            .context("Failed to fetch source data")
    }

    /// Load the cached CSV files and clean each one.
    pub fn load(&self) -> Result<SourceTables> {
        let loader = DataLoader::new(&self.config.data_dir);
        let sources = &self.config.sources;

        let vaccinations = loader
            .load_csv(&sources.vaccinations.file_name)
            .context("Failed to load vaccination data")?;
        let vaccinations = DataProcessor::clean_vaccinations(&vaccinations)
            .context("Failed to clean vaccination data")?;

        let countries = loader
            .load_csv(&sources.countries.file_name)
            .context("Failed to load country codes")?;
        let countries =
            DataProcessor::clean_countries(&countries).context("Failed to clean country codes")?;

        let variants = loader
            .load_csv(&sources.variants.file_name)
            .context("Failed to load variant data")?;
        let variants =
            DataProcessor::clean_variants(&variants).context("Failed to clean variant data")?;

        Ok(SourceTables {
            vaccinations,
            countries,
            variants,
        })
    }

    /// Load, aggregate, export the views and render the charts.
    ///
    /// Nothing is written if loading or aggregation fails. Tables are
    /// exported before the charts are drawn, so a rendering failure leaves
    /// the CSV files and `summary.json` in place without the images.
    pub fn report(&self) -> Result<ReportOutput> {
        let tables = self.load()?;
        let report = transform(&tables)?;

        let output_dir = &self.config.output_dir;
        let tables = write_report(&report, output_dir)?;
        let charts = StaticChartRenderer::new(self.config.chart_width, self.config.chart_height)
            .render_all(&report.views, output_dir)
            .context("Failed to render charts")?;

        Ok(ReportOutput { tables, charts })
    }
}

/// Filter, join and build the four views from cleaned tables.
pub fn transform(tables: &SourceTables) -> Result<Report> {
    let retained = aggregate::retain_all_group(&tables.vaccinations)
        .context("Failed to prepare vaccination rows")?;
    let joined = aggregate::join_countries(&retained, &tables.countries)
        .context("Failed to join country names")?;
    let views = AggregateViews::build(&joined.table).context("Failed to aggregate views")?;

    let summary = RunSummary {
        vaccination_rows: tables.vaccinations.height(),
        country_rows: tables.countries.height(),
        variant_rows: tables.variants.height(),
        variant_columns: tables.variants.width(),
        join: joined.diagnostics,
        rollout_countries: views.rollout.height(),
        vaccine_types: views.breakdown.vaccines.len(),
        dose_stage_rows: views.dose_stages.height(),
    };
    info!(
        "Aggregated {} countries from {} vaccination rows ({} dropped by the join)",
        summary.rollout_countries, summary.vaccination_rows, summary.join.dropped_rows
    );

    Ok(Report { views, summary })
}

fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df.clone())
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Export the four views as CSV and the summary as JSON.
pub fn write_report(report: &Report, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let breakdown = report.views.breakdown.to_dataframe()?;
    let tables = [
        (ROLLOUT_CSV, &report.views.rollout),
        (SUPPLY_CSV, &report.views.supply),
        (BREAKDOWN_CSV, &breakdown),
        (DOSE_STAGES_CSV, &report.views.dose_stages),
    ];

    let mut written = Vec::with_capacity(tables.len() + 1);
    for (name, df) in tables {
        let path = output_dir.join(name);
        write_csv(df, &path)?;
        written.push(path);
    }

    let path = output_dir.join(SUMMARY_JSON);
    let json = serde_json::to_string_pretty(&report.summary)?;
    std::fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    written.push(path);

    info!("Wrote {} tables to {}", written.len(), output_dir.display());
    Ok(written)
}
