//! Charts module - Chart rendering

mod renderer;
pub mod series;

pub use renderer::{
    StaticChartRenderer, DOSE_FACETS, RECEIVED_BARS, ROLLOUT_SCATTER, VACCINE_FACETS,
    VACCINE_HEATMAP,
};

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render {path}: {message}")]
    Render { path: PathBuf, message: String },
}
