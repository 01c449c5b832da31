//! Aggregate module - filter, join and the four summary views

mod join;
mod views;

pub use join::{
    join_countries, retain_all_group, total_dose, JoinDiagnostics, JoinedTable, UnmatchedCode,
    JOINED_COLUMNS, TARGET_GROUP_ALL,
};
pub use views::{
    dose_stages, rollout, supply, vaccine_breakdown, AggregateViews, VaccineMatrix,
};

use crate::data::{LoaderError, ProcessorError};
use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Schema(#[from] LoaderError),
    #[error(transparent)]
    Reshape(#[from] ProcessorError),
    #[error("Population of {country} differs between rows ({min} vs {max})")]
    InconsistentPopulation { country: String, min: i64, max: i64 },
}
