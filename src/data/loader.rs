//! CSV Data Loader Module
//! Reads the cached source CSV files into Polars DataFrames.

use polars::prelude::*;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Cached file not found: {0}")]
    MissingFile(PathBuf),
    #[error("Column '{column}' missing from {table}")]
    MissingColumn { table: String, column: String },
}

/// Loads CSV files from the local cache directory.
pub struct DataLoader {
    data_dir: PathBuf,
}

impl DataLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load a cached CSV file by name.
    ///
    /// The whole file is scanned for schema inference so a late non-numeric
    /// value fails the load instead of being coerced. Only empty fields are
    /// read as null; strings such as `"NA"` are kept verbatim.
    pub fn load_csv(&self, file_name: &str) -> Result<DataFrame, LoaderError> {
        let path = self.data_dir.join(file_name);
        if !path.is_file() {
            return Err(LoaderError::MissingFile(path));
        }

        let df = LazyCsvReader::new(&path)
            .with_infer_schema_length(None)
            .finish()?
            .collect()?;

        log::info!("Loaded {} with shape {:?}", path.display(), df.shape());
        Ok(df)
    }
}

/// Get list of column names of a DataFrame.
pub fn get_columns(df: &DataFrame) -> Vec<String> {
    df.get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Fail with `MissingColumn` unless every name in `columns` is present.
pub fn require_columns(df: &DataFrame, table: &str, columns: &[&str]) -> Result<(), LoaderError> {
    let present = get_columns(df);
    match columns
        .iter()
        .find(|c| !present.iter().any(|p| p == *c))
    {
        Some(missing) => Err(LoaderError::MissingColumn {
            table: table.to_string(),
            column: missing.to_string(),
        }),
        None => Ok(()),
    }
}
