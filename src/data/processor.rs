//! Data Processor Module
//! Handles per-dataset cleaning and the long-format (stack) reshape.

use super::columns as COL;
use super::loader::{require_columns, LoaderError};
use polars::prelude::*;
use thiserror::Error;

/// Stand-in for a vaccine type the source left empty.
pub const UNKNOWN_VACCINE: &str = "0";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error(transparent)]
    Schema(#[from] LoaderError),
}

/// Handles data cleaning and transformation operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Fill missing vaccine types with [`UNKNOWN_VACCINE`] and drop the
    /// `Denominator` and `FirstDoseRefused` columns.
    pub fn clean_vaccinations(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        require_columns(df, "vaccinations", &[COL::VACCINE])?;
        let filled = df
            .clone()
            .lazy()
            .with_column(
                col(COL::VACCINE)
                    .cast(DataType::String)
                    .fill_null(lit(UNKNOWN_VACCINE)),
            )
            .collect()?;

        Self::drop_columns(
            &filled,
            "vaccinations",
            &[COL::DENOMINATOR, COL::FIRST_DOSE_REFUSED],
        )
    }

    /// Drop the two low-signal variant columns.
    pub fn clean_variants(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::drop_columns(
            df,
            "variants",
            &[COL::NUMBER_SEQUENCED_KNOWN_VARIANT, COL::PERCENT_VARIANT],
        )
    }

    /// Drop the unused code columns. The 2-letter code is left untouched:
    /// `"NA"` is Namibia, not a missing value.
    pub fn clean_countries(df: &DataFrame) -> Result<DataFrame, ProcessorError> {
        Self::drop_columns(
            df,
            "countries",
            &[COL::ALPHA_3_CODE, COL::NUMERIC_CODE, COL::ISO_3166_2],
        )
    }

    /// Drop `columns`, failing if any of them is absent.
    pub fn drop_columns(
        df: &DataFrame,
        table: &str,
        columns: &[&str],
    ) -> Result<DataFrame, ProcessorError> {
        require_columns(df, table, columns)?;
        let mut out = df.clone();
        for name in columns {
            out = out.drop(name)?;
        }
        Ok(out)
    }

    /// Transform wide columns to long format (stack operation).
    ///
    /// Output columns: [id_col, var_name, value_name]. Rows are emitted
    /// column by column, so every id appears once per stacked column.
    /// Null values are kept as nulls.
    pub fn stack_to_long(
        df: &DataFrame,
        id_col: &str,
        value_cols: &[&str],
        var_name: &str,
        value_name: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let id_series = df.column(id_col)?.cast(&DataType::String)?;
        let id_ca = id_series.str()?;

        let mut ids: Vec<Option<String>> = Vec::with_capacity(df.height() * value_cols.len());
        let mut vars: Vec<String> = Vec::with_capacity(ids.capacity());
        let mut values: Vec<Option<f64>> = Vec::with_capacity(ids.capacity());

        for value_col in value_cols {
            let value_f64 = df.column(value_col)?.cast(&DataType::Float64)?;
            let value_ca = value_f64.f64()?;

            for (id, value) in id_ca.into_iter().zip(value_ca.into_iter()) {
                ids.push(id.map(str::to_string));
                vars.push(value_col.to_string());
                values.push(value);
            }
        }

        let df = DataFrame::new(vec![
            Column::new(id_col.into(), ids),
            Column::new(var_name.into(), vars),
            Column::new(value_name.into(), values),
        ])?;

        Ok(df)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_vaccinations() -> DataFrame {
        df!(
            COL::REPORTING_COUNTRY => ["BE", "BE"],
            COL::VACCINE => [Some("COM"), None],
            COL::DENOMINATOR => [Some(10i64), None],
            COL::FIRST_DOSE_REFUSED => [None::<i64>, None],
            COL::FIRST_DOSE => [1i64, 2],
        )
        .unwrap()
    }

    #[test]
    fn vaccinations_fill_sentinel_and_drop_columns() {
        let raw = raw_vaccinations();
        let cleaned = DataProcessor::clean_vaccinations(&raw).unwrap();

        let names = crate::data::get_columns(&cleaned);
        assert_eq!(names, vec![COL::REPORTING_COUNTRY, COL::VACCINE, COL::FIRST_DOSE]);

        let vaccine = cleaned.column(COL::VACCINE).unwrap().str().unwrap();
        assert_eq!(vaccine.get(0), Some("COM"));
        assert_eq!(vaccine.get(1), Some(UNKNOWN_VACCINE));

        // input is left as it was
        assert_eq!(raw.width(), 5);
        assert_eq!(raw.column(COL::VACCINE).unwrap().null_count(), 1);
    }

    #[test]
    fn countries_keep_namibia() {
        let raw = df!(
            COL::COUNTRY_NAME => ["Namibia", "Belgium"],
            COL::ALPHA_2_CODE => ["NA", "BE"],
            COL::ALPHA_3_CODE => ["NAM", "BEL"],
            COL::NUMERIC_CODE => [516i64, 56],
            COL::ISO_3166_2 => ["ISO 3166-2:NA", "ISO 3166-2:BE"],
        )
        .unwrap();

        let cleaned = DataProcessor::clean_countries(&raw).unwrap();
        assert_eq!(cleaned.width(), 2);
        let codes = cleaned.column(COL::ALPHA_2_CODE).unwrap();
        assert_eq!(codes.null_count(), 0);
        assert_eq!(codes.str().unwrap().get(0), Some("NA"));
    }

    #[test]
    fn missing_drop_column_is_fatal() {
        let raw = df!("country" => ["BE"], COL::PERCENT_VARIANT => [1.0]).unwrap();
        let err = DataProcessor::clean_variants(&raw).unwrap_err();
        assert!(matches!(
            err,
            ProcessorError::Schema(LoaderError::MissingColumn { .. })
        ));
    }

    #[test]
    fn stack_to_long_emits_one_row_per_id_and_column() {
        let wide = df!(
            "id" => ["a", "b"],
            "x" => [1.0, 2.0],
            "y" => [Some(3.0), None],
        )
        .unwrap();

        let long = DataProcessor::stack_to_long(&wide, "id", &["x", "y"], "var", "val").unwrap();
        assert_eq!(long.shape(), (4, 3));

        let vars: Vec<_> = long.column("var").unwrap().str().unwrap().into_iter().collect();
        assert_eq!(vars, vec![Some("x"), Some("x"), Some("y"), Some("y")]);
        let vals: Vec<_> = long.column("val").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(vals, vec![Some(1.0), Some(2.0), Some(3.0), None]);
    }
}
