//! Target-group filter, derived total and the country join.

use super::AggregateError;
use crate::data::columns as COL;
use crate::data::require_columns;
use log::{debug, info, warn};
use polars::prelude::*;
use serde::Serialize;

/// The aggregate cohort; every other target group overlaps with it.
pub const TARGET_GROUP_ALL: &str = "ALL";

const NUMERIC_COLUMNS: [&str; 7] = [
    COL::FIRST_DOSE,
    COL::SECOND_DOSE,
    COL::DOSE_ADDITIONAL_1,
    COL::UNKNOWN_DOSE,
    COL::DOSES_RECEIVED,
    COL::DOSES_EXPORTED,
    COL::POPULATION,
];

/// Columns carried by the joined table, in order.
pub const JOINED_COLUMNS: [&str; 11] = [
    COL::COUNTRY,
    COL::TARGET_GROUP,
    COL::VACCINE,
    COL::FIRST_DOSE,
    COL::SECOND_DOSE,
    COL::DOSE_ADDITIONAL_1,
    COL::UNKNOWN_DOSE,
    COL::TOTAL_DOSE,
    COL::DOSES_RECEIVED,
    COL::DOSES_EXPORTED,
    COL::POPULATION,
];

/// Rows dropped by the join because their code has no reference entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnmatchedCode {
    pub code: Option<String>,
    pub rows: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JoinDiagnostics {
    /// Rows left after the target-group filter.
    pub retained_rows: usize,
    /// Rows in the joined table.
    pub joined_rows: usize,
    pub dropped_rows: i64,
    pub unmatched: Vec<UnmatchedCode>,
}

/// Vaccination rows joined to their country name.
#[derive(Debug, Clone)]
pub struct JoinedTable {
    pub table: DataFrame,
    pub diagnostics: JoinDiagnostics,
}

/// `FirstDose + SecondDose + DoseAdditional1 + UnknownDose`.
pub fn total_dose() -> Expr {
    (col(COL::FIRST_DOSE) + col(COL::SECOND_DOSE) + col(COL::DOSE_ADDITIONAL_1) + col(COL::UNKNOWN_DOSE))
        .alias(COL::TOTAL_DOSE)
}

/// Keep the "ALL" target group, enforce integer dose columns and add
/// `Total_Dose`. Order matters: the total is only defined on retained rows.
pub fn retain_all_group(vaccinations: &DataFrame) -> Result<DataFrame, AggregateError> {
    let mut required = vec![COL::REPORTING_COUNTRY, COL::TARGET_GROUP, COL::VACCINE];
    required.extend(NUMERIC_COLUMNS);
    require_columns(vaccinations, "vaccinations", &required)?;

    let casts: Vec<Expr> = NUMERIC_COLUMNS
        .iter()
        .map(|c| col(*c).strict_cast(DataType::Int64))
        .collect();

    let retained = vaccinations
        .clone()
        .lazy()
        .filter(col(COL::TARGET_GROUP).eq(lit(TARGET_GROUP_ALL)))
        .with_column(col(COL::REPORTING_COUNTRY).cast(DataType::String))
        .with_columns(casts)
        .with_column(total_dose())
        .collect()?;

    info!(
        "Kept {} of {} vaccination rows for target group {TARGET_GROUP_ALL}",
        retained.height(),
        vaccinations.height()
    );
    Ok(retained)
}

/// Inner-join retained vaccination rows to the country reference on the
/// 2-letter code. Unmatched rows are dropped and reported in the
/// diagnostics, never raised.
pub fn join_countries(
    retained: &DataFrame,
    countries: &DataFrame,
) -> Result<JoinedTable, AggregateError> {
    require_columns(countries, "countries", &[COL::ALPHA_2_CODE, COL::COUNTRY_NAME])?;

    let lookup = countries.clone().lazy().select([
        col(COL::ALPHA_2_CODE).cast(DataType::String),
        col(COL::COUNTRY_NAME).alias(COL::COUNTRY),
    ]);

    let projection: Vec<Expr> = JOINED_COLUMNS.iter().map(|c| col(*c)).collect();
    let table = retained
        .clone()
        .lazy()
        .join(
            lookup.clone(),
            [col(COL::REPORTING_COUNTRY)],
            [col(COL::ALPHA_2_CODE)],
            JoinArgs::new(JoinType::Inner),
        )
        .select(projection)
        .collect()?;

    let unmatched_df = retained
        .clone()
        .lazy()
        .join(
            lookup,
            [col(COL::REPORTING_COUNTRY)],
            [col(COL::ALPHA_2_CODE)],
            JoinArgs::new(JoinType::Anti),
        )
        .group_by([col(COL::REPORTING_COUNTRY)])
        .agg([len().cast(DataType::Int64).alias("rows")])
        .sort_by_exprs(
            [col(COL::REPORTING_COUNTRY)],
            SortMultipleOptions::default().with_nulls_last(true),
        )
        .collect()?;

    let codes = unmatched_df.column(COL::REPORTING_COUNTRY)?.str()?;
    let rows = unmatched_df.column("rows")?.i64()?;
    let unmatched: Vec<UnmatchedCode> = codes
        .into_iter()
        .zip(rows.into_iter())
        .map(|(code, rows)| UnmatchedCode {
            code: code.map(str::to_string),
            rows: rows.unwrap_or(0),
        })
        .collect();
    let dropped_rows = unmatched.iter().map(|u| u.rows).sum();

    if dropped_rows > 0 {
        warn!(
            "Dropped {dropped_rows} vaccination rows with no country reference: {:?}",
            unmatched
        );
    }
    debug!("Joined table columns: {:?}", table.get_column_names());

    let diagnostics = JoinDiagnostics {
        retained_rows: retained.height(),
        joined_rows: table.height(),
        dropped_rows,
        unmatched,
    };
    Ok(JoinedTable { table, diagnostics })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_fixtures::{countries, vaccinations};

    #[test]
    fn total_dose_is_exact_sum_on_retained_rows() {
        let retained = retain_all_group(&vaccinations()).unwrap();
        assert!(retained
            .column(COL::TARGET_GROUP)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .all(|g| g == Some(TARGET_GROUP_ALL)));

        let total = retained.column(COL::TOTAL_DOSE).unwrap().i64().unwrap();
        let stages: Vec<_> = crate::data::columns::DOSE_STAGES
            .iter()
            .map(|c| retained.column(c).unwrap().i64().unwrap().clone())
            .collect();
        for i in 0..retained.height() {
            let expected: i64 = stages.iter().map(|s| s.get(i).unwrap()).sum();
            assert_eq!(total.get(i), Some(expected));
        }
    }

    #[test]
    fn unmatched_codes_are_dropped_and_counted() {
        let retained = retain_all_group(&vaccinations()).unwrap();
        let joined = join_countries(&retained, &countries()).unwrap();

        let names: Vec<_> = joined
            .table
            .column(COL::COUNTRY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        assert!(!names.is_empty());
        assert!(names.iter().all(|n| n == "Belgium" || n == "Germany"));

        assert_eq!(joined.diagnostics.dropped_rows, 1);
        assert_eq!(
            joined.diagnostics.unmatched,
            vec![UnmatchedCode {
                code: Some("ZZ".into()),
                rows: 1
            }]
        );
        assert_eq!(
            joined.diagnostics.joined_rows + 1,
            joined.diagnostics.retained_rows
        );
    }

    #[test]
    fn joined_table_has_canonical_columns() {
        let retained = retain_all_group(&vaccinations()).unwrap();
        let joined = join_countries(&retained, &countries()).unwrap();
        assert_eq!(crate::data::get_columns(&joined.table), JOINED_COLUMNS.to_vec());
    }

    #[test]
    fn non_numeric_dose_is_fatal() {
        let df = df!(
            COL::REPORTING_COUNTRY => ["BE"],
            COL::TARGET_GROUP => ["ALL"],
            COL::VACCINE => ["COM"],
            COL::FIRST_DOSE => ["lots"],
            COL::SECOND_DOSE => [1i64],
            COL::DOSE_ADDITIONAL_1 => [1i64],
            COL::UNKNOWN_DOSE => [1i64],
            COL::DOSES_RECEIVED => [1i64],
            COL::DOSES_EXPORTED => [1i64],
            COL::POPULATION => [1i64],
        )
        .unwrap();
        assert!(matches!(
            retain_all_group(&df),
            Err(AggregateError::PolarsError(_))
        ));
    }

    #[test]
    fn missing_column_is_fatal() {
        let df = vaccinations().drop(COL::UNKNOWN_DOSE).unwrap();
        assert!(matches!(
            retain_all_group(&df),
            Err(AggregateError::Schema(_))
        ));
    }
}
