//! The four summary views. Each is a pure function of the joined table.

use super::{AggregateError, TARGET_GROUP_ALL};
use crate::data::columns::{self as COL, DOSE_STAGES};
use crate::data::DataProcessor;
use log::info;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

const POPULATION_MAX: &str = "population_max";
const MILLION: f64 = 1_000_000.0;

/// All four views computed from one joined table.
#[derive(Debug, Clone)]
pub struct AggregateViews {
    pub rollout: DataFrame,
    pub supply: DataFrame,
    pub breakdown: VaccineMatrix,
    pub dose_stages: DataFrame,
}

impl AggregateViews {
    pub fn build(joined: &DataFrame) -> Result<Self, AggregateError> {
        let views = Self {
            rollout: rollout(joined)?,
            supply: supply(joined)?,
            breakdown: vaccine_breakdown(joined)?,
            dose_stages: dose_stages(joined)?,
        };
        info!(
            "Built views: rollout {:?}, supply {:?}, breakdown {}x{}, dose stages {:?}",
            views.rollout.shape(),
            views.supply.shape(),
            views.breakdown.vaccines.len(),
            views.breakdown.countries.len(),
            views.dose_stages.shape()
        );
        Ok(views)
    }
}

fn ratio(numerator: &str, denominator: &str) -> Expr {
    col(numerator).cast(DataType::Float64) / col(denominator).cast(DataType::Float64)
}

/// Group by country, summing `sums` and collapsing `Population` to its single
/// per-country value. Fails if a country's rows disagree on population.
fn per_country(joined: &DataFrame, sums: &[&str]) -> Result<DataFrame, AggregateError> {
    let mut aggs: Vec<Expr> = sums.iter().map(|c| col(*c).sum()).collect();
    aggs.push(col(COL::POPULATION).min());
    aggs.push(col(COL::POPULATION).max().alias(POPULATION_MAX));

    let grouped = joined
        .clone()
        .lazy()
        .group_by([col(COL::COUNTRY)])
        .agg(aggs)
        .collect()?;

    let conflicts = grouped
        .clone()
        .lazy()
        .filter(col(COL::POPULATION).neq(col(POPULATION_MAX)))
        .sort_by_exprs([col(COL::COUNTRY)], SortMultipleOptions::default())
        .collect()?;
    if conflicts.height() > 0 {
        let country = conflicts.column(COL::COUNTRY)?.str()?.get(0).unwrap_or_default();
        let min = conflicts.column(COL::POPULATION)?.i64()?.get(0).unwrap_or_default();
        let max = conflicts.column(POPULATION_MAX)?.i64()?.get(0).unwrap_or_default();
        return Err(AggregateError::InconsistentPopulation {
            country: country.to_string(),
            min,
            max,
        });
    }

    Ok(grouped.drop(POPULATION_MAX)?)
}

/// Per-country total doses against population.
///
/// Columns: `Country`, `Total_Dose`, `Population`, `vacc_per_pop`; ordered by
/// `Total_Dose` ascending.
pub fn rollout(joined: &DataFrame) -> Result<DataFrame, AggregateError> {
    let df = per_country(joined, &[COL::TOTAL_DOSE])?
        .lazy()
        .select([
            col(COL::COUNTRY),
            col(COL::TOTAL_DOSE),
            col(COL::POPULATION),
            ratio(COL::TOTAL_DOSE, COL::POPULATION).alias(COL::VACC_PER_POP),
        ])
        .sort_by_exprs(
            [col(COL::TOTAL_DOSE), col(COL::COUNTRY)],
            SortMultipleOptions::default().with_nulls_last(true),
        )
        .collect()?;
    Ok(df)
}

/// Per-country doses received and exported against population.
///
/// Columns: `Country`, `NumberDosesReceived`, `NumberDosesExported`,
/// `Population`, `received_per_pop`, `vacc_per_pop`. Sorted by
/// `received_per_pop` descending; this order is what ranking charts rely on.
pub fn supply(joined: &DataFrame) -> Result<DataFrame, AggregateError> {
    let df = per_country(
        joined,
        &[COL::DOSES_RECEIVED, COL::DOSES_EXPORTED, COL::TOTAL_DOSE],
    )?
    .lazy()
    .select([
        col(COL::COUNTRY),
        col(COL::DOSES_RECEIVED),
        col(COL::DOSES_EXPORTED),
        col(COL::POPULATION),
        ratio(COL::DOSES_RECEIVED, COL::POPULATION).alias(COL::RECEIVED_PER_POP),
        ratio(COL::TOTAL_DOSE, COL::POPULATION).alias(COL::VACC_PER_POP),
    ])
    .sort_by_exprs(
        [col(COL::RECEIVED_PER_POP), col(COL::COUNTRY)],
        SortMultipleOptions::default()
            .with_order_descending_multi([true, false])
            .with_nulls_last(true),
    )
    .collect()?;
    Ok(df)
}

/// Doses in millions per vaccine type (rows) and country (columns).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VaccineMatrix {
    pub vaccines: Vec<String>,
    pub countries: Vec<String>,
    /// `values[vaccine][country]`; `None` where the country reported no
    /// rows for that vaccine.
    pub values: Vec<Vec<Option<f64>>>,
}

impl VaccineMatrix {
    /// Pivot a long (Country, Vaccine, value) table. Both axes are sorted.
    pub fn from_long(
        df: &DataFrame,
        row_col: &str,
        column_col: &str,
        value_col: &str,
    ) -> Result<Self, AggregateError> {
        let rows = df.column(row_col)?.str()?;
        let columns = df.column(column_col)?.str()?;
        let values = df.column(value_col)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut cells: BTreeMap<(String, String), f64> = BTreeMap::new();
        let mut vaccines = BTreeSet::new();
        let mut countries = BTreeSet::new();
        for ((row, column), value) in rows.into_iter().zip(columns).zip(values) {
            let (Some(row), Some(column)) = (row, column) else {
                continue;
            };
            vaccines.insert(row.to_string());
            countries.insert(column.to_string());
            if let Some(v) = value {
                *cells
                    .entry((row.to_string(), column.to_string()))
                    .or_insert(0.0) += v;
            }
        }

        let vaccines: Vec<String> = vaccines.into_iter().collect();
        let countries: Vec<String> = countries.into_iter().collect();
        let values = vaccines
            .iter()
            .map(|v| {
                countries
                    .iter()
                    .map(|c| cells.get(&(v.clone(), c.clone())).copied())
                    .collect()
            })
            .collect();

        Ok(Self {
            vaccines,
            countries,
            values,
        })
    }

    pub fn get(&self, vaccine: &str, country: &str) -> Option<f64> {
        let row = self.vaccines.iter().position(|v| v == vaccine)?;
        let column = self.countries.iter().position(|c| c == country)?;
        self.values.get(row)?.get(column).copied().flatten()
    }

    /// Largest cell, or `None` for an empty matrix.
    pub fn max_value(&self) -> Option<f64> {
        self.values
            .iter()
            .flatten()
            .flatten()
            .copied()
            .fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v))))
    }

    /// Divide every cell by `divisor`.
    fn scaled_down(mut self, divisor: f64) -> Self {
        for cell in self.values.iter_mut().flatten() {
            *cell = cell.map(|v| v / divisor);
        }
        self
    }

    /// Wide table: a `Vaccine` column followed by one column per country.
    /// Cells missing from a short row are written as null.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let mut columns = Vec::with_capacity(self.countries.len() + 1);
        columns.push(Column::new(COL::VACCINE.into(), self.vaccines.clone()));
        for (j, country) in self.countries.iter().enumerate() {
            let cells: Vec<Option<f64>> = self
                .values
                .iter()
                .map(|row| row.get(j).copied().flatten())
                .collect();
            columns.push(Column::new(country.as_str().into(), cells));
        }
        DataFrame::new(columns)
    }
}

/// Total doses (millions) per vaccine type and country.
///
/// Sums are divided after the pivot: a lazy divide by a literal becomes a
/// multiply by its reciprocal, which is not exact.
pub fn vaccine_breakdown(joined: &DataFrame) -> Result<VaccineMatrix, AggregateError> {
    let long = joined
        .clone()
        .lazy()
        .group_by([col(COL::COUNTRY), col(COL::VACCINE)])
        .agg([col(COL::TOTAL_DOSE).sum()])
        .collect()?;
    Ok(
        VaccineMatrix::from_long(&long, COL::VACCINE, COL::COUNTRY, COL::TOTAL_DOSE)?
            .scaled_down(MILLION),
    )
}

/// Mean dose count per vaccine and dose stage, in long format.
///
/// Columns: `Vaccine`, `Dose`, `count`. Rows run stage by stage in
/// [`DOSE_STAGES`] order, vaccines sorted within each stage.
pub fn dose_stages(joined: &DataFrame) -> Result<DataFrame, AggregateError> {
    let means = joined
        .clone()
        .lazy()
        .filter(col(COL::TARGET_GROUP).eq(lit(TARGET_GROUP_ALL)))
        .group_by([col(COL::VACCINE)])
        .agg(DOSE_STAGES.map(|c| col(c).cast(DataType::Float64).mean()))
        .sort_by_exprs([col(COL::VACCINE)], SortMultipleOptions::default())
        .collect()?;

    Ok(DataProcessor::stack_to_long(
        &means,
        COL::VACCINE,
        &DOSE_STAGES,
        COL::DOSE,
        COL::COUNT,
    )?)
}
