//! Chart series extracted from the aggregate views.

use crate::data::columns as COL;
use polars::prelude::*;

const MILLION: f64 = 1_000_000.0;

/// Vaccine codes in the order the facet charts list them. Codes not listed
/// here follow alphabetically.
pub const VACCINE_ORDER: [&str; 7] = ["AZ", "COM", "JANSS", "MOD", "UNK", "BECNBG", "SPU"];

/// Collect a column as strings, nulls as empty strings.
pub fn str_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

/// Collect a numeric column as `f64`.
pub fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(column.f64()?.into_iter().collect())
}

/// One country on the rollout scatter, in millions.
#[derive(Debug, Clone, PartialEq)]
pub struct RolloutPoint {
    pub country: String,
    pub population_m: f64,
    pub total_dose_m: f64,
    pub vacc_per_pop: f64,
}

impl RolloutPoint {
    /// Rows with a missing value are skipped.
    pub fn from_view(rollout: &DataFrame) -> PolarsResult<Vec<Self>> {
        let countries = str_values(rollout, COL::COUNTRY)?;
        let population = f64_values(rollout, COL::POPULATION)?;
        let total = f64_values(rollout, COL::TOTAL_DOSE)?;
        let ratio = f64_values(rollout, COL::VACC_PER_POP)?;

        Ok(countries
            .into_iter()
            .zip(population)
            .zip(total)
            .zip(ratio)
            .filter_map(|(((country, p), t), r)| {
                Some(RolloutPoint {
                    country,
                    population_m: p? / MILLION,
                    total_dose_m: t? / MILLION,
                    vacc_per_pop: r.filter(|r| r.is_finite())?,
                })
            })
            .collect())
    }
}

/// A labelled bar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub label: String,
    pub value: f64,
}

/// `received_per_pop` per country, keeping the supply view's order.
pub fn received_bars(supply: &DataFrame) -> PolarsResult<Vec<Bar>> {
    let countries = str_values(supply, COL::COUNTRY)?;
    let ratios = f64_values(supply, COL::RECEIVED_PER_POP)?;
    Ok(countries
        .into_iter()
        .zip(ratios)
        .filter_map(|(label, value)| {
            Some(Bar {
                label,
                value: value.filter(|v| v.is_finite())?,
            })
        })
        .collect())
}

/// One panel of a faceted bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct Facet {
    pub title: String,
    pub bars: Vec<Bar>,
}

/// Dose-stage rows of the long table as (vaccine, dose, count).
fn dose_stage_rows(dose_stages: &DataFrame) -> PolarsResult<Vec<(String, String, f64)>> {
    let vaccines = str_values(dose_stages, COL::VACCINE)?;
    let doses = str_values(dose_stages, COL::DOSE)?;
    let counts = f64_values(dose_stages, COL::COUNT)?;
    Ok(vaccines
        .into_iter()
        .zip(doses)
        .zip(counts)
        .map(|((v, d), c)| (v, d, c.unwrap_or(0.0)))
        .collect())
}

/// `present` ordered by [`VACCINE_ORDER`], unknown codes after, sorted.
pub fn ordered_vaccines<'a>(present: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut present: Vec<&str> = present.into_iter().collect();
    present.sort_unstable();
    present.dedup();

    let mut ordered: Vec<String> = VACCINE_ORDER
        .iter()
        .filter(|v| present.contains(*v))
        .map(|v| v.to_string())
        .collect();
    ordered.extend(
        present
            .iter()
            .filter(|v| !VACCINE_ORDER.contains(*v))
            .map(|v| v.to_string()),
    );
    ordered
}

/// One panel per dose stage, bars per vaccine.
pub fn facets_by_dose(dose_stages: &DataFrame) -> PolarsResult<Vec<Facet>> {
    let rows = dose_stage_rows(dose_stages)?;
    let vaccines = ordered_vaccines(rows.iter().map(|(v, _, _)| v.as_str()));
    Ok(COL::DOSE_STAGES
        .iter()
        .map(|dose| Facet {
            title: dose.to_string(),
            bars: vaccines
                .iter()
                .map(|vaccine| Bar {
                    label: vaccine.clone(),
                    value: lookup(&rows, vaccine, dose),
                })
                .collect(),
        })
        .collect())
}

/// One panel per vaccine, bars per dose stage.
pub fn facets_by_vaccine(dose_stages: &DataFrame) -> PolarsResult<Vec<Facet>> {
    let rows = dose_stage_rows(dose_stages)?;
    let vaccines = ordered_vaccines(rows.iter().map(|(v, _, _)| v.as_str()));
    Ok(vaccines
        .iter()
        .map(|vaccine| Facet {
            title: vaccine.clone(),
            bars: COL::DOSE_STAGES
                .iter()
                .map(|dose| Bar {
                    label: dose.to_string(),
                    value: lookup(&rows, vaccine, dose),
                })
                .collect(),
        })
        .collect())
}

fn lookup(rows: &[(String, String, f64)], vaccine: &str, dose: &str) -> f64 {
    rows.iter()
        .find(|(v, d, _)| v == vaccine && d == dose)
        .map(|(_, _, c)| *c)
        .unwrap_or(0.0)
}
