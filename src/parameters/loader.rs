//! File loaders for defaults, growth rates and reforms
//!
//! Defaults and reforms are JSON; growth rates are a CSV with one row per
//! year (`year,inflation,wage_growth`).

use log::info;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

use super::defaults::Defaults;
use super::indexing::GrowthRates;
use super::reform::Reform;
use crate::error::{ParameterError, Result};

/// Default directory holding parameter files
pub const DEFAULT_PARAMETERS_PATH: &str = "data/parameters";

/// Defaults file name inside [`DEFAULT_PARAMETERS_PATH`]
pub const DEFAULTS_FILE_NAME: &str = "current_law_policy.json";

/// Growth-rate file name inside [`DEFAULT_PARAMETERS_PATH`]
pub const GROWTH_RATES_FILE_NAME: &str = "growth_rates.csv";

/// Parse a defaults document
pub fn parse_defaults(json: &str) -> Result<Defaults> {
    Ok(serde_json::from_str(json)?)
}

/// Load a defaults file
pub fn load_defaults(path: &Path) -> Result<Defaults> {
    let file = File::open(path)?;
    let defaults: Defaults = serde_json::from_reader(std::io::BufReader::new(file))?;
    info!("Loaded {} parameter defaults from {}", defaults.len(), path.display());
    Ok(defaults)
}

#[derive(Debug, Deserialize)]
struct RateRow {
    year: i32,
    inflation: Option<f64>,
    wage_growth: Option<f64>,
}

/// Load growth rates from any CSV reader.
///
/// Rows must start at `start_year` and run over consecutive years. A column
/// left entirely blank means that series is not supplied; a partly blank
/// column is an error.
pub fn load_growth_rates_from_reader<R: std::io::Read>(
    reader: R,
    start_year: i32,
) -> Result<GrowthRates> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows: Vec<RateRow> = Vec::new();
    for result in csv_reader.deserialize() {
        let row: RateRow = result?;
        rows.push(row);
    }
    rows.sort_by_key(|r| r.year);

    for (i, row) in rows.iter().enumerate() {
        let expected = start_year + i as i32;
        if row.year != expected {
            return Err(ParameterError::InvalidRates(format!(
                "expected a row for {} but found {}",
                expected, row.year
            )));
        }
    }

    Ok(GrowthRates {
        inflation: collect_column(&rows, "inflation", |r| r.inflation)?,
        wage_growth: collect_column(&rows, "wage_growth", |r| r.wage_growth)?,
    })
}

fn collect_column(
    rows: &[RateRow],
    column: &str,
    get: impl Fn(&RateRow) -> Option<f64>,
) -> Result<Option<Vec<f64>>> {
    let values: Vec<Option<f64>> = rows.iter().map(get).collect();
    if values.iter().all(Option::is_none) {
        return Ok(None);
    }
    values
        .into_iter()
        .zip(rows)
        .map(|(v, r)| {
            v.ok_or_else(|| {
                ParameterError::InvalidRates(format!("missing {} rate for {}", column, r.year))
            })
        })
        .collect::<Result<Vec<f64>>>()
        .map(Some)
}

/// Load growth rates from a CSV file
pub fn load_growth_rates(path: &Path, start_year: i32) -> Result<GrowthRates> {
    let file = File::open(path)?;
    let rates = load_growth_rates_from_reader(file, start_year)?;
    info!(
        "Loaded growth rates from {} ({} inflation years, {} wage years)",
        path.display(),
        rates.inflation.as_ref().map_or(0, Vec::len),
        rates.wage_growth.as_ref().map_or(0, Vec::len)
    );
    Ok(rates)
}

/// Parse a reform document such as `{"2022": {"_rate": [200], "_rate_cpi": false}}`.
///
/// Any structural problem, including a year key that is not an integer or
/// a modification set that is not an object, is a malformed reform.
pub fn parse_reform(json: &str) -> Result<Reform> {
    serde_json::from_str(json).map_err(|e| ParameterError::MalformedReform(e.to_string()))
}

/// Load a reform file
pub fn load_reform(path: &Path) -> Result<Reform> {
    let text = std::fs::read_to_string(path)?;
    parse_reform(&text)
}
