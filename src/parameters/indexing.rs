//! Growth-rate selection for indexed parameters
//!
//! The two earnings-cap parameters follow wage growth; every other indexed
//! parameter follows price inflation.

use serde::{Deserialize, Serialize};

use crate::error::{ParameterError, Result};

/// Parameters indexed to wage growth rather than price inflation
pub const WAGE_INDEXED_PARAMS: [&str; 2] = ["_SS_Earnings_c", "_SS_Earnings_thd"];

/// Whether `name` is one of the wage-indexed earnings caps.
///
/// Names are matched with or without their leading underscore.
pub fn is_wage_indexed(name: &str) -> bool {
    WAGE_INDEXED_PARAMS
        .iter()
        .any(|w| *w == name || w.trim_start_matches('_') == name)
}

/// Annual growth-rate series supplied by the host.
///
/// Element `i` is the decimal growth from year `start_year + i` to the next
/// year. Either series may be absent, in which case parameters that would
/// use it are carried forward flat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthRates {
    pub inflation: Option<Vec<f64>>,
    pub wage_growth: Option<Vec<f64>>,
}

impl GrowthRates {
    /// No indexing at all
    pub fn none() -> Self {
        Self::default()
    }

    /// The same constant rate for both series over `years` years
    pub fn constant(rate: f64, years: usize) -> Self {
        Self {
            inflation: Some(vec![rate; years]),
            wage_growth: Some(vec![rate; years]),
        }
    }

    pub fn inflation_rates(&self) -> Option<&[f64]> {
        self.inflation.as_deref()
    }

    pub fn wage_growth_rates(&self) -> Option<&[f64]> {
        self.wage_growth.as_deref()
    }
}

/// Resolves which rate series applies to a parameter and which years of it
#[derive(Debug, Clone, Copy)]
pub struct IndexingResolver<'a> {
    rates: &'a GrowthRates,
    start_year: i32,
}

impl<'a> IndexingResolver<'a> {
    pub fn new(rates: &'a GrowthRates, start_year: i32) -> Self {
        Self { rates, start_year }
    }

    /// Full rate series for a parameter, if the host supplied one
    pub fn rates_for(&self, name: &str) -> Option<&'a [f64]> {
        if is_wage_indexed(name) {
            self.rates.wage_growth_rates()
        } else {
            self.rates.inflation_rates()
        }
    }

    /// Rates for the `window_len` years starting at `year`.
    ///
    /// The slice stops early when the series ends; expansion only needs
    /// `window_len - 1` of them and reports a shortfall itself.
    pub fn rates_for_reform_window(
        &self,
        name: &str,
        year: i32,
        window_len: usize,
    ) -> Result<Option<Vec<f64>>> {
        let rates = match self.rates_for(name) {
            Some(rates) => rates,
            None => return Ok(None),
        };
        let offset = usize::try_from(year - self.start_year).map_err(|_| {
            ParameterError::InvalidReform(format!(
                "year {} precedes first parameter year {}",
                year, self.start_year
            ))
        })?;
        let end = (offset + window_len).min(rates.len());
        let start = offset.min(end);
        Ok(Some(rates[start..end].to_vec()))
    }
}
