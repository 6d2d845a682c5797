//! Horizon expansion of short value lists
//!
//! Pads a parameter's supplied values out to the requested number of years.
//! Padding either repeats the last supplied year or compounds it forward with
//! per-year growth rates, rounding to cents at every step.

use super::values::{Grid, Series};
use crate::error::{ParameterError, Result};

/// Largest value produced by compounding; anything at or above it is pinned here
pub const VALUE_CEILING: f64 = 9e99;

/// Round to 2 decimal places, or pin to [`VALUE_CEILING`]
///
/// Rounding is decided on the exact binary value, so 508.91499999999996
/// (487 grown by 4.5%) becomes 508.91 even though `value * 100.0` lands on
/// a half.
pub fn round_growth(value: f64) -> f64 {
    if value < VALUE_CEILING {
        format!("{:.2}", value).parse().unwrap_or(value)
    } else {
        VALUE_CEILING
    }
}

/// How an element type moves to the next year under a growth rate
pub trait Indexable: Clone {
    fn grow(&self, rate: f64) -> Self;
}

impl Indexable for f64 {
    fn grow(&self, rate: f64) -> Self {
        round_growth(self * (1.0 + rate))
    }
}

impl Indexable for i64 {
    // Stored back as an integer, so the rounded amount truncates toward zero
    fn grow(&self, rate: f64) -> Self {
        round_growth(*self as f64 * (1.0 + rate)) as i64
    }
}

impl Indexable for bool {
    fn grow(&self, _rate: f64) -> Self {
        *self
    }
}

impl Indexable for String {
    fn grow(&self, _rate: f64) -> Self {
        self.clone()
    }
}

fn check_rates(rates: &[f64], num_years: usize) -> Result<()> {
    let needed = num_years.saturating_sub(1);
    if rates.len() < needed {
        return Err(ParameterError::GrowthRatesTooShort {
            needed,
            available: rates.len(),
        });
    }
    Ok(())
}

/// Expand a scalar-per-year list to `num_years` entries.
///
/// The entry at position `p` past the supplied values is derived from entry
/// `p - 1` with `rates[p - 1]`; without rates it repeats the last value.
pub fn expand_1d<T: Indexable>(x: &[T], rates: Option<&[f64]>, num_years: usize) -> Result<Vec<T>> {
    if x.len() >= num_years {
        return Ok(x.to_vec());
    }
    let last = x.last().ok_or(ParameterError::EmptyValues)?;

    let mut out = Vec::with_capacity(num_years);
    out.extend_from_slice(x);
    match rates {
        None => out.resize(num_years, last.clone()),
        Some(rates) => {
            check_rates(rates, num_years)?;
            for p in x.len()..num_years {
                let next = out[p - 1].grow(rates[p - 1]);
                out.push(next);
            }
        }
    }
    Ok(out)
}

/// Expand a vector-per-year list to `num_years` rows.
///
/// Each generated row is derived column by column from the row before it.
pub fn expand_2d<T: Indexable>(
    x: &[Vec<T>],
    rates: Option<&[f64]>,
    num_years: usize,
) -> Result<Vec<Vec<T>>> {
    if x.len() >= num_years {
        return Ok(x.to_vec());
    }
    if x.is_empty() {
        return Err(ParameterError::EmptyValues);
    }
    if let Some(rates) = rates {
        check_rates(rates, num_years)?;
    }

    let mut out = Vec::with_capacity(num_years);
    out.extend_from_slice(x);
    for i in x.len()..num_years {
        let prev = &out[i - 1];
        let row: Vec<T> = match rates {
            Some(rates) => prev.iter().map(|v| v.grow(rates[i - 1])).collect(),
            None => prev.clone(),
        };
        out.push(row);
    }
    Ok(out)
}

fn expand_grid<T: Indexable>(
    grid: &Grid<T>,
    rates: Option<&[f64]>,
    num_years: usize,
) -> Result<Grid<T>> {
    Ok(match grid {
        Grid::Scalar(v) => Grid::Scalar(expand_1d(v, rates, num_years)?),
        Grid::Vector(rows) => Grid::Vector(expand_2d(rows, rates, num_years)?),
    })
}

/// Expand a series to `num_years` years.
///
/// Growth is applied only when `inflate` is set and a rate series exists;
/// a missing rate series behaves exactly like `inflate == false`.
pub fn expand(
    series: &Series,
    inflate: bool,
    rates: Option<&[f64]>,
    num_years: usize,
) -> Result<Series> {
    let rates = rates.filter(|_| inflate);
    Ok(match series {
        Series::Real(g) => Series::Real(expand_grid(g, rates, num_years)?),
        Series::Boolean(g) => Series::Boolean(expand_grid(g, None, num_years)?),
        Series::Integer(g) => Series::Integer(expand_grid(g, rates, num_years)?),
        Series::Text(v) => Series::Text(expand_1d(v, None, num_years)?),
    })
}
