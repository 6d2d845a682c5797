//! Reform application
//!
//! A reform overrides parameter values from one calendar year to the end of
//! the horizon and may switch a parameter's growth indexing on or off. Years
//! before the reform year are never modified.
//!
//! ```text
//! {2018: {"_SS_Earnings_c": [500000]}}                               indexing continues
//! {2018: {"_SS_Earnings_c": [500000], "_SS_Earnings_c_cpi": false}}  indexing stops
//! {2019: {"_EITC_ps": [[8000, 8500, 9000, 9500]]}}                   vector parameter
//! ```

use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::expand::expand;
use super::indexing::IndexingResolver;
use super::store::ParameterStore;
use super::validate::ValidationReport;
use super::values::{Series, YearValue};
use crate::error::{ParameterError, Result};

/// Suffix marking an indexing-status override
pub const CPI_SUFFIX: &str = "_cpi";

/// One entry of a year's modification set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModEntry {
    /// `name_cpi: bool`, the indexing status from the reform year on
    Indexing(bool),
    /// `name: [values...]`, values starting at the reform year
    Values(Vec<YearValue>),
}

/// Modifications for a single year, keyed by parameter name
pub type YearMods = BTreeMap<String, ModEntry>;

/// Year-keyed reform provisions
pub type Reform = BTreeMap<i32, YearMods>;

/// Root parameter name of a `_cpi` key, when that root is known to `store`
pub(crate) fn cpi_root<'a>(store: &ParameterStore, key: &'a str) -> Option<&'a str> {
    key.strip_suffix(CPI_SUFFIX).filter(|root| store.contains(root))
}

struct PendingUpdate {
    name: String,
    indexed: bool,
    window: Series,
}

/// Expand reform values over the years from `year` to the horizon end
fn reform_window(
    resolver: &IndexingResolver<'_>,
    name: &str,
    values: &Series,
    indexed: bool,
    year: i32,
    window_len: usize,
) -> Result<Series> {
    let rates = if indexed {
        resolver.rates_for_reform_window(name, year, window_len)?
    } else {
        None
    };
    expand(values, indexed, rates.as_deref(), window_len)
}

impl ParameterStore {
    /// Apply a reform holding exactly one year, which must be the current year.
    ///
    /// The reform is checked in full before anything is written, so a failed
    /// call leaves the store unchanged.
    pub fn apply_year_mods(&mut self, reform: &Reform) -> Result<()> {
        if reform.len() != 1 {
            return Err(ParameterError::MalformedReform(format!(
                "reform must contain a single YEAR:MODS pair, found {}",
                reform.len()
            )));
        }
        match reform.iter().next() {
            Some((&year, mods)) => self.apply_mods(year, mods),
            None => Err(ParameterError::MalformedReform("reform is empty".to_string())),
        }
    }

    fn apply_mods(&mut self, year: i32, mods: &YearMods) -> Result<()> {
        if year != self.current_year() {
            return Err(ParameterError::InvalidReform(format!(
                "YEAR={} in reform is not equal to current_year={}",
                year,
                self.current_year()
            )));
        }
        self.check_keys(year, mods)?;

        let offset = self.year_offset(year)?;
        let window_len = self.num_years() - offset;
        let resolver = self.resolver();
        let mut used: BTreeSet<&str> = BTreeSet::new();
        let mut updates = Vec::new();

        for (name, entry) in mods {
            let values = match entry {
                ModEntry::Values(values) => values,
                ModEntry::Indexing(_) => continue,
            };
            let param = self
                .parameter(name)
                .ok_or_else(|| ParameterError::InvalidReform(format!("unknown parameter {}", name)))?;

            let cpi_key = format!("{}{}", name, CPI_SUFFIX);
            let indexed = match mods.get_key_value(&cpi_key) {
                Some((key, ModEntry::Indexing(flag))) => {
                    used.insert(key.as_str());
                    *flag
                }
                _ => param.metadata.cpi_inflated,
            };
            used.insert(name.as_str());

            let supplied = Series::from_values(param.metadata.value_type, values, param.series.width())
                .map_err(|reason| ParameterError::MalformedReform(format!("{} {}", name, reason)))?;
            if supplied.width() != param.series.width() {
                return Err(ParameterError::MalformedReform(format!(
                    "{} values do not match the parameter's dimension",
                    name
                )));
            }
            if supplied.is_empty() {
                return Err(ParameterError::MalformedReform(format!("{} has no values", name)));
            }
            if supplied.len() > window_len {
                return Err(ParameterError::MalformedReform(format!(
                    "{} supplies {} years of values but only {} remain from {}",
                    name,
                    supplied.len(),
                    window_len,
                    year
                )));
            }

            let window = reform_window(&resolver, name, &supplied, indexed, year, window_len)?;
            debug!("Reform {}: {} from {} (indexed: {})", year, name, supplied.len(), indexed);
            updates.push(PendingUpdate {
                name: name.clone(),
                indexed,
                window,
            });
        }

        // Indexing overrides with no paired values re-expand from the
        // current-year value, which becomes the new compounding base
        for (key, entry) in mods {
            if used.contains(key.as_str()) {
                continue;
            }
            let (root, flag) = match (cpi_root(self, key), entry) {
                (Some(root), ModEntry::Indexing(flag)) => (root, *flag),
                _ => continue,
            };
            used.insert(key.as_str());
            let param = self
                .parameter(root)
                .ok_or_else(|| ParameterError::InvalidReform(format!("unknown parameter {}", root)))?;
            let seed = param.series.slice(offset, 1);
            let window = reform_window(&resolver, root, &seed, flag, year, window_len)?;
            debug!("Reform {}: {} indexing set to {}", year, root, flag);
            updates.push(PendingUpdate {
                name: root.to_string(),
                indexed: flag,
                window,
            });
        }

        if used.len() != mods.len() {
            let unused: Vec<&str> = mods
                .keys()
                .map(String::as_str)
                .filter(|k| !used.contains(k))
                .collect();
            return Err(ParameterError::InvalidReform(format!(
                "{} reform keys not used: {}",
                year,
                unused.join(", ")
            )));
        }

        let count = updates.len();
        for update in updates {
            let param = self.parameter_mut(&update.name).ok_or_else(|| {
                ParameterError::InvalidReform(format!("unknown parameter {}", update.name))
            })?;
            param.metadata.cpi_inflated = update.indexed;
            param
                .series
                .splice(offset, update.window)
                .map_err(|reason| ParameterError::MalformedReform(format!("{} {}", update.name, reason)))?;
        }
        info!("Applied {} parameter changes for {}", count, year);

        self.set_year(year)
    }

    /// Every key must name a known parameter (carrying values) or a known
    /// parameter's `_cpi` override (carrying a boolean)
    fn check_keys(&self, year: i32, mods: &YearMods) -> Result<()> {
        for (key, entry) in mods {
            if self.contains(key) {
                if let ModEntry::Indexing(_) = entry {
                    return Err(ParameterError::MalformedReform(format!(
                        "{} {} must map to a list of values",
                        year, key
                    )));
                }
            } else if cpi_root(self, key).is_some() {
                if let ModEntry::Values(_) = entry {
                    return Err(ParameterError::MalformedReform(format!(
                        "{} {} must map to a boolean",
                        year, key
                    )));
                }
            } else {
                return Err(ParameterError::InvalidReform(format!(
                    "{} {} unknown parameter name",
                    year, key
                )));
            }
        }
        Ok(())
    }

    /// Apply a multi-year reform.
    ///
    /// Names and value types are validated first; if any issue is found
    /// nothing is applied and the issues are returned. Otherwise years are
    /// applied in ascending order and the changed parameters are checked
    /// against their bounds. The current year is restored afterwards, and
    /// an error in any year leaves the store as it was.
    pub fn implement_reform(&mut self, reform: &Reform) -> Result<ValidationReport> {
        let (first, last) = match (reform.keys().next(), reform.keys().next_back()) {
            (Some(&first), Some(&last)) => (first, last),
            _ => return Ok(ValidationReport::default()),
        };
        if first < self.current_year() {
            return Err(ParameterError::InvalidReform(format!(
                "reform year {} is before current_year={}",
                first,
                self.current_year()
            )));
        }
        self.year_offset(last)?;

        let report = self.validate_names_types(reform);
        if !report.is_empty() {
            return Ok(report);
        }

        // Years are applied to a copy so a failure in a later year leaves
        // the store untouched
        let mut staged = self.clone();
        let mut changed: BTreeSet<String> = BTreeSet::new();
        staged.apply_years(reform, &mut changed)?;
        staged.set_year(self.current_year())?;
        *self = staged;

        Ok(self.validate_bounds(changed.iter().map(String::as_str)))
    }

    fn apply_years(&mut self, reform: &Reform, changed: &mut BTreeSet<String>) -> Result<()> {
        for (&year, mods) in reform {
            self.set_year(year)?;
            self.apply_mods(year, mods)?;
            for key in mods.keys() {
                let name = cpi_root(self, key).unwrap_or(key);
                changed.insert(name.to_string());
            }
        }
        Ok(())
    }
}
