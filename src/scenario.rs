//! Scenario runner for batches of reforms
//!
//! Builds the baseline parameter store once, then evaluates any number of
//! reforms against independent copies of it.

use rayon::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::parameters::{ParameterStore, Reform, StoreConfig, ValidationReport, YearValue};

/// A reform applied to a copy of the baseline
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub store: ParameterStore,
    pub report: ValidationReport,
}

/// One parameter-year whose value differs from the baseline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValueChange {
    pub name: String,
    pub year: i32,
    pub baseline: YearValue,
    pub reform: YearValue,
}

/// Pre-built baseline for running many reform scenarios
///
/// # Example
/// ```ignore
/// let runner = ScenarioRunner::from_config(&StoreConfig::default())?;
/// for outcome in runner.run_reforms(&reforms) {
///     let outcome = outcome?;
///     println!("{}", outcome.report);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    baseline: ParameterStore,
}

impl ScenarioRunner {
    pub fn new(baseline: ParameterStore) -> Self {
        Self { baseline }
    }

    /// Create runner by loading the configured defaults and growth rates
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        Ok(Self::new(ParameterStore::from_config(config)?))
    }

    pub fn baseline(&self) -> &ParameterStore {
        &self.baseline
    }

    /// Apply one reform to a fresh copy of the baseline
    pub fn run(&self, reform: &Reform) -> Result<ScenarioOutcome> {
        let mut store = self.baseline.clone();
        let report = store.implement_reform(reform)?;
        Ok(ScenarioOutcome { store, report })
    }

    /// Apply each reform independently, in parallel
    pub fn run_reforms(&self, reforms: &[Reform]) -> Vec<Result<ScenarioOutcome>> {
        reforms.par_iter().map(|reform| self.run(reform)).collect()
    }

    /// Every parameter-year where `scenario` differs from the baseline
    pub fn changes(&self, scenario: &ParameterStore) -> Vec<ValueChange> {
        let mut changes = Vec::new();
        for name in self.baseline.names() {
            for year in self.baseline.start_year()..=self.baseline.end_year() {
                let (Some(baseline), Some(reform)) =
                    (self.baseline.value_at(name, year), scenario.value_at(name, year))
                else {
                    continue;
                };
                if baseline != reform {
                    changes.push(ValueChange {
                        name: name.to_string(),
                        year,
                        baseline,
                        reform,
                    });
                }
            }
        }
        changes
    }
}
