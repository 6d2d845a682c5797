//! Reform and bound validation
//!
//! Validation never fails fast: every problem becomes an [`Issue`] in a
//! [`ValidationReport`] so one pass reports all of them.

use log::warn;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

use super::reform::{cpi_root, ModEntry, Reform};
use super::store::ParameterStore;
use super::values::{Scalar, ValueType};

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Issue {
    UnknownName {
        year: i32,
        name: String,
    },
    WrongType {
        year: i32,
        name: String,
        value: Scalar,
        expected: ValueType,
    },
    BelowMin {
        year: i32,
        name: String,
        value: f64,
        min: f64,
    },
    AboveMax {
        year: i32,
        name: String,
        value: f64,
        max: f64,
    },
}

impl Issue {
    pub fn year(&self) -> i32 {
        match self {
            Issue::UnknownName { year, .. }
            | Issue::WrongType { year, .. }
            | Issue::BelowMin { year, .. }
            | Issue::AboveMax { year, .. } => *year,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Issue::UnknownName { name, .. }
            | Issue::WrongType { name, .. }
            | Issue::BelowMin { name, .. }
            | Issue::AboveMax { name, .. } => name,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::UnknownName { year, name } => {
                write!(f, "ERROR: {} {} unknown parameter name", year, name)
            }
            Issue::WrongType { year, name, value, expected } => {
                write!(f, "ERROR: {} {} value {} is not {}", year, name, value, expected)
            }
            Issue::BelowMin { year, name, value, min } => {
                write!(f, "ERROR: {} {} value {} < min value {}", year, name, value, min)
            }
            Issue::AboveMax { year, name, value, max } => {
                write!(f, "ERROR: {} {} value {} > max value {}", year, name, value, max)
            }
        }
    }
}

/// Issues collected by one validation pass
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<Issue>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn push(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, other: ValidationReport) {
        self.issues.extend(other.issues);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{}", issue)?;
        }
        Ok(())
    }
}

impl ParameterStore {
    /// Check every year's names and supplied value types.
    ///
    /// A `_cpi` key is known when its root is, and only accepts a boolean.
    /// A boolean given where values belong is left to reform application,
    /// which rejects it.
    pub fn validate_names_types(&self, reform: &Reform) -> ValidationReport {
        let mut report = ValidationReport::default();
        for (&year, mods) in reform {
            for (name, entry) in mods {
                if let Some(param) = self.parameter(name) {
                    if let ModEntry::Values(values) = entry {
                        let expected = param.metadata.value_type;
                        for value in values.iter().flat_map(|v| v.scalars()) {
                            if !expected.accepts(value) {
                                report.push(Issue::WrongType {
                                    year,
                                    name: name.clone(),
                                    value: value.clone(),
                                    expected,
                                });
                            }
                        }
                    }
                } else if cpi_root(self, name).is_some() {
                    if let ModEntry::Values(values) = entry {
                        for value in values.iter().flat_map(|v| v.scalars()) {
                            report.push(Issue::WrongType {
                                year,
                                name: name.clone(),
                                value: value.clone(),
                                expected: ValueType::Boolean,
                            });
                        }
                    }
                } else {
                    report.push(Issue::UnknownName {
                        year,
                        name: name.clone(),
                    });
                }
            }
        }
        for issue in report.iter() {
            warn!("{}", issue);
        }
        report
    }

    /// Compare every horizon year of the named parameters against their bounds.
    ///
    /// Unknown, unbounded and non-numeric parameters are skipped. Columns of
    /// vector parameters are reported as `name[column]`.
    pub fn validate_bounds<'a, I>(&self, names: I) -> ValidationReport
    where
        I: IntoIterator<Item = &'a str>,
    {
        let names: BTreeSet<&str> = names.into_iter().collect();
        let mut report = ValidationReport::default();
        for name in names {
            let param = match self.parameter(name) {
                Some(param) => param,
                None => continue,
            };
            let bounds = match param.metadata.bounds {
                Some(bounds) if param.metadata.value_type.is_numeric() => bounds,
                _ => continue,
            };
            let vector = param.series.width().is_some();
            for (i, col, value) in param.series.numeric_elements() {
                let year = self.start_year() + i as i32;
                let label = || {
                    if vector {
                        format!("{}[{}]", name, col)
                    } else {
                        name.to_string()
                    }
                };
                if let Some(min) = bounds.min {
                    if value < min {
                        report.push(Issue::BelowMin { year, name: label(), value, min });
                    }
                }
                if let Some(max) = bounds.max {
                    if value > max {
                        report.push(Issue::AboveMax { year, name: label(), value, max });
                    }
                }
            }
        }
        for issue in report.iter() {
            warn!("{}", issue);
        }
        report
    }

    /// Bound check over every parameter
    pub fn validate_all_bounds(&self) -> ValidationReport {
        let names: Vec<&str> = self.names().collect();
        self.validate_bounds(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::defaults::{Defaults, ParameterSpec};
    use crate::parameters::indexing::GrowthRates;
    use crate::parameters::loader::parse_reform;

    fn store() -> ParameterStore {
        let json = serde_json::json!({
            "rate": {"value_type": "real", "value": [0.5], "valid_values": {"min": 0, "max": 1}},
            "flag": {"value_type": "boolean", "value": [false]},
            "count": {"value_type": "integer", "value": [2], "valid_values": {"min": 1}},
            "label": {"value_type": "string", "value": ["a"]},
            "caps": {
                "value_type": "real",
                "cpi_inflated": true,
                "value": [[10, 20]],
                "valid_values": {"max": 21}
            }
        });
        let defaults: Defaults = serde_json::from_value(json).unwrap();
        ParameterStore::initialize(2020, 3, defaults, GrowthRates::constant(0.05, 3)).unwrap()
    }

    #[test]
    fn test_names_and_types() {
        let store = store();
        let reform = parse_reform(
            r#"{
                "2020": {"rate": [1], "flag": [true], "count": [3], "label": ["b"], "caps_cpi": false},
                "2021": {"rate": [true], "flag": [1], "count": [2.5], "label": [7], "nope": [1], "nope_cpi": true}
            }"#,
        )
        .unwrap();
        let report = store.validate_names_types(&reform);
        let lines: Vec<String> = report.iter().map(|i| i.to_string()).collect();
        assert_eq!(
            lines,
            vec![
                "ERROR: 2021 count value 2.5 is not integer",
                "ERROR: 2021 flag value 1 is not boolean",
                "ERROR: 2021 label value 7 is not a string",
                "ERROR: 2021 nope unknown parameter name",
                "ERROR: 2021 nope_cpi unknown parameter name",
                "ERROR: 2021 rate value true is not a number",
            ]
        );
        assert!(report.iter().all(|i| i.year() == 2021));
    }

    #[test]
    fn test_every_vector_element_checked() {
        let store = store();
        let reform = parse_reform(r#"{"2020": {"caps": [[1, "x"]]}}"#).unwrap();
        let report = store.validate_names_types(&reform);
        assert_eq!(report.len(), 1);
        assert_eq!(report.issues[0].name(), "caps");
    }

    #[test]
    fn test_cpi_key_only_takes_boolean() {
        let store = store();
        let reform = parse_reform(r#"{"2020": {"rate_cpi": [1]}}"#).unwrap();
        let report = store.validate_names_types(&reform);
        assert_eq!(report.to_string(), "ERROR: 2020 rate_cpi value 1 is not boolean\n");
    }

    #[test]
    fn test_bounds_report_every_violation() {
        let mut defaults = Defaults::new();
        defaults.insert(
            "rate".to_string(),
            ParameterSpec::real(&[-1.0, 0.5, 2.0], false).with_bounds(Some(0.0), Some(1.0)),
        );
        let store = ParameterStore::initialize(2020, 3, defaults, GrowthRates::none()).unwrap();
        let report = store.validate_all_bounds();
        assert_eq!(
            report.to_string(),
            "ERROR: 2020 rate value -1 < min value 0\nERROR: 2022 rate value 2 > max value 1\n"
        );
        assert!(matches!(report.issues[0], Issue::BelowMin { year: 2020, .. }));
    }

    #[test]
    fn test_vector_bounds_after_indexing() {
        let store = store();
        // caps grows 20 -> 21 -> 22.05, only the last breaks max 21
        let report = store.validate_bounds(["caps"]);
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.issues[0],
            Issue::AboveMax {
                year: 2022,
                name: "caps[1]".to_string(),
                value: 22.05,
                max: 21.0
            }
        );
    }

    #[test]
    fn test_clean_store_has_no_bound_issues() {
        let mut store = store();
        assert!(store.validate_bounds(["rate", "count", "flag", "label", "missing"]).is_empty());

        store.set_year(2021).unwrap();
        let reform = parse_reform(r#"{"2021": {"count": [0]}}"#).unwrap();
        store.apply_year_mods(&reform).unwrap();
        let report = store.validate_bounds(["count"]);
        assert_eq!(report.len(), 2);
        assert!(report.iter().all(|i| matches!(i, Issue::BelowMin { .. })));
    }

    #[test]
    fn test_report_serializes_with_kind() {
        let issue = Issue::UnknownName {
            year: 2020,
            name: "x".to_string(),
        };
        let json = serde_json::to_value(&issue).unwrap();
        assert_eq!(json["kind"], "unknown_name");
        assert_eq!(json["year"], 2020);
    }
}
