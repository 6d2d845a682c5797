//! Year-by-year assumption dictionaries
//!
//! Some consumers keep simple real-valued assumptions outside a parameter
//! store, as `year -> {name -> value}` updates over per-parameter defaults.

use serde::Deserialize;
use std::collections::BTreeMap;

use crate::error::{ParameterError, Result};

/// Default and permitted range of one assumption parameter
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ParamInfo {
    pub default_value: f64,
    pub minimum_value: f64,
    pub maximum_value: f64,
}

/// Assumption values in force in `cyear`.
///
/// Starts from every parameter's default and applies each year's updates in
/// ascending order up to and including `cyear`. Unknown names and values
/// outside `[minimum_value, maximum_value]` are rejected.
pub fn values_for_year(
    cyear: i32,
    param_dict: &BTreeMap<i32, BTreeMap<String, f64>>,
    param_info: &BTreeMap<String, ParamInfo>,
) -> Result<BTreeMap<String, f64>> {
    let mut values: BTreeMap<String, f64> = param_info
        .iter()
        .map(|(name, info)| (name.clone(), info.default_value))
        .collect();

    for (year, updates) in param_dict.range(..=cyear) {
        for (name, &value) in updates {
            let info = param_info.get(name).ok_or_else(|| {
                ParameterError::InvalidReform(format!("{} {} unknown parameter name", year, name))
            })?;
            if value < info.minimum_value || value > info.maximum_value {
                return Err(ParameterError::InvalidReform(format!(
                    "{} {} value {} outside [{}, {}]",
                    year, name, value, info.minimum_value, info.maximum_value
                )));
            }
            values.insert(name.clone(), value);
        }
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> BTreeMap<String, ParamInfo> {
        let json = r#"{
            "elasticity": {"default_value": 0.0, "minimum_value": -1.0, "maximum_value": 1.0},
            "share": {"default_value": 0.5, "minimum_value": 0.0, "maximum_value": 1.0}
        }"#;
        serde_json::from_str(json).unwrap()
    }

    fn updates() -> BTreeMap<i32, BTreeMap<String, f64>> {
        BTreeMap::from([
            (2018, BTreeMap::from([("share".to_string(), 0.7)])),
            (2020, BTreeMap::from([("elasticity".to_string(), -0.4), ("share".to_string(), 0.8)])),
        ])
    }

    #[test]
    fn test_defaults_before_first_update() {
        let values = values_for_year(2017, &updates(), &info()).unwrap();
        assert_eq!(values["share"], 0.5);
        assert_eq!(values["elasticity"], 0.0);
    }

    #[test]
    fn test_updates_apply_through_cyear() {
        let values = values_for_year(2019, &updates(), &info()).unwrap();
        assert_eq!(values["share"], 0.7);
        assert_eq!(values["elasticity"], 0.0);

        let values = values_for_year(2025, &updates(), &info()).unwrap();
        assert_eq!(values["share"], 0.8);
        assert_eq!(values["elasticity"], -0.4);
    }

    #[test]
    fn test_rejects_unknown_and_out_of_range() {
        let mut bad = updates();
        bad.insert(2019, BTreeMap::from([("mystery".to_string(), 1.0)]));
        assert!(values_for_year(2019, &bad, &info()).is_err());
        // Later years are never inspected
        assert!(values_for_year(2018, &bad, &info()).is_ok());

        let high = BTreeMap::from([(2018, BTreeMap::from([("share".to_string(), 1.5)]))]);
        assert!(values_for_year(2018, &high, &info()).is_err());
    }
}
