//! Default-value records as read from a parameter defaults file

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::values::{ValueType, YearValue};

/// Defaults for every parameter, keyed by name
pub type Defaults = BTreeMap<String, ParameterSpec>;

/// Inclusive validity bounds for a numeric parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl Bounds {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }
}

/// One parameter's entry in the defaults file.
///
/// Fields the engine does not use (labels, notes) are ignored when parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(default)]
    pub long_name: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    pub value_type: ValueType,

    /// Whether years past the supplied values are growth indexed
    #[serde(default)]
    pub cpi_inflated: bool,

    #[serde(default)]
    pub valid_values: Option<Bounds>,

    /// Known values, one entry per year starting at the first parameter year
    pub value: Vec<YearValue>,
}

impl ParameterSpec {
    /// Real-valued spec with the given known values
    pub fn real(values: &[f64], cpi_inflated: bool) -> Self {
        Self {
            long_name: None,
            description: None,
            value_type: ValueType::Real,
            cpi_inflated,
            valid_values: None,
            value: values.iter().map(|&x| YearValue::from(x)).collect(),
        }
    }

    pub fn with_bounds(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.valid_values = Some(Bounds { min, max });
        self
    }
}
