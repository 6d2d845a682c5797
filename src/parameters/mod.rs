//! Time-indexed policy parameters
//!
//! Each parameter holds one value (or one fixed-width row) per year of the
//! horizon. Growth-indexed parameters are extended past their known years by
//! compounding price inflation or, for the earnings caps, wage growth.
//!
//! # Example
//!
//! ```rust,ignore
//! use policy_params::parameters::{ParameterStore, StoreConfig, load_reform};
//!
//! let mut store = ParameterStore::from_config(&StoreConfig::default())?;
//! let report = store.implement_reform(&load_reform(path)?)?;
//! store.set_year(2020)?;
//! println!("{:?}", store.current_value("_SS_Earnings_c"));
//! ```

mod defaults;
mod expand;
mod indexing;
pub mod loader;
mod reform;
mod store;
mod validate;
mod values;
mod year_dict;

pub use defaults::{Bounds, Defaults, ParameterSpec};
pub use expand::{expand, expand_1d, expand_2d, round_growth, Indexable, VALUE_CEILING};
pub use indexing::{is_wage_indexed, GrowthRates, IndexingResolver, WAGE_INDEXED_PARAMS};
pub use loader::{load_defaults, load_growth_rates, load_reform, parse_defaults, parse_reform};
pub use reform::{ModEntry, Reform, YearMods, CPI_SUFFIX};
pub use store::{
    CurrentYearView, KnownYears, Parameter, ParameterMetadata, ParameterStore, StoreConfig,
    DEFAULT_NUM_YEARS, DEFAULT_START_YEAR,
};
pub use validate::{Issue, ValidationReport};
pub use values::{Element, Grid, Scalar, Series, ValueType, YearValue};
pub use year_dict::{values_for_year, ParamInfo};
