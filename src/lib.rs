//! Policy Params - Time-indexed policy parameter engine for tax simulation
//!
//! This library provides:
//! - Parameter defaults expanded over a fixed horizon of years
//! - Price and wage growth indexing of unknown future years
//! - Year-keyed reforms applied to a current-year snapshot
//! - Name, type and bound validation with structured reports
//! - Multi-reform scenario framework
//! - TAXSIM-35 input translation

pub mod error;
pub mod parameters;
pub mod scenario;
pub mod taxsim;

// Re-export commonly used types
pub use error::{ParameterError, Result};
pub use parameters::{
    GrowthRates, KnownYears, ParameterStore, Reform, StoreConfig, ValidationReport, YearValue,
};
pub use scenario::{ScenarioRunner, ValueChange};
