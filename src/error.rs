//! Parameter engine errors

use thiserror::Error;

/// Parameter engine result type
pub type Result<T> = std::result::Result<T, ParameterError>;

/// Structural errors raised by the parameter engine.
///
/// Validation problems (unknown names, wrong value types, out-of-bound
/// values) are not errors; they are collected into a
/// [`ValidationReport`](crate::parameters::ValidationReport).
#[derive(Debug, Error)]
pub enum ParameterError {
    #[error("year {year} must be in [{start},{end}] range")]
    OutOfRange { year: i32, start: i32, end: i32 },

    #[error("malformed reform: {0}")]
    MalformedReform(String),

    #[error("invalid reform: {0}")]
    InvalidReform(String),

    #[error("no default-values source configured for {0}")]
    UnimplementedDefaults(String),

    #[error("invalid default for {name}: {reason}")]
    InvalidDefault { name: String, reason: String },

    #[error("cannot expand an empty value list")]
    EmptyValues,

    #[error("growth-rate series has {available} rates but {needed} are required")]
    GrowthRatesTooShort { needed: usize, available: usize },

    #[error("invalid horizon: {0}")]
    InvalidHorizon(String),

    #[error("invalid growth rates: {0}")]
    InvalidRates(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
