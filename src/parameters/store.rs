//! Full-horizon parameter store with a current-year view

use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use super::defaults::{Bounds, Defaults, ParameterSpec};
use super::expand::expand;
use super::indexing::{is_wage_indexed, GrowthRates, IndexingResolver};
use super::loader;
use super::values::{Series, ValueType, YearValue};
use crate::error::{ParameterError, Result};

/// Default first parameter year
pub const DEFAULT_START_YEAR: i32 = 2013;

/// Default number of parameter years
pub const DEFAULT_NUM_YEARS: usize = 14;

/// Configuration for building a parameter store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// First calendar year of the horizon
    pub start_year: i32,

    /// Number of years in the horizon
    pub num_years: usize,

    /// JSON defaults file; without one the store cannot be built
    pub defaults_path: Option<PathBuf>,

    /// CSV growth-rate file; without one nothing is indexed
    pub rates_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let dir = PathBuf::from(loader::DEFAULT_PARAMETERS_PATH);
        Self {
            start_year: DEFAULT_START_YEAR,
            num_years: DEFAULT_NUM_YEARS,
            defaults_path: Some(dir.join(loader::DEFAULTS_FILE_NAME)),
            rates_path: Some(dir.join(loader::GROWTH_RATES_FILE_NAME)),
        }
    }
}

impl StoreConfig {
    /// Defaults overridden by PARAMS_START_YEAR, PARAMS_NUM_YEARS,
    /// PARAMS_DEFAULTS and PARAMS_GROWTH_RATES when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(year) = std::env::var("PARAMS_START_YEAR").ok().and_then(|s| s.parse().ok()) {
            config.start_year = year;
        }
        if let Some(years) = std::env::var("PARAMS_NUM_YEARS").ok().and_then(|s| s.parse().ok()) {
            config.num_years = years;
        }
        if let Ok(path) = std::env::var("PARAMS_DEFAULTS") {
            config.defaults_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("PARAMS_GROWTH_RATES") {
            config.rates_path = Some(PathBuf::from(path));
        }
        config
    }
}

/// How many default years to trust when (re)building price-indexed parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub enum KnownYears {
    /// Use every supplied default year
    #[default]
    All,
    /// Keep only the first `n` supplied years of every price-indexed parameter
    Uniform(usize),
    /// Per-parameter year counts; unlisted parameters keep every year
    PerParameter(HashMap<String, usize>),
}

impl KnownYears {
    fn limit(&self, name: &str) -> Option<usize> {
        match self {
            KnownYears::All => None,
            KnownYears::Uniform(n) => Some(*n),
            KnownYears::PerParameter(map) => map.get(name).copied(),
        }
    }
}

/// Per-parameter metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParameterMetadata {
    pub value_type: ValueType,

    /// Growth indexing status; reforms may change it from their year onward
    pub cpi_inflated: bool,

    /// Indexed to wage growth instead of price inflation
    pub wage_indexed: bool,

    pub bounds: Option<Bounds>,

    pub long_name: Option<String>,

    pub description: Option<String>,
}

/// A parameter's metadata together with its full-horizon values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub metadata: ParameterMetadata,
    pub series: Series,
}

/// Every parameter's value for one year
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CurrentYearView {
    pub year: i32,
    pub values: BTreeMap<String, YearValue>,
}

impl CurrentYearView {
    pub fn get(&self, name: &str) -> Option<&YearValue> {
        self.values.get(name)
    }
}

/// Time-indexed parameter values for one simulation run.
///
/// Every series spans `num_years` years starting at `start_year`. Mutation
/// goes through `&mut self`, so a store has exactly one writer; independent
/// scenarios clone it.
#[derive(Debug, Clone)]
pub struct ParameterStore {
    start_year: i32,
    num_years: usize,
    current_year: i32,
    rates: GrowthRates,
    defaults: Defaults,
    params: BTreeMap<String, Parameter>,
    view: CurrentYearView,
}

impl ParameterStore {
    /// Expand every default across the horizon and select `start_year`
    pub fn initialize(
        start_year: i32,
        num_years: usize,
        defaults: Defaults,
        rates: GrowthRates,
    ) -> Result<Self> {
        if num_years == 0 {
            return Err(ParameterError::InvalidHorizon(
                "number of parameter years must be at least 1".to_string(),
            ));
        }
        let last_year = i32::try_from(num_years - 1)
            .ok()
            .and_then(|span| start_year.checked_add(span))
            .ok_or_else(|| {
                ParameterError::InvalidHorizon(format!(
                    "{} years from {} runs past the last representable year",
                    num_years, start_year
                ))
            })?;
        debug!("Parameter horizon {}-{}", start_year, last_year);
        let mut store = Self {
            start_year,
            num_years,
            current_year: start_year,
            rates,
            defaults,
            params: BTreeMap::new(),
            view: CurrentYearView::default(),
        };
        store.set_default_vals(&KnownYears::All)?;
        info!(
            "Expanded {} parameters over {}-{}",
            store.params.len(),
            store.start_year,
            store.end_year()
        );
        Ok(store)
    }

    /// Build a store from configured files
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let defaults_path = config
            .defaults_path
            .as_ref()
            .ok_or_else(|| ParameterError::UnimplementedDefaults("ParameterStore".to_string()))?;
        let defaults = loader::load_defaults(defaults_path)?;
        let rates = match &config.rates_path {
            Some(path) => loader::load_growth_rates(path, config.start_year)?,
            None => GrowthRates::none(),
        };
        Self::initialize(config.start_year, config.num_years, defaults, rates)
    }

    /// Rebuild every series from its defaults.
    ///
    /// Indexing status is taken from current metadata, so a status changed
    /// by an earlier reform carries over. The current year returns to
    /// `start_year`.
    pub fn reset_defaults(&mut self, known_years: &KnownYears) -> Result<()> {
        self.set_default_vals(known_years)
    }

    fn set_default_vals(&mut self, known_years: &KnownYears) -> Result<()> {
        let resolver = IndexingResolver::new(&self.rates, self.start_year);
        let mut params = BTreeMap::new();
        for (name, spec) in &self.defaults {
            let cpi_inflated = self
                .params
                .get(name)
                .map(|p| p.metadata.cpi_inflated)
                .unwrap_or(spec.cpi_inflated);
            let parameter = build_parameter(
                name,
                spec,
                cpi_inflated,
                known_years,
                &resolver,
                self.num_years,
            )?;
            params.insert(name.clone(), parameter);
        }
        self.params = params;
        self.set_year(self.start_year)
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + (self.num_years - 1) as i32
    }

    pub fn num_years(&self) -> usize {
        self.num_years
    }

    pub fn current_year(&self) -> i32 {
        self.current_year
    }

    pub fn rates(&self) -> &GrowthRates {
        &self.rates
    }

    pub(crate) fn resolver(&self) -> IndexingResolver<'_> {
        IndexingResolver::new(&self.rates, self.start_year)
    }

    /// Select the year exposed through the current-year view
    pub fn set_year(&mut self, year: i32) -> Result<()> {
        let offset = self.year_offset(year)?;
        self.current_year = year;
        self.view = CurrentYearView {
            year,
            values: self
                .params
                .iter()
                .filter_map(|(name, p)| p.series.at(offset).map(|v| (name.clone(), v)))
                .collect(),
        };
        debug!("Parameter year set to {}", year);
        Ok(())
    }

    /// Zero-based horizon offset of `year`
    pub fn year_offset(&self, year: i32) -> Result<usize> {
        if year < self.start_year || year > self.end_year() {
            return Err(ParameterError::OutOfRange {
                year,
                start: self.start_year,
                end: self.end_year(),
            });
        }
        Ok((year - self.start_year) as usize)
    }

    /// Value of `name` in the current year; `None` for unknown names
    pub fn current_value(&self, name: &str) -> Option<&YearValue> {
        self.view.get(name)
    }

    pub fn current_view(&self) -> &CurrentYearView {
        &self.view
    }

    /// Value of `name` in any horizon year
    pub fn value_at(&self, name: &str, year: i32) -> Option<YearValue> {
        let offset = self.year_offset(year).ok()?;
        self.params.get(name)?.series.at(offset)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.params.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.params.keys().map(String::as_str)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.params.get(name)
    }

    pub(crate) fn parameter_mut(&mut self, name: &str) -> Option<&mut Parameter> {
        self.params.get_mut(name)
    }

    pub fn series(&self, name: &str) -> Option<&Series> {
        self.params.get(name).map(|p| &p.series)
    }

    pub fn metadata(&self, name: &str) -> Option<&ParameterMetadata> {
        self.params.get(name).map(|p| &p.metadata)
    }
}

fn build_parameter(
    name: &str,
    spec: &ParameterSpec,
    cpi_inflated: bool,
    known_years: &KnownYears,
    resolver: &IndexingResolver<'_>,
    num_years: usize,
) -> Result<Parameter> {
    let invalid = |reason: String| ParameterError::InvalidDefault {
        name: name.to_string(),
        reason,
    };
    let wage_indexed = is_wage_indexed(name);

    let mut series = Series::from_values(spec.value_type, &spec.value, None).map_err(invalid)?;
    if series.is_empty() {
        return Err(invalid("no default value".to_string()));
    }
    if cpi_inflated && !wage_indexed {
        if let Some(limit) = known_years.limit(name) {
            series = series.slice(0, limit.max(1));
        }
    }

    let rates = if cpi_inflated { resolver.rates_for(name) } else { None };
    let mut expanded = expand(&series, cpi_inflated, rates, num_years)?;
    if expanded.len() > num_years {
        expanded = expanded.slice(0, num_years);
    }
    debug!(
        "Expanded {} from {} to {} years (indexed: {})",
        name,
        series.len(),
        expanded.len(),
        cpi_inflated && rates.is_some()
    );

    Ok(Parameter {
        metadata: ParameterMetadata {
            value_type: spec.value_type,
            cpi_inflated,
            wage_indexed,
            bounds: spec.valid_values.filter(|b| !b.is_empty()),
            long_name: spec.long_name.clone(),
            description: spec.description.clone(),
        },
        series: expanded,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::test_support::{rate_store, real_values};
    use crate::parameters::values::Scalar;
    use std::path::Path;

    #[test]
    fn test_initialize_expands_indexed_parameter() {
        let store = rate_store();
        assert_eq!(store.end_year(), 2024);
        assert_eq!(store.current_year(), 2020);
        assert_eq!(real_values(&store, "rate"), vec![100.0, 102.0, 104.04, 106.12, 108.24]);
    }

    #[test]
    fn test_set_year_updates_view() {
        let mut store = rate_store();
        assert_eq!(store.current_value("rate"), Some(&YearValue::from(100.0)));

        store.set_year(2023).unwrap();
        assert_eq!(store.current_year(), 2023);
        assert_eq!(store.current_value("rate"), Some(&YearValue::from(106.12)));
        assert_eq!(store.current_view().year, 2023);
        assert_eq!(store.current_value("unknown"), None);
    }

    #[test]
    fn test_set_year_out_of_range() {
        let mut store = rate_store();
        assert!(matches!(
            store.set_year(2019),
            Err(ParameterError::OutOfRange { year: 2019, start: 2020, end: 2024 })
        ));
        assert!(matches!(store.set_year(2025), Err(ParameterError::OutOfRange { .. })));
        assert_eq!(store.current_year(), 2020);
    }

    #[test]
    fn test_unindexed_parameters_carry_forward() {
        let mut defaults = Defaults::new();
        defaults.insert("flat".to_string(), ParameterSpec::real(&[0.1, 0.15], false));
        let store =
            ParameterStore::initialize(2020, 4, defaults, GrowthRates::constant(0.5, 4)).unwrap();
        assert_eq!(real_values(&store, "flat"), vec![0.1, 0.15, 0.15, 0.15]);
    }

    #[test]
    fn test_wage_indexed_parameter_uses_wage_growth() {
        let mut defaults = Defaults::new();
        defaults.insert("_SS_Earnings_c".to_string(), ParameterSpec::real(&[1000.0], true));
        defaults.insert("_STD".to_string(), ParameterSpec::real(&[1000.0], true));
        let rates = GrowthRates {
            inflation: Some(vec![0.01; 3]),
            wage_growth: Some(vec![0.05; 3]),
        };
        let store = ParameterStore::initialize(2020, 3, defaults, rates).unwrap();
        assert_eq!(real_values(&store, "_SS_Earnings_c"), vec![1000.0, 1050.0, 1102.5]);
        assert_eq!(real_values(&store, "_STD"), vec![1000.0, 1010.0, 1020.1]);
        assert!(store.metadata("_SS_Earnings_c").unwrap().wage_indexed);
    }

    #[test]
    fn test_long_defaults_trimmed_to_horizon() {
        let mut defaults = Defaults::new();
        defaults.insert("long".to_string(), ParameterSpec::real(&[1.0, 2.0, 3.0, 4.0], false));
        let store = ParameterStore::initialize(2020, 2, defaults, GrowthRates::none()).unwrap();
        assert_eq!(real_values(&store, "long"), vec![1.0, 2.0]);
    }

    #[test]
    fn test_zero_years_rejected() {
        let result = ParameterStore::initialize(2020, 0, Defaults::new(), GrowthRates::none());
        assert!(matches!(result, Err(ParameterError::InvalidHorizon(_))));
    }

    #[test]
    fn test_oversized_horizon_rejected() {
        let result =
            ParameterStore::initialize(2020, i32::MAX as usize, Defaults::new(), GrowthRates::none());
        assert!(matches!(result, Err(ParameterError::InvalidHorizon(_))));

        let result = ParameterStore::initialize(
            2020,
            i32::MAX as usize + 10,
            Defaults::new(),
            GrowthRates::none(),
        );
        assert!(matches!(result, Err(ParameterError::InvalidHorizon(_))));

        let store = ParameterStore::initialize(i32::MAX - 1, 2, Defaults::new(), GrowthRates::none())
            .unwrap();
        assert_eq!(store.end_year(), i32::MAX);
    }

    #[test]
    fn test_metadata_carries_labels() {
        let mut defaults = Defaults::new();
        let mut spec = ParameterSpec::real(&[1.0], false);
        spec.long_name = Some("Rate one".to_string());
        spec.description = Some("Lowest bracket rate".to_string());
        defaults.insert("_II_rt1".to_string(), spec);
        let store = ParameterStore::initialize(2020, 2, defaults, GrowthRates::none()).unwrap();
        let metadata = store.metadata("_II_rt1").unwrap();
        assert_eq!(metadata.long_name.as_deref(), Some("Rate one"));
        assert_eq!(metadata.description.as_deref(), Some("Lowest bracket rate"));
    }

    #[test]
    fn test_empty_default_rejected() {
        let mut defaults = Defaults::new();
        defaults.insert("empty".to_string(), ParameterSpec::real(&[], false));
        let result = ParameterStore::initialize(2020, 3, defaults, GrowthRates::none());
        assert!(matches!(result, Err(ParameterError::InvalidDefault { .. })));
    }

    #[test]
    fn test_known_years_truncates_price_indexed_only() {
        let mut defaults = Defaults::new();
        defaults.insert("_STD".to_string(), ParameterSpec::real(&[100.0, 200.0, 300.0], true));
        defaults.insert(
            "_SS_Earnings_c".to_string(),
            ParameterSpec::real(&[100.0, 200.0, 300.0], true),
        );
        defaults.insert("_flat".to_string(), ParameterSpec::real(&[1.0, 2.0, 3.0], false));
        let mut store =
            ParameterStore::initialize(2020, 4, defaults, GrowthRates::constant(0.1, 4)).unwrap();

        store.set_year(2022).unwrap();
        store.reset_defaults(&KnownYears::Uniform(1)).unwrap();
        assert_eq!(store.current_year(), 2020);
        assert_eq!(real_values(&store, "_STD"), vec![100.0, 110.0, 121.0, 133.1]);
        assert_eq!(real_values(&store, "_SS_Earnings_c"), vec![100.0, 200.0, 300.0, 330.0]);
        assert_eq!(real_values(&store, "_flat"), vec![1.0, 2.0, 3.0, 3.0]);

        let per = KnownYears::PerParameter(HashMap::from([("_STD".to_string(), 2)]));
        store.reset_defaults(&per).unwrap();
        assert_eq!(real_values(&store, "_STD"), vec![100.0, 200.0, 220.0, 242.0]);
    }

    #[test]
    fn test_value_at() {
        let store = rate_store();
        assert_eq!(store.value_at("rate", 2021), Some(YearValue::Scalar(Scalar::Real(102.0))));
        assert_eq!(store.value_at("rate", 2030), None);
        assert_eq!(store.value_at("nope", 2021), None);
    }

    #[test]
    fn test_missing_defaults_path() {
        let config = StoreConfig {
            defaults_path: None,
            ..StoreConfig::default()
        };
        assert!(matches!(
            ParameterStore::from_config(&config),
            Err(ParameterError::UnimplementedDefaults(_))
        ));
    }

    #[test]
    fn test_from_config_with_bundled_data() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join(loader::DEFAULT_PARAMETERS_PATH);
        let config = StoreConfig {
            defaults_path: Some(dir.join(loader::DEFAULTS_FILE_NAME)),
            rates_path: Some(dir.join(loader::GROWTH_RATES_FILE_NAME)),
            ..StoreConfig::default()
        };
        let store = ParameterStore::from_config(&config).unwrap();
        assert_eq!(store.start_year(), DEFAULT_START_YEAR);
        assert_eq!(store.end_year(), DEFAULT_START_YEAR + DEFAULT_NUM_YEARS as i32 - 1);
        for name in store.names() {
            assert_eq!(store.series(name).unwrap().len(), DEFAULT_NUM_YEARS, "{}", name);
        }
    }
}
