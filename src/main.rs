//! Policy Params CLI
//!
//! Command-line interface for inspecting expanded parameters and running reforms

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;
use policy_params::parameters::load_reform;
use policy_params::{ParameterStore, ScenarioRunner, StoreConfig};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(author, version, about = "Time-indexed policy parameter engine")]
struct Cli {
    #[command(flatten)]
    store: StoreArgs,

    #[command(subcommand)]
    cmd: Command,
}

/// Store settings; anything omitted falls back to the environment, then defaults
#[derive(Args)]
struct StoreArgs {
    /// JSON parameter defaults file
    #[arg(long, global = true)]
    defaults: Option<PathBuf>,

    /// CSV growth-rate file (year,inflation,wage_growth)
    #[arg(long, global = true)]
    rates: Option<PathBuf>,

    #[arg(long, global = true)]
    start_year: Option<i32>,

    #[arg(long, global = true)]
    num_years: Option<usize>,
}

impl StoreArgs {
    fn config(&self) -> StoreConfig {
        let mut config = StoreConfig::from_env();
        if let Some(path) = &self.defaults {
            config.defaults_path = Some(path.clone());
        }
        if let Some(path) = &self.rates {
            config.rates_path = Some(path.clone());
        }
        if let Some(year) = self.start_year {
            config.start_year = year;
        }
        if let Some(years) = self.num_years {
            config.num_years = years;
        }
        config
    }
}

#[derive(Subcommand)]
enum Command {
    /// Print expanded values over the horizon
    Expand {
        /// Parameters to print (all when omitted)
        params: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Apply each reform file to its own copy of the baseline
    Reform {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Check baseline values against their bounds
    Validate,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = cli.store.config();
    let start = Instant::now();
    let store = ParameterStore::from_config(&config).context("Failed to build parameter store")?;
    info!("Built parameter store in {:?}", start.elapsed());

    match cli.cmd {
        Command::Expand { params, json } => expand(&store, &params, json),
        Command::Reform { files, json } => reform(store, &files, json),
        Command::Validate => validate(&store),
    }
}

fn expand(store: &ParameterStore, params: &[String], json: bool) -> Result<()> {
    let names: Vec<&str> = if params.is_empty() {
        store.names().collect()
    } else {
        for name in params {
            if !store.contains(name) {
                bail!("unknown parameter name {}", name);
            }
        }
        params.iter().map(String::as_str).collect()
    };

    if json {
        let selected: std::collections::BTreeMap<&str, _> = names
            .iter()
            .filter_map(|&name| store.parameter(name).map(|p| (name, p)))
            .collect();
        println!("{}", serde_json::to_string_pretty(&selected)?);
        return Ok(());
    }

    for name in names {
        let metadata = store.metadata(name).context("parameter vanished")?;
        println!(
            "{} ({}{})",
            name,
            metadata.value_type,
            if metadata.cpi_inflated { ", indexed" } else { "" }
        );
        for year in store.start_year()..=store.end_year() {
            if let Some(value) = store.value_at(name, year) {
                println!("  {:>4}  {}", year, value);
            }
        }
    }
    Ok(())
}

fn reform(store: ParameterStore, files: &[PathBuf], json: bool) -> Result<()> {
    let reforms = files
        .iter()
        .map(|path| load_reform(path).with_context(|| format!("Failed to load {}", path.display())))
        .collect::<Result<Vec<_>>>()?;

    let runner = ScenarioRunner::new(store);
    let start = Instant::now();
    let outcomes = runner.run_reforms(&reforms);
    info!("Ran {} reforms in {:?}", reforms.len(), start.elapsed());

    for (path, outcome) in files.iter().zip(outcomes) {
        let outcome = outcome.with_context(|| format!("Reform {} failed", path.display()))?;
        let changes = runner.changes(&outcome.store);

        if json {
            let doc = serde_json::json!({
                "reform": path.display().to_string(),
                "issues": outcome.report,
                "changes": changes,
            });
            println!("{}", serde_json::to_string_pretty(&doc)?);
            continue;
        }

        println!("Reform: {}", path.display());
        print!("{}", outcome.report);
        println!("{:>4}  {:<28} {:>24} {:>24}", "Year", "Parameter", "Baseline", "Reform");
        println!("{}", "-".repeat(84));
        for change in &changes {
            println!(
                "{:>4}  {:<28} {:>24} {:>24}",
                change.year,
                change.name,
                change.baseline.to_string(),
                change.reform.to_string()
            );
        }
        println!();
    }
    Ok(())
}

fn validate(store: &ParameterStore) -> Result<()> {
    let report = store.validate_all_bounds();
    if report.is_empty() {
        println!("All {} parameters within bounds", store.names().count());
        return Ok(());
    }
    print!("{}", report);
    bail!("{} bound violations", report.len())
}
