//! Translate a TAXSIM-35 input file into a tax-calculator CSV input file
//!
//! Any existing OUTPUT file is overwritten.

use anyhow::{Context, Result};
use clap::Parser;
use policy_params::taxsim::prepare_input_file;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Translate TAXSIM-35 input into tax-calculator input")]
struct Cli {
    /// Whitespace-delimited TAXSIM-35 input file
    input: PathBuf,

    /// CSV file to write
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    println!("File in and out names: {} {}", cli.input.display(), cli.output.display());

    let rows = prepare_input_file(&cli.input, &cli.output)
        .with_context(|| format!("Failed to translate {}", cli.input.display()))?;
    println!("Wrote {} rows to {}", rows, cli.output.display());
    Ok(())
}
