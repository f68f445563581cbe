//! Train the credit scoring model
//!
//! Loads the labeled CSV, searches booster hyperparameters, calibrates the
//! best configuration and writes the artifacts the scoring form loads.
//!
//! Usage:
//!   credit-train --data cs-training.csv --out-dir output_model --trials 30

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use credit_scoring::utils::{init_logging, load_config};
use credit_scoring::TrainingPipeline;

#[derive(Parser)]
#[command(name = "credit-train")]
#[command(about = "Train the calibrated credit-risk model")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Labeled training CSV (overrides the config file)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Artifact output directory (overrides the config file)
    #[arg(short, long)]
    out_dir: Option<PathBuf>,

    /// Number of hyperparameter search trials (overrides the config file)
    #[arg(short, long)]
    trials: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli.config)?.training;
    if let Some(data) = cli.data {
        config.data_file = data;
    }
    if let Some(out_dir) = cli.out_dir {
        config.out_dir = out_dir;
    }
    if let Some(trials) = cli.trials {
        config.n_trials = trials;
    }
    config.validate()?;

    info!("Training with {} trials, output to {}", config.n_trials, config.out_dir.display());
    let pipeline = TrainingPipeline::new(config);
    let report = pipeline.run().context("Training failed")?;

    report.log_summary(10);
    Ok(())
}
