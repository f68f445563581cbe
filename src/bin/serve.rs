//! Serve the credit scoring form
//!
//! Loads the trained artifacts once and serves `GET /` and `POST /`.
//! Refuses to start if the artifacts are missing or inconsistent.
//!
//! Usage:
//!   credit-serve --model-dir output_model --bind 127.0.0.1:5000

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use credit_scoring::utils::{init_logging, load_config};
use credit_scoring::{web, ScoringContext};

#[derive(Parser)]
#[command(name = "credit-serve")]
#[command(about = "Serve the single-applicant credit scoring form")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Directory holding the trained artifacts (overrides the config file)
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Listen address (overrides the config file)
    #[arg(short, long)]
    bind: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = load_config(&cli.config)?.server;
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    let context = ScoringContext::load(&config.model_dir)
        .with_context(|| format!("Failed to load artifacts from {}", config.model_dir.display()))?;
    info!(
        "Loaded model run {} with {} features",
        context.run_id(),
        context.feature_names().len()
    );

    web::serve(Arc::new(context), &config.bind)
        .await
        .with_context(|| format!("Server on {} stopped", config.bind))?;
    Ok(())
}
