//! `shelter` command-line front end.
//!
//! # Responsibility
//! - Resolve configuration from `--config`, `--db` and defaults.
//! - Open one connection per invocation and print the result as JSON.

mod cli;
mod commands;
mod predictor;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use log::info;
use shelter_core::{init_logging, LedgerConfig};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LedgerConfig::load(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => LedgerConfig::default(),
    };
    if let Some(db) = cli.db {
        config.database_path = db;
        config.validate()?;
    }
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to start logging")?;
    }

    info!(
        "event=cli_start module=cli status=ok version={}",
        shelter_core::core_version()
    );
    let output = commands::execute(&config, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
