// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # Guardrails Arena binary
//!
//! The `arena` binary launches the side-by-side chatbot comparison service.
//!
//! ## Commands
//!
//! - `arena serve` - Run the HTTP service the arena UI talks to
//! - `arena check` - Probe every configured provider, the guard model, and
//!   the rails engine

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

/// Guardrails Arena - Compare anonymized guarded chatbots side by side
#[derive(Parser)]
#[command(name = "arena")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration manifest (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "ARENA_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "ARENA_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the arena HTTP service
    Serve {
        /// Listen address (overrides the manifest)
        #[arg(long, env = "ARENA_LISTEN")]
        listen: Option<String>,
    },

    /// Probe the configured endpoints and report reachability
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Serve { listen } => commands::serve::run(cli.config.as_deref(), listen).await,
        Commands::Check => commands::check::run(cli.config.as_deref()).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
