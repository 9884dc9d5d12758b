// Copyright (C) 2025 Category Labs, Inc.
// SPDX-License-Identifier: GPL-3.0-or-later

//! Darwinex trailing stop-loss updater.
//!
//! Reads the configured trailing rules, compares them with the stop-loss
//! orders on the open positions and raises the ones that lag too far behind.

mod api;
mod config;
mod error;
mod executor;
mod position;
mod runner;

use clap::Parser;
use config::{ApiSettings, Config, ConfigFile};
use error::TrailError;
use runner::Runner;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Debug, Parser)]
#[command(version, about = "Trailing stop-loss updater for Darwinex positions")]
struct Args {
    /// Your config file
    #[arg(short = 'f', long = "file", default_value = "config.json")]
    file: PathBuf,

    /// Shows debug info
    #[arg(short, long)]
    debug: bool,

    /// Lists the available accounts with their investor IDs and exits.
    /// Use it to pick the investorid for the config file.
    #[arg(short = 'i', long = "investors")]
    investors: bool,
}

fn init_logging(debug: bool) -> anyhow::Result<()> {
    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    // RUST_LOG wins over -d when set.
    match EnvFilter::try_from_default_env() {
        Ok(filter) => {
            tracing::subscriber::set_global_default(builder.with_env_filter(filter).finish())?
        }
        Err(_) => {
            let level = if debug { Level::DEBUG } else { Level::INFO };
            tracing::subscriber::set_global_default(builder.with_max_level(level).finish())?
        }
    }

    Ok(())
}

async fn run(args: &Args) -> Result<(), TrailError> {
    let config = Config::load(&args.file)?;
    let settings = ApiSettings::from_env()?;
    let client = api::DarwinexClient::new(settings.base_url, settings.timeout)?;
    let store = ConfigFile::new(args.file.clone());
    debug!("Refreshed tokens will be saved to {}", store.path().display());
    let mut runner = Runner::new(client, config, store);

    if args.investors {
        for account in runner.investor_accounts().await? {
            println!("Account Name: {} -> Investor ID: {}", account.name, account.id);
        }
        return Ok(());
    }

    info!("🚀 Checking trailing stop-losses...");
    runner.run().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(e) = init_logging(args.debug) {
        eprintln!("Failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            if matches!(e, TrailError::RefreshRejected { .. }) {
                error!("Please refresh the tokens manually from the Darwinex website, and try again.");
            }
            ExitCode::FAILURE
        }
    }
}
