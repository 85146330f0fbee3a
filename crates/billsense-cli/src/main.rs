//! Billsense CLI - bill intelligence over a document-store export
//!
//! Usage:
//!   billsense report bills.json        Full analysis report
//!   billsense validate --date DATE     Check raw extraction fields
//!   billsense duplicate --file ...     Check a candidate for duplicates

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Report {
            file,
            horizon,
            json,
        } => commands::cmd_report(cli.config.as_deref(), &file, horizon, json),
        Commands::Validate { amount, date } => {
            commands::cmd_validate(cli.config.as_deref(), amount, date)
        }
        Commands::Duplicate {
            file,
            vendor,
            amount,
            due,
        } => commands::cmd_duplicate(cli.config.as_deref(), &file, &vendor, amount, &due),
    }
}
