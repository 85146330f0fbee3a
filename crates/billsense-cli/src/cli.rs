//! CLI argument definitions using clap
//!
//! This module contains the clap structs and enums for parsing CLI
//! arguments. The command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Billsense - bill intelligence over a document-store export
#[derive(Parser)]
#[command(name = "billsense")]
#[command(about = "Analyze a bill export: recurrence, spikes, projections, savings", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Optional TOML file overriding engine thresholds
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis over a JSON bill export
    Report {
        /// Bill export (JSON array of bill documents)
        file: PathBuf,

        /// Forecast horizon in days
        #[arg(long, default_value_t = 30)]
        horizon: i64,

        /// Emit raw JSON instead of the text report
        #[arg(long)]
        json: bool,
    },

    /// Validate raw extraction fields (amount and/or due date)
    Validate {
        /// Extracted amount
        #[arg(long)]
        amount: Option<f64>,

        /// Extracted due date string
        #[arg(long)]
        date: Option<String>,
    },

    /// Check a candidate bill against an export for duplicates
    Duplicate {
        /// Bill export (JSON array of bill documents)
        file: PathBuf,

        /// Candidate vendor name
        #[arg(long)]
        vendor: String,

        /// Candidate amount
        #[arg(long)]
        amount: f64,

        /// Candidate due date (YYYY-MM-DD)
        #[arg(long)]
        due: String,
    },
}
