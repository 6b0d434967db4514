//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Vehicle visit timelines from telemetry reports.
///
/// Reconciles zone, trip, engine and fuel reports into one gapless timeline of
/// zone visits per vehicle.
#[derive(Debug, Parser)]
#[command(name = "vt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Reconstruct visit timelines for every unit in a report file.
    Analyze {
        /// JSON report file with units, routes and shifts.
        #[arg(short, long)]
        input: PathBuf,

        /// Window start (RFC 3339, or provider-local `YYYY-MM-DD HH:MM[:SS]`).
        #[arg(long)]
        from: String,

        /// Window end (same formats as --from).
        #[arg(long)]
        to: String,

        /// Only analyse the unit with this name.
        #[arg(long)]
        unit: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how many rows of each table were casted, dropped or skipped.
    Inspect {
        /// JSON report file with units, routes and shifts.
        #[arg(short, long)]
        input: PathBuf,

        /// Window start (RFC 3339, or provider-local `YYYY-MM-DD HH:MM[:SS]`).
        #[arg(long)]
        from: String,

        /// Window end (same formats as --from).
        #[arg(long)]
        to: String,
    },
}
