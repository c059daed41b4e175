use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config;

fn parse_max_difference(s: &str) -> Result<f64, String> {
    let v: f64 = s.parse().map_err(|e| format!("{e}"))?;
    config::validate_max_difference(v)
}

#[derive(Parser)]
#[command(
    name = "visreg",
    about = "Visual regression testing against stored reference screenshots"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create .visreg/config.toml with default settings
    Init {
        /// Directory captures are read from
        #[arg(long, default_value = "captures")]
        captures: String,
        /// Overwrite existing config and gitignore
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Compare captures against references and report differences (exit 0/1)
    Check {
        /// Capture directory (overrides config)
        #[arg(long)]
        captures: Option<PathBuf>,
        /// Only check snapshots whose name contains PATTERN (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
        /// Max allowed composite difference in percent
        #[arg(long, value_parser = parse_max_difference)]
        max_difference: Option<f64>,
        /// Search for the best alignment offset before differencing
        #[arg(long)]
        reposition: bool,
    },

    /// Save captures as reference snapshots without comparing
    Update {
        /// Capture directory (overrides config)
        #[arg(long)]
        captures: Option<PathBuf>,
        /// Only update snapshots whose name contains PATTERN (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },

    /// Promote the latest run's failing candidates to references
    Approve {
        /// Only approve snapshots whose name contains PATTERN (case-insensitive)
        #[arg(long, short = 'f')]
        filter: Option<String>,
    },

    /// Delete references that no longer match any capture
    Prune {
        /// Capture directory (overrides config)
        #[arg(long)]
        captures: Option<PathBuf>,
        /// Show what would be deleted without deleting
        #[arg(long)]
        dry_run: bool,
        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}
