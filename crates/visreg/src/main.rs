mod cli;
mod commands;
mod compare;
mod config;
mod report;
mod source;
mod store;

use clap::Parser;
use config::{CliOverrides, ResolvedRunConfig};
use source::CaptureDir;
use store::{RunContext, Store};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("visreg=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::Cli::parse();
    let run = RunContext::new();

    match cli.command {
        cli::Command::Init { captures, force } => {
            commands::init(&captures, force)?;
        }
        cli::Command::Check {
            captures,
            filter,
            max_difference,
            reposition,
        } => {
            let config = ResolvedRunConfig::new(CliOverrides {
                captures,
                max_difference,
                reposition,
            })?;
            let source = CaptureDir::new(&config.capture_dir, config.full_screenshots);
            let store = Store::open(store::BASE_DIR, &run);
            let code = commands::check(&config, &source, &store, filter.as_deref())?;
            std::process::exit(code);
        }
        cli::Command::Update { captures, filter } => {
            let config = ResolvedRunConfig::new(CliOverrides {
                captures,
                max_difference: None,
                reposition: false,
            })?;
            let source = CaptureDir::new(&config.capture_dir, config.full_screenshots);
            let store = Store::open(store::BASE_DIR, &run);
            commands::update(&source, &store, filter.as_deref())?;
        }
        cli::Command::Approve { filter } => {
            commands::approve(filter.as_deref())?;
        }
        cli::Command::Prune {
            captures,
            dry_run,
            yes,
        } => {
            let config = ResolvedRunConfig::new(CliOverrides {
                captures,
                max_difference: None,
                reposition: false,
            })?;
            let source = CaptureDir::new(&config.capture_dir, config.full_screenshots);
            let store = Store::open(store::BASE_DIR, &run);
            commands::prune(&source, &store, dry_run, yes)?;
        }
    }

    Ok(())
}
