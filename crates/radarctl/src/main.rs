//! Radar Relay control - backup fleet notification job.
//!
//! Invoked by an external scheduler at fixed intervals. Exits zero on
//! success or a clean no-op, non-zero on any unrecoverable failure
//! (inventory unreachable, delivery failure, state unwritable).

mod commands;
mod inventory;
mod smtp;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use radar_common::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(name = "radarctl")]
#[command(about = "Backup fleet health notification relay", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, reconcile against persisted state and send the report
    Run {
        /// Replay saved asset rows instead of hitting the vendor API
        #[arg(long)]
        input: Option<PathBuf>,

        /// Simulate delivery regardless of the configured setting
        #[arg(long)]
        dry_run: bool,
    },

    /// Fetch the inventory and save the raw asset rows
    Fetch {
        /// Where to write the rows (defaults to the work dir)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { input, dry_run } => commands::run(&cli.config, input, dry_run),
        Commands::Fetch { output } => commands::fetch(&cli.config, output),
    }
}
