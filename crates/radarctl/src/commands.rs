//! Command wiring: config + collaborators into the run engine.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::info;

use radar_common::run::{RunOptions, RunOutcome};
use radar_common::{
    execute_run, AssetSnapshot, DryRunTransport, RelayConfig, RelayError, StateStore,
};

use crate::inventory::InventoryClient;
use crate::smtp::SmtpMailer;

/// One scheduled run: fetch (or replay), reconcile, dispatch, commit.
pub fn run(config_path: &Path, input: Option<PathBuf>, force_dry_run: bool) -> Result<()> {
    let config = RelayConfig::load(config_path)?;

    let snapshots = match &input {
        Some(path) => read_rows(path)?,
        None => InventoryClient::new(&config.api)?.fetch()?,
    };
    if snapshots.is_empty() {
        return Err(RelayError::SourceUnavailable(
            "no assets returned from inventory source".to_string(),
        )
        .into());
    }

    let store = StateStore::new(config.state_file());
    let options = RunOptions::from_config(&config.run, Some(config.csv_file()));
    let now = Utc::now();

    let dry_run = force_dry_run || config.run.dry_run;
    let summary = if dry_run {
        execute_run(snapshots, &options, &store, &DryRunTransport, now)?
    } else {
        let mailer = SmtpMailer::new(config.smtp.clone())?;
        execute_run(snapshots, &options, &store, &mailer, now)?
    };

    match summary.outcome {
        RunOutcome::SeedSkipped => info!("first run with seeding disabled; nothing sent"),
        RunOutcome::NothingToReport => info!("no changes to send; exiting"),
        RunOutcome::Delivered { rows } => info!(
            rows,
            mode = summary.mode.label(),
            dry_run,
            "run complete"
        ),
    }
    Ok(())
}

/// Fetch the inventory and save the raw rows for later replay.
pub fn fetch(config_path: &Path, output: Option<PathBuf>) -> Result<()> {
    let config = RelayConfig::load(config_path)?;
    let snapshots = InventoryClient::new(&config.api)?.fetch()?;
    if snapshots.is_empty() {
        return Err(RelayError::SourceUnavailable("no assets returned (empty list)".to_string()).into());
    }

    let path = output.unwrap_or_else(|| config.rows_file());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
    }
    let data = serde_json::to_vec_pretty(&snapshots)?;
    std::fs::write(&path, data).with_context(|| format!("write {}", path.display()))?;
    info!(assets = snapshots.len(), path = %path.display(), "saved asset rows");
    Ok(())
}

fn read_rows(path: &Path) -> Result<Vec<AssetSnapshot>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("data file not found: {}", path.display()))?;
    let rows: Vec<AssetSnapshot> = serde_json::from_str(&content)
        .with_context(|| format!("data file format invalid: {}", path.display()))?;
    Ok(rows)
}
