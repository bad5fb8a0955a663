//! One-run orchestration.
//!
//! Drives a single scheduled execution through its state machine:
//!
//! ```text
//! Normalize -> Decide -> Reconcile -> NothingToReport
//!                                  \-> Dispatch ok   -> Commit
//!                                  \-> Dispatch fail -> StateUnchanged (error)
//! ```
//!
//! The commit strictly follows dispatch success in program order. A
//! failed dispatch leaves the store byte-identical, so the next
//! scheduled run naturally retries the same changes.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::asset::{normalize_all, AssetSnapshot};
use crate::config::RunConfig;
use crate::error::RelayError;
use crate::reconcile::reconcile;
use crate::report::render_csv;
use crate::run_mode::{decide, RunMode};
use crate::state::{PersistedState, StateStore};
use crate::transport::{NotificationTransport, OutboundReport};

/// Per-run behavior knobs, resolved from config by the caller.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub seed_on_first_run: bool,
    /// 0 = all assets, N = first N.
    pub sample_count: usize,
    /// Where to drop the rendered CSV before dispatch, if anywhere.
    pub csv_artifact: Option<PathBuf>,
}

impl RunOptions {
    pub fn from_config(run: &RunConfig, csv_artifact: Option<PathBuf>) -> Self {
        Self {
            seed_on_first_run: run.seed_on_first_run,
            sample_count: run.sample_count,
            csv_artifact,
        }
    }
}

/// Terminal state of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// First run with seeding disabled: empty state marker persisted,
    /// nothing sent.
    SeedSkipped,
    /// Reconciliation found no changes; no dispatch, no commit.
    NothingToReport,
    /// Report delivered and state committed.
    Delivered { rows: usize },
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub mode: RunMode,
    pub first_run_seed: bool,
    pub outcome: RunOutcome,
}

/// Execute one run against already-fetched snapshots.
///
/// State is mutated if and only if the transport reported success; any
/// error return leaves the store untouched except for the seed-disabled
/// empty marker.
pub fn execute_run(
    snapshots: Vec<AssetSnapshot>,
    options: &RunOptions,
    store: &StateStore,
    transport: &dyn NotificationTransport,
    now: DateTime<Utc>,
) -> Result<RunSummary, RelayError> {
    let snapshots = if options.sample_count > 0 {
        snapshots
            .into_iter()
            .take(options.sample_count)
            .collect::<Vec<_>>()
    } else {
        snapshots
    };

    let prior = store.load();
    let decision = decide(now, prior.is_none());
    let prior = prior.unwrap_or_else(PersistedState::new);
    info!(
        mode = decision.mode.label(),
        seed = decision.first_run_seed,
        assets = snapshots.len(),
        "run started"
    );

    if decision.first_run_seed && !options.seed_on_first_run {
        warn!("no prior state and seeding disabled; persisting empty marker, sending nothing");
        store.mark_initialized()?;
        return Ok(RunSummary {
            mode: decision.mode,
            first_run_seed: true,
            outcome: RunOutcome::SeedSkipped,
        });
    }

    let normalized = normalize_all(snapshots, now);
    let outcome = reconcile(&normalized, &prior, decision.mode);

    if outcome.is_empty() {
        info!("no changes to send this run");
        return Ok(RunSummary {
            mode: decision.mode,
            first_run_seed: decision.first_run_seed,
            outcome: RunOutcome::NothingToReport,
        });
    }

    let csv = render_csv(&outcome.report);
    if let Some(path) = &options.csv_artifact {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, &csv)?;
        info!(rows = outcome.report.len(), path = %path.display(), "wrote CSV artifact");
    }

    let stamp = now.format("%Y-%m-%dT%H:%M:%SZ");
    let report = OutboundReport {
        subject: format!("Backup Report CSV - {} - {stamp}", decision.mode.label()),
        body: format!("Attached CSV ({}) generated at {stamp}.", decision.mode.label()),
        mode: decision.mode,
        row_count: outcome.report.len(),
        csv,
    };

    transport.send(&report)?;

    store.commit(&prior, &outcome.delta, decision.mode)?;
    info!(
        rows = outcome.report.len(),
        updated = outcome.delta.len(),
        "report delivered, state committed"
    );

    Ok(RunSummary {
        mode: decision.mode,
        first_run_seed: decision.first_run_seed,
        outcome: RunOutcome::Delivered {
            rows: outcome.report.len(),
        },
    })
}
