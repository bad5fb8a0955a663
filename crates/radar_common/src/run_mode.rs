//! Run-mode decision.
//!
//! A run is either FULL (report every fetched asset, replace the whole
//! persisted mapping) or INCREMENTAL (report only what changed). The
//! daily full-refresh window is the entire 21:00-21:59 UTC hour and is
//! recomputed statelessly on every invocation; there is no "already ran
//! today" flag. Repeat runs inside the window are all FULL, which is
//! harmless because the state they commit makes later incremental runs
//! report nothing new.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// UTC hour during which every run is a full refresh.
pub const FULL_REFRESH_HOUR_UTC: u32 = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunMode {
    Full,
    Incremental,
}

impl RunMode {
    /// Short tag used in the email subject and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            RunMode::Full => "FULL",
            RunMode::Incremental => "INCR",
        }
    }
}

/// Outcome of the per-run mode decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunDecision {
    pub mode: RunMode,
    /// True when no persisted state existed: the very first notification
    /// a fresh deployment sends covers the entire fleet.
    pub first_run_seed: bool,
}

/// Decide the mode for this run.
pub fn decide(now: DateTime<Utc>, state_is_empty: bool) -> RunDecision {
    if state_is_empty {
        return RunDecision {
            mode: RunMode::Full,
            first_run_seed: true,
        };
    }
    let mode = if now.hour() == FULL_REFRESH_HOUR_UTC {
        RunMode::Full
    } else {
        RunMode::Incremental
    };
    RunDecision {
        mode,
        first_run_seed: false,
    }
}
