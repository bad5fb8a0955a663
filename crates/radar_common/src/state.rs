//! Durable notification state.
//!
//! The state file is the single source of truth for "what the last
//! successful notification already told the recipient": one entry per
//! asset id holding the last-reported backup instant (whole epoch
//! seconds) and raw status. It is read once at run start and replaced
//! once at run end, only after the transport confirmed delivery.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RelayError;
use crate::run_mode::RunMode;

/// Last-reported facts for one asset.
///
/// `ts` is whole epoch seconds; sub-second precision is dropped on
/// purpose (comparisons are whole-second too, so a sub-second advance
/// never re-triggers a send).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AssetStateEntry {
    pub ts: Option<i64>,
    pub status: Option<String>,
}

/// Mapping from asset id to its last-reported entry. An id is present
/// iff the asset has been included in at least one delivered report.
pub type PersistedState = BTreeMap<String, AssetStateEntry>;

/// File-backed store for [`PersistedState`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load persisted state.
    ///
    /// `None` means no usable prior state: the file is missing or
    /// unparsable. Neither is an error: losing notification history
    /// costs at most one extra full resend, whereas refusing to run
    /// costs the monitoring itself. An existing file holding an empty
    /// mapping is `Some(empty)` so a seed-disabled deployment does not
    /// treat every run as its first.
    pub fn load(&self) -> Option<PersistedState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return None,
        };
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e,
                    "state file unparsable, treating as empty");
                None
            }
        }
    }

    /// Commit the outcome of a delivered report.
    ///
    /// FULL replaces the whole mapping with `delta` (assets gone from
    /// the feed drop out here); INCREMENTAL upserts only the keys in
    /// `delta` into `prior`. Must only be called after the transport
    /// reported success. Write failures are loud: the notification
    /// already went out, and silently keeping stale state would cause
    /// duplicate sends on every later run.
    pub fn commit(
        &self,
        prior: &PersistedState,
        delta: &PersistedState,
        mode: RunMode,
    ) -> Result<(), RelayError> {
        let merged = match mode {
            RunMode::Full => delta.clone(),
            RunMode::Incremental => {
                let mut merged = prior.clone();
                for (key, entry) in delta {
                    merged.insert(key.clone(), entry.clone());
                }
                merged
            }
        };
        self.write_atomic(&merged)
    }

    /// Persist an empty mapping so later runs stop treating themselves
    /// as first-run. Used when seeding is disabled. A corrupt file is
    /// replaced; a loadable one is left alone.
    pub fn mark_initialized(&self) -> Result<(), RelayError> {
        if self.load().is_some() {
            return Ok(());
        }
        self.write_atomic(&PersistedState::new())
    }

    /// Temp-file-then-rename write so a crash mid-write never leaves a
    /// torn state file.
    fn write_atomic(&self, state: &PersistedState) -> Result<(), RelayError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| RelayError::Storage(format!("create {}: {e}", parent.display())))?;
            }
        }
        let data = serde_json::to_vec_pretty(state)?;
        let temp_path = self.path.with_extension("tmp");
        let mut file = File::create(&temp_path)
            .map_err(|e| RelayError::Storage(format!("create {}: {e}", temp_path.display())))?;
        file.write_all(&data)
            .map_err(|e| RelayError::Storage(format!("write {}: {e}", temp_path.display())))?;
        file.sync_all()
            .map_err(|e| RelayError::Storage(format!("sync {}: {e}", temp_path.display())))?;
        fs::rename(&temp_path, &self.path)
            .map_err(|e| RelayError::Storage(format!("rename to {}: {e}", self.path.display())))?;
        Ok(())
    }
}
