//! Asset data model.
//!
//! `AssetSnapshot` is one row of the fetched inventory, field names
//! matching the on-disk artifact rows so a saved fetch can be replayed
//! through `run --input`. Every field is optional; the engine tolerates
//! holes in any of them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::health::{classify, HealthLevel};
use crate::timeparse::parse_instant;

/// One asset as fetched this cycle. Immutable once constructed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssetSnapshot {
    /// Vendor asset identifier. Kept as a raw JSON value because some
    /// tenants report numeric ids; see [`AssetSnapshot::key`].
    #[serde(rename = "AssetId", default)]
    pub asset_id: Value,

    #[serde(rename = "AssetName", default)]
    pub asset_name: Option<String>,

    #[serde(rename = "Organization", default)]
    pub organization: Option<String>,

    /// Raw vendor status string, opaque to us apart from the
    /// "in progress" substring check.
    #[serde(rename = "Status", default)]
    pub status: Option<String>,

    /// Raw timestamp exactly as returned, for display/debugging.
    #[serde(rename = "LastSuccessfulBackup", default)]
    pub last_backup_display: Option<String>,

    /// Raw timestamp value of arbitrary shape; normalized per run.
    #[serde(rename = "lastSuccessfulBackupTimestamp", default)]
    pub last_successful_backup: Value,
}

impl AssetSnapshot {
    /// State-store key: the identifier coerced to a string, empty when
    /// absent. Assets with no identifier therefore alias onto the ""
    /// key, matching the long-standing store layout.
    pub fn key(&self) -> String {
        match &self.asset_id {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Trimmed raw status, empty string when absent.
    pub fn status_text(&self) -> String {
        self.status
            .as_deref()
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    }
}

/// Snapshot plus the derived canonical instant and health level.
/// Computed once per run, read-only thereafter.
#[derive(Debug, Clone)]
pub struct NormalizedAsset {
    pub snapshot: AssetSnapshot,
    pub instant: Option<DateTime<Utc>>,
    pub health: HealthLevel,
}

impl NormalizedAsset {
    pub fn new(snapshot: AssetSnapshot, now: DateTime<Utc>) -> Self {
        let instant = parse_instant(&snapshot.last_successful_backup);
        let health = classify(snapshot.status.as_deref(), instant, now);
        Self {
            snapshot,
            instant,
            health,
        }
    }
}

/// Annotate every snapshot for this run. A malformed timestamp on one
/// asset degrades only that asset (absent instant, Failure health).
pub fn normalize_all(snapshots: Vec<AssetSnapshot>, now: DateTime<Utc>) -> Vec<NormalizedAsset> {
    snapshots
        .into_iter()
        .map(|s| NormalizedAsset::new(s, now))
        .collect()
}
