//! State reconciliation.
//!
//! Given the normalized fetch, the prior persisted state and the run
//! mode, computes which assets go into this run's report and the state
//! delta that must be committed if (and only if) delivery succeeds.
//! Pure: no IO, no clock reads, no mutation of the prior state.

use crate::asset::NormalizedAsset;
use crate::report::ReportRecord;
use crate::run_mode::RunMode;
use crate::state::{AssetStateEntry, PersistedState};

/// Report rows plus the proposed state replacement batch.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutput {
    pub report: Vec<ReportRecord>,
    pub delta: PersistedState,
}

impl ReconcileOutput {
    /// A run with nothing to report is a clean no-op: no dispatch, no
    /// commit, exit zero.
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }
}

/// Compute the report set and state delta for one run.
///
/// FULL: every fetched asset is reported and the delta re-seeds the
/// entire mapping from the live fetch (assets that left the feed drop
/// out at commit, new ones are seeded, no bootstrap step needed).
///
/// INCREMENTAL: an asset is reported when its canonical instant is
/// strictly newer than the stored one (or nothing was stored), or when
/// its non-empty raw status differs from the stored status (missing
/// stored status compares as empty, so a first non-empty status on a
/// stateless asset triggers a send). Unchanged assets contribute no row
/// and no delta entry.
pub fn reconcile(
    assets: &[NormalizedAsset],
    prior: &PersistedState,
    mode: RunMode,
) -> ReconcileOutput {
    let mut out = ReconcileOutput::default();

    for asset in assets {
        let include = match mode {
            RunMode::Full => true,
            RunMode::Incremental => should_send(asset, prior),
        };
        if include {
            out.report.push(ReportRecord::from_asset(asset));
            out.delta.insert(asset.snapshot.key(), to_entry(asset));
        }
    }

    out
}

fn should_send(asset: &NormalizedAsset, prior: &PersistedState) -> bool {
    let stored = prior.get(&asset.snapshot.key());

    // Timestamp branch: present and strictly newer than whatever the
    // last delivered report carried.
    if let Some(current_ts) = asset.instant.map(|dt| dt.timestamp()) {
        let stored_ts = stored.and_then(|e| e.ts);
        match stored_ts {
            None => return true,
            Some(prev) if current_ts > prev => return true,
            Some(_) => {}
        }
    }

    // Status branch: a non-empty status that differs from the stored
    // one (empty is never compared against empty as a change).
    let current_status = asset.snapshot.status_text();
    if !current_status.is_empty() {
        let stored_status = stored.and_then(|e| e.status.as_deref()).unwrap_or("");
        if current_status != stored_status {
            return true;
        }
    }

    false
}

fn to_entry(asset: &NormalizedAsset) -> AssetStateEntry {
    let status = asset.snapshot.status_text();
    AssetStateEntry {
        ts: asset.instant.map(|dt| dt.timestamp()),
        status: if status.is_empty() { None } else { Some(status) },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetSnapshot;
    use chrono::{DateTime, TimeZone, Utc};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 15, 9, 0, 0).unwrap()
    }

    fn asset(id: &str, ts: Option<i64>, status: Option<&str>) -> NormalizedAsset {
        let snap: AssetSnapshot = serde_json::from_value(serde_json::json!({
            "AssetId": if id.is_empty() { serde_json::Value::Null } else { serde_json::json!(id) },
            "AssetName": format!("dev-{id}"),
            "Organization": "Acme",
            "Status": status,
            "lastSuccessfulBackupTimestamp": ts,
        }))
        .unwrap();
        NormalizedAsset::new(snap, now())
    }

    fn stored(ts: Option<i64>, status: Option<&str>) -> AssetStateEntry {
        AssetStateEntry {
            ts,
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn full_mode_reports_everything_and_reseeds() {
        let assets = vec![
            asset("a1", Some(1000), Some("Online")),
            asset("a2", None, None),
            asset("a3", Some(2000), Some("Offline")),
        ];
        let out = reconcile(&assets, &PersistedState::new(), RunMode::Full);
        assert_eq!(out.report.len(), 3);
        assert_eq!(out.delta.len(), 3);
        assert_eq!(out.delta["a2"], stored(None, None));
    }

    #[test]
    fn incremental_reports_only_new_asset() {
        // State has A1 at ts=1000; fetch has A1 unchanged and A2 new.
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(Some(1000), None));
        let assets = vec![asset("a1", Some(1000), None), asset("a2", Some(2000), None)];

        let out = reconcile(&assets, &prior, RunMode::Incremental);
        assert_eq!(out.report.len(), 1);
        assert_eq!(out.report[0].device, "dev-a2");
        assert_eq!(out.delta.len(), 1);
        assert!(out.delta.contains_key("a2"));
        assert!(!out.delta.contains_key("a1"));
    }

    #[test]
    fn monotonic_acceptance_of_newer_timestamp() {
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(Some(1000), Some("Online")));
        let out = reconcile(
            &[asset("a1", Some(1001), Some("Online"))],
            &prior,
            RunMode::Incremental,
        );
        assert_eq!(out.report.len(), 1);
    }

    #[test]
    fn equal_timestamp_and_status_is_silent() {
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(Some(1000), Some("Online")));
        let out = reconcile(
            &[asset("a1", Some(1000), Some("Online"))],
            &prior,
            RunMode::Incremental,
        );
        assert!(out.is_empty());
        assert!(out.delta.is_empty());
    }

    #[test]
    fn older_timestamp_does_not_resend() {
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(Some(2000), Some("Online")));
        let out = reconcile(
            &[asset("a1", Some(1000), Some("Online"))],
            &prior,
            RunMode::Incremental,
        );
        assert!(out.is_empty());
    }

    #[test]
    fn status_change_alone_triggers_send() {
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(Some(1000), Some("Online")));
        let out = reconcile(
            &[asset("a1", Some(1000), Some("Offline"))],
            &prior,
            RunMode::Incremental,
        );
        assert_eq!(out.report.len(), 1);
        assert_eq!(out.delta["a1"], stored(Some(1000), Some("Offline")));
    }

    #[test]
    fn first_nonempty_status_on_stateless_asset_triggers_send() {
        let out = reconcile(
            &[asset("a1", None, Some("Online"))],
            &PersistedState::new(),
            RunMode::Incremental,
        );
        assert_eq!(out.report.len(), 1);
    }

    #[test]
    fn empty_status_never_triggers_status_branch() {
        // No timestamp and no status: nothing to compare, nothing sent.
        let out = reconcile(
            &[asset("a1", None, None)],
            &PersistedState::new(),
            RunMode::Incremental,
        );
        assert!(out.is_empty());

        // But the timestamp branch still works for status-less assets.
        let out = reconcile(
            &[asset("a1", Some(1000), None)],
            &PersistedState::new(),
            RunMode::Incremental,
        );
        assert_eq!(out.report.len(), 1);
    }

    #[test]
    fn stored_entry_without_timestamp_accepts_any_instant() {
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(None, Some("Online")));
        let out = reconcile(
            &[asset("a1", Some(5), Some("Online"))],
            &prior,
            RunMode::Incremental,
        );
        assert_eq!(out.report.len(), 1);
    }

    #[test]
    fn reconcile_is_idempotent_without_commit() {
        let mut prior = PersistedState::new();
        prior.insert("a1".into(), stored(Some(1000), Some("Online")));
        let assets = vec![asset("a1", Some(1500), Some("Online")), asset("a2", None, None)];

        let first = reconcile(&assets, &prior, RunMode::Incremental);
        let second = reconcile(&assets, &prior, RunMode::Incremental);
        assert_eq!(first.report, second.report);
        assert_eq!(first.delta, second.delta);
    }

    #[test]
    fn missing_ids_alias_onto_one_state_key() {
        let assets = vec![
            asset("", Some(1000), Some("Online")),
            asset("", Some(2000), Some("Offline")),
        ];
        let out = reconcile(&assets, &PersistedState::new(), RunMode::Full);
        // Both rows are reported, but they collapse onto the "" key and
        // the later one wins in the delta.
        assert_eq!(out.report.len(), 2);
        assert_eq!(out.delta.len(), 1);
        assert_eq!(out.delta[""], stored(Some(2000), Some("Offline")));
    }
}
