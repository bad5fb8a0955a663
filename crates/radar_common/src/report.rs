//! Outbound export rows and CSV rendering.
//!
//! The receiving system ingests a CSV with exactly five columns in this
//! fixed order: `Device, Status, Backup Date, Client, Job`. Column names,
//! casing and order are a contract; do not touch them.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::asset::NormalizedAsset;

/// Fixed column order of the export.
pub const CSV_COLUMNS: [&str; 5] = ["Device", "Status", "Backup Date", "Client", "Job"];

/// Fixed job-category label stamped on every row.
pub const JOB_NAME: &str = "EPBv2";

/// One row of the outbound export. Ephemeral; lives for one run only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRecord {
    pub device: String,
    pub status: String,
    /// ISO-8601 UTC with trailing `Z`, or empty when no instant exists.
    pub backup_date: String,
    pub client: String,
    pub job: String,
}

impl ReportRecord {
    pub fn from_asset(asset: &NormalizedAsset) -> Self {
        let backup_date = asset
            .instant
            .map(|dt| dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            .unwrap_or_default();
        Self {
            device: asset.snapshot.asset_name.clone().unwrap_or_default(),
            status: asset.health.as_str().to_string(),
            backup_date,
            client: asset.snapshot.organization.clone().unwrap_or_default(),
            job: JOB_NAME.to_string(),
        }
    }
}

/// Render records as CSV, header included, CRLF line endings.
pub fn render_csv(records: &[ReportRecord]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_COLUMNS.join(","));
    out.push_str("\r\n");
    for r in records {
        let fields = [&r.device, &r.status, &r.backup_date, &r.client, &r.job];
        let line: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
        out.push_str(&line.join(","));
        out.push_str("\r\n");
    }
    out
}

fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AssetSnapshot, NormalizedAsset};
    use chrono::{TimeZone, Utc};

    fn record(device: &str, client: &str) -> ReportRecord {
        ReportRecord {
            device: device.to_string(),
            status: "Success".to_string(),
            backup_date: "2023-11-14T22:13:20Z".to_string(),
            client: client.to_string(),
            job: JOB_NAME.to_string(),
        }
    }

    #[test]
    fn header_is_exact() {
        let csv = render_csv(&[]);
        assert_eq!(csv, "Device,Status,Backup Date,Client,Job\r\n");
    }

    #[test]
    fn row_renders_in_column_order() {
        let csv = render_csv(&[record("web-01", "Acme")]);
        let mut lines = csv.lines();
        lines.next();
        assert_eq!(
            lines.next().unwrap(),
            "web-01,Success,2023-11-14T22:13:20Z,Acme,EPBv2"
        );
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        let csv = render_csv(&[record("db,primary", "Acme \"East\"")]);
        assert!(csv.contains("\"db,primary\""));
        assert!(csv.contains("\"Acme \"\"East\"\"\""));
    }

    #[test]
    fn from_asset_formats_instant_with_trailing_z() {
        let now = Utc.with_ymd_and_hms(2023, 11, 15, 9, 0, 0).unwrap();
        let snap: AssetSnapshot = serde_json::from_value(serde_json::json!({
            "AssetId": "a1",
            "AssetName": "web-01",
            "Organization": "Acme",
            "Status": "Online",
            "lastSuccessfulBackupTimestamp": 1_700_000_000
        }))
        .unwrap();
        let rec = ReportRecord::from_asset(&NormalizedAsset::new(snap, now));
        assert_eq!(rec.backup_date, "2023-11-14T22:13:20Z");
        assert_eq!(rec.job, "EPBv2");
    }

    #[test]
    fn missing_instant_renders_empty_date() {
        let now = Utc.with_ymd_and_hms(2023, 11, 15, 9, 0, 0).unwrap();
        let snap = AssetSnapshot::default();
        let rec = ReportRecord::from_asset(&NormalizedAsset::new(snap, now));
        assert_eq!(rec.backup_date, "");
        assert_eq!(rec.status, "Failure");
    }
}
