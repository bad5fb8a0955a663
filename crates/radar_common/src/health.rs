//! Health classification.
//!
//! Maps an asset's raw vendor status and last-successful-backup instant
//! to the three-level health used in the export. The 12h/23h boundaries
//! are the contract with the receiving system; the gap above 23h is
//! deliberate (anything older is a Failure, not a Warning).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived backup health, distinct from the vendor's raw status string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthLevel {
    Success,
    Warning,
    Failure,
}

impl HealthLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthLevel::Success => "Success",
            HealthLevel::Warning => "Warning",
            HealthLevel::Failure => "Failure",
        }
    }
}

impl std::fmt::Display for HealthLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classify one asset.
///
/// Order matters: an "in progress" status wins over any timestamp, a
/// missing/unparsable timestamp is always a Failure. A future-dated
/// instant yields a negative age and lands in the Success branch.
pub fn classify(
    raw_status: Option<&str>,
    instant: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> HealthLevel {
    if let Some(status) = raw_status {
        if !status.is_empty() && status.to_lowercase().contains("in progress") {
            return HealthLevel::Warning;
        }
    }

    if let Some(instant) = instant {
        let age_hours = (now - instant).num_seconds() as f64 / 3600.0;
        if age_hours <= 12.0 {
            return HealthLevel::Success;
        }
        if age_hours <= 23.0 {
            return HealthLevel::Warning;
        }
        return HealthLevel::Failure;
    }

    HealthLevel::Failure
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 11, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn in_progress_wins_regardless_of_timestamp() {
        let stale = now() - Duration::hours(48);
        assert_eq!(
            classify(Some("Backup In Progress"), Some(stale), now()),
            HealthLevel::Warning
        );
        assert_eq!(
            classify(Some("IN PROGRESS"), None, now()),
            HealthLevel::Warning
        );
    }

    #[test]
    fn fresh_backup_is_success() {
        let eleven_hours = now() - Duration::hours(11);
        assert_eq!(
            classify(Some("Online"), Some(eleven_hours), now()),
            HealthLevel::Success
        );
    }

    #[test]
    fn boundary_at_exactly_12_hours_is_success() {
        let exact = now() - Duration::hours(12);
        assert_eq!(classify(None, Some(exact), now()), HealthLevel::Success);
    }

    #[test]
    fn thirteen_hours_is_warning() {
        let t = now() - Duration::hours(13);
        assert_eq!(classify(Some("Online"), Some(t), now()), HealthLevel::Warning);
    }

    #[test]
    fn boundary_at_exactly_23_hours_is_warning() {
        let exact = now() - Duration::hours(23);
        assert_eq!(classify(None, Some(exact), now()), HealthLevel::Warning);
    }

    #[test]
    fn twenty_five_hours_is_failure() {
        let t = now() - Duration::hours(25);
        assert_eq!(classify(Some("Online"), Some(t), now()), HealthLevel::Failure);
    }

    #[test]
    fn future_timestamp_is_success() {
        let future = now() + Duration::hours(2);
        assert_eq!(classify(None, Some(future), now()), HealthLevel::Success);
    }

    #[test]
    fn no_timestamp_is_failure() {
        assert_eq!(classify(Some("Online"), None, now()), HealthLevel::Failure);
        assert_eq!(classify(None, None, now()), HealthLevel::Failure);
    }
}
