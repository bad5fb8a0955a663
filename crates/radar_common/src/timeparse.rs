//! Timestamp normalization.
//!
//! The vendor API reports `lastSuccessfulBackupTimestamp` in whatever
//! shape the backing agent produced: epoch seconds, epoch milliseconds,
//! ISO-8601 with a trailing `Z`, or a timezone-naive datetime string.
//! Everything funnels through [`parse_instant`] into a canonical UTC
//! instant; anything unparsable becomes `None`, never an error.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// Numeric values above this are epoch milliseconds, not seconds.
const EPOCH_MILLIS_CUTOVER: f64 = 1e12;

/// Timezone-naive formats the vendor has been observed to emit.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

/// Parse a raw timestamp value into a canonical UTC instant.
///
/// Accepts JSON null, numbers (epoch seconds or milliseconds) and
/// strings (all-digit epoch values or ISO-8601 variants). Returns
/// `None` for anything else, including non-empty garbage.
pub fn parse_instant(raw: &Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::Null => None,
        Value::Number(n) => from_epoch(n.as_f64()?),
        Value::String(s) => parse_instant_str(s),
        _ => None,
    }
}

/// String form of [`parse_instant`].
pub fn parse_instant_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if s.bytes().all(|b| b.is_ascii_digit()) {
        return from_epoch(s.parse::<f64>().ok()?);
    }
    parse_iso(s)
}

/// Epoch interpretation with the seconds/milliseconds heuristic.
fn from_epoch(mut sec: f64) -> Option<DateTime<Utc>> {
    if !sec.is_finite() {
        return None;
    }
    if sec > EPOCH_MILLIS_CUTOVER {
        sec /= 1000.0;
    }
    let whole = sec.floor();
    let nanos = ((sec - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
    // A trailing literal Z means UTC offset zero.
    let rfc = if let Some(stripped) = s.strip_suffix('Z') {
        format!("{stripped}+00:00")
    } else {
        s.to_string()
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&rfc) {
        return Some(dt.with_timezone(&Utc));
    }
    // Timezone-naive values are assumed to already be UTC.
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    // Date-only values mean midnight UTC.
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    None
}
