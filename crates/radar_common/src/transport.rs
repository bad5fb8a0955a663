//! Notification transport abstraction.
//!
//! Delivery is a pluggable capability: the run logic commits state on
//! any successful outcome, whether the transport really sent an email
//! or only simulated one. Mirrors the real/fake client split used for
//! other external backends.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::RelayError;
use crate::run_mode::RunMode;

/// Default attachment filename.
pub const CSV_ATTACHMENT_NAME: &str = "current_assets.csv";

/// One computed export, ready for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundReport {
    pub subject: String,
    pub body: String,
    pub mode: RunMode,
    /// Rendered CSV attachment payload.
    pub csv: String,
    pub row_count: usize,
}

/// Attempts delivery of one export. Success or failure is a single
/// atomic outcome; there are no partial-send states.
pub trait NotificationTransport {
    fn send(&self, report: &OutboundReport) -> Result<(), RelayError>;
}

/// Simulation transport: logs the would-be send and reports success,
/// so state still advances exactly as it would for a real delivery.
pub struct DryRunTransport;

impl NotificationTransport for DryRunTransport {
    fn send(&self, report: &OutboundReport) -> Result<(), RelayError> {
        info!(
            subject = %report.subject,
            mode = report.mode.label(),
            rows = report.row_count,
            "[DRY RUN] would send report"
        );
        Ok(())
    }
}
