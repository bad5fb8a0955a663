//! Radar Relay - shared library
//!
//! Core logic for the backup fleet notification relay: timestamp
//! normalization, health classification, run-mode decision, state
//! reconciliation and the durable notification state store.
//!
//! The binary crate (`radarctl`) supplies the external collaborators:
//! the vendor inventory API client and the SMTP transport.

pub mod asset;
pub mod config;
pub mod error;
pub mod health;
pub mod reconcile;
pub mod report;
pub mod run;
pub mod run_mode;
pub mod state;
pub mod timeparse;
pub mod transport;

pub use asset::{AssetSnapshot, NormalizedAsset};
pub use config::RelayConfig;
pub use error::RelayError;
pub use health::HealthLevel;
pub use reconcile::{reconcile, ReconcileOutput};
pub use report::{render_csv, ReportRecord};
pub use run::{execute_run, RunOptions, RunOutcome, RunSummary};
pub use run_mode::{decide, RunDecision, RunMode};
pub use state::{AssetStateEntry, PersistedState, StateStore};
pub use transport::{DryRunTransport, NotificationTransport, OutboundReport};
