//! Error types for the relay.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Inventory source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Notification delivery failed: {0}")]
    Delivery(String),

    #[error("State store failure: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
