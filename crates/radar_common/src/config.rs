//! Relay configuration.
//!
//! Loaded once at process start from a TOML file and passed into each
//! component; no component reads ambient globals. Secrets may be left
//! out of the file and supplied through the environment instead
//! (CLIENT_ID, CLIENT_SECRET, SMTP_PASS and friends), matching how the
//! deployment has historically been wired.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RelayError;

/// Default config location, overridable with `--config`.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/radar-relay/config.toml";

/// Vendor inventory API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_auth_url")]
    pub auth_url: String,

    #[serde(default = "default_client_url")]
    pub client_url: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub client_secret: Option<String>,

    /// Timeout for both the token and asset requests.
    #[serde(default = "default_api_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_auth_url() -> String {
    "https://login.backup.net/connect/token".to_string()
}

fn default_client_url() -> String {
    "https://public-api.backup.net/api/epb/v1/assets?page_size=300".to_string()
}

fn default_api_timeout_secs() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            auth_url: default_auth_url(),
            client_url: default_client_url(),
            client_id: None,
            client_secret: None,
            timeout_secs: default_api_timeout_secs(),
        }
    }
}

/// SMTP delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    #[serde(default)]
    pub host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub port: u16,

    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub pass: String,

    #[serde(default)]
    pub from: Option<String>,

    #[serde(default = "default_use_starttls")]
    pub use_starttls: bool,

    #[serde(default)]
    pub use_ssl: bool,

    #[serde(default)]
    pub recipient: Option<String>,
}

fn default_smtp_port() -> u16 {
    25
}

fn default_use_starttls() -> bool {
    true
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_smtp_port(),
            user: String::new(),
            pass: String::new(),
            from: None,
            use_starttls: default_use_starttls(),
            use_ssl: false,
            recipient: None,
        }
    }
}

impl SmtpConfig {
    /// Sender address: explicit `from`, else the SMTP user, else a
    /// no-reply placeholder.
    pub fn effective_from(&self) -> String {
        if let Some(from) = &self.from {
            return from.clone();
        }
        if !self.user.is_empty() {
            return self.user.clone();
        }
        "no-reply@example.com".to_string()
    }
}

/// Run behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulate delivery instead of sending. State still advances on
    /// the simulated success.
    #[serde(default = "default_dry_run")]
    pub dry_run: bool,

    /// 0 = process all assets, N = first N (smoke-testing aid).
    #[serde(default)]
    pub sample_count: usize,

    /// Send a full fleet report on the very first run. When false, the
    /// first run persists an empty state marker and sends nothing.
    #[serde(default = "default_seed_on_first_run")]
    pub seed_on_first_run: bool,
}

fn default_dry_run() -> bool {
    true
}

fn default_seed_on_first_run() -> bool {
    true
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            dry_run: default_dry_run(),
            sample_count: 0,
            seed_on_first_run: default_seed_on_first_run(),
        }
    }
}

/// Complete relay configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub run: RunConfig,

    /// Working directory for the state file, CSV artifact and fetched
    /// rows.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
}

fn default_work_dir() -> PathBuf {
    PathBuf::from("/var/lib/radar-relay")
}

impl RelayConfig {
    /// Load configuration from a TOML file, then fill secrets from the
    /// environment. A missing file yields pure defaults; a present but
    /// broken file is a hard error.
    pub fn load(path: &Path) -> Result<Self, RelayError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)
                .map_err(|e| RelayError::Config(format!("{}: {e}", path.display())))?
        } else {
            Self::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Environment fallback for fields not set in the file.
    fn apply_env(&mut self) {
        if self.api.client_id.is_none() {
            self.api.client_id = env_nonempty("CLIENT_ID");
        }
        if self.api.client_secret.is_none() {
            self.api.client_secret = env_nonempty("CLIENT_SECRET");
        }
        if self.smtp.host.is_none() {
            self.smtp.host = env_nonempty("SMTP_HOST");
        }
        if self.smtp.user.is_empty() {
            if let Some(user) = env_nonempty("SMTP_USER") {
                self.smtp.user = user;
            }
        }
        if self.smtp.pass.is_empty() {
            if let Some(pass) = env_nonempty("SMTP_PASS") {
                self.smtp.pass = pass;
            }
        }
        if self.smtp.from.is_none() {
            self.smtp.from = env_nonempty("SMTP_FROM");
        }
        if self.smtp.recipient.is_none() {
            self.smtp.recipient = env_nonempty("EMAIL_RECIPIENT");
        }
    }

    pub fn state_file(&self) -> PathBuf {
        self.work_dir.join("assets_state.json")
    }

    pub fn csv_file(&self) -> PathBuf {
        self.work_dir.join("current_assets.csv")
    }

    pub fn rows_file(&self) -> PathBuf {
        self.work_dir.join("assets_rows.json")
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
