//! Vendor inventory API client.
//!
//! Client-credentials token handshake followed by a bearer-authenticated
//! asset fetch. The payload shape has drifted across vendor API
//! revisions, so extraction tolerates `{"items": [...]}`, a bare list,
//! or any dict whose first list-valued member holds the assets.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use radar_common::config::ApiConfig;
use radar_common::AssetSnapshot;

pub struct InventoryClient {
    client: reqwest::blocking::Client,
    auth_url: String,
    client_url: String,
    client_id: String,
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

impl InventoryClient {
    pub fn new(api: &ApiConfig) -> Result<Self> {
        let client_id = api
            .client_id
            .clone()
            .context("CLIENT_ID missing; cannot obtain token")?;
        let client_secret = api
            .client_secret
            .clone()
            .context("CLIENT_SECRET missing; cannot obtain token")?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(api.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            auth_url: api.auth_url.clone(),
            client_url: api.client_url.clone(),
            client_id,
            client_secret,
        })
    }

    fn token(&self) -> Result<String> {
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];
        let response = self
            .client
            .post(&self.auth_url)
            .form(&params)
            .send()
            .context("Failed to request token")?;
        if !response.status().is_success() {
            bail!("Failed to obtain access token: HTTP {}", response.status());
        }
        let body: TokenResponse = response
            .json()
            .context("Failed to parse token response")?;
        body.access_token
            .context("Token response carried no access_token")
    }

    /// Fetch the current asset inventory, sorted by (organization, name).
    pub fn fetch(&self) -> Result<Vec<AssetSnapshot>> {
        let token = self.token()?;
        let response = self
            .client
            .get(&self.client_url)
            .bearer_auth(token)
            .send()
            .context("Failed to fetch assets")?;
        if !response.status().is_success() {
            bail!("Failed to fetch assets: HTTP {}", response.status());
        }
        let data: Value = response
            .json()
            .context("Failed to parse JSON response from assets endpoint")?;

        let mut snapshots: Vec<AssetSnapshot> =
            extract_items(&data).iter().map(to_snapshot).collect();
        snapshots.sort_by(|a, b| {
            let ka = (a.organization.clone(), a.asset_name.clone());
            let kb = (b.organization.clone(), b.asset_name.clone());
            ka.cmp(&kb)
        });

        let no_backup = snapshots
            .iter()
            .filter(|s| s.last_successful_backup.is_null())
            .count();
        debug!(
            total = snapshots.len(),
            no_backup, "inventory fetch complete"
        );
        Ok(snapshots)
    }
}

/// Pull the asset list out of whichever envelope the API used.
fn extract_items(data: &Value) -> Vec<Value> {
    if let Some(items) = data.get("items").and_then(Value::as_array) {
        return items.clone();
    }
    if let Some(list) = data.as_array() {
        return list.clone();
    }
    if let Some(map) = data.as_object() {
        for value in map.values() {
            if let Some(list) = value.as_array() {
                return list.clone();
            }
        }
    }
    Vec::new()
}

/// Map one vendor asset object onto an artifact row.
fn to_snapshot(vendor: &Value) -> AssetSnapshot {
    let raw_ts = vendor
        .get("lastSuccessfulBackupTimestamp")
        .cloned()
        .unwrap_or(Value::Null);
    let display = match &raw_ts {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    };
    let organization = vendor
        .get("customerName")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .unwrap_or("Unassigned")
        .to_string();
    AssetSnapshot {
        asset_id: vendor.get("id").cloned().unwrap_or(Value::Null),
        asset_name: vendor
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_string),
        organization: Some(organization),
        status: vendor
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        last_backup_display: display,
        last_successful_backup: raw_ts,
    }
}
