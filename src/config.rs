//! Runtime configuration for the dashboard client.
//!
//! Values come from environment variables with defaults baked in:
//!
//! - `RFM_API_BASE_URL` — backend API root (default `http://localhost:8000/api`)
//! - `RFM_STORAGE_DIR` — directory holding the persisted session token
//! - `RFM_LOCATION_PATH` — URL path the client boots on (default `/`)
//! - `RFM_NOTIFICATION_DEFAULT_MS` — default notification lifetime
//! - `RFM_REQUEST_TIMEOUT_SECS` — HTTP request timeout

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_NOTIFICATION_MS: u64 = 5000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings shared by the store, the API client and the binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Backend API root, without trailing slash.
    pub api_base_url: String,
    /// Directory where the credential file lives.
    pub storage_dir: PathBuf,
    /// URL path the client was opened on.
    pub location_path: String,
    /// Lifetime of notifications raised without an explicit duration.
    #[serde(with = "duration_ms")]
    pub notification_duration: Duration,
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_dir: default_storage_dir(),
            location_path: "/".to_string(),
            notification_duration: Duration::from_millis(DEFAULT_NOTIFICATION_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl DashboardConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("RFM_API_BASE_URL") {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ConfigError::InvalidUrl(url));
            }
            config.api_base_url = url;
        }
        if let Some(dir) = lookup("RFM_STORAGE_DIR").filter(|d| !d.is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }
        if let Some(path) = lookup("RFM_LOCATION_PATH").filter(|p| !p.is_empty()) {
            config.location_path = path;
        }
        if let Some(ms) = lookup("RFM_NOTIFICATION_DEFAULT_MS") {
            config.notification_duration =
                Duration::from_millis(parse_number("RFM_NOTIFICATION_DEFAULT_MS", &ms)?);
        }
        if let Some(secs) = lookup("RFM_REQUEST_TIMEOUT_SECS") {
            config.request_timeout =
                Duration::from_secs(parse_number("RFM_REQUEST_TIMEOUT_SECS", &secs)?);
        }

        Ok(config)
    }

    /// Full path of the persisted credential file.
    pub fn credential_path(&self) -> PathBuf {
        self.storage_dir.join("session.json")
    }
}

fn parse_number(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        key,
        value: value.to_string(),
    })
}

/// Platform data directory for the client.
///
/// On Linux: `~/.local/share/RFMInsights`
/// On macOS: `~/Library/Application Support/RFMInsights`
/// On Windows: `%LOCALAPPDATA%\RFMInsights`
fn default_storage_dir() -> PathBuf {
    let app_name = "RFMInsights";
    if cfg!(target_os = "macos") {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home)
            .join("Library")
            .join("Application Support")
            .join(app_name)
    } else if cfg!(target_os = "windows") {
        let local_app_data = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("APPDATA").unwrap_or_else(|_| "C:\\tmp".to_string()));
        PathBuf::from(local_app_data).join(app_name)
    } else {
        let home = env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".local").join("share").join(app_name)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
