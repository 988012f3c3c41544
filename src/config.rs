//! Metadata backend configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Result;

/// Environment variable overriding [`BackendConfig::base_url`].
pub const ENV_API_URL: &str = "PHOTO_META_API_URL";
/// Environment variable overriding [`BackendConfig::timeout_secs`].
pub const ENV_API_TIMEOUT: &str = "PHOTO_META_API_TIMEOUT_SECS";

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_metadata_path() -> String {
    "/api/metadata".to_string()
}

fn default_save_path() -> String {
    "/api/save_metadata".to_string()
}

fn default_suggestions_path() -> String {
    "/api/keywords/suggest".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Where and how to reach the metadata extraction/write service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_metadata_path")]
    pub metadata_path: String,
    #[serde(default = "default_save_path")]
    pub save_path: String,
    #[serde(default = "default_suggestions_path")]
    pub suggestions_path: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            metadata_path: default_metadata_path(),
            save_path: default_save_path(),
            suggestions_path: default_suggestions_path(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Defaults pointed at the given base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Defaults overlaid with the `PHOTO_META_API_*` environment variables.
    ///
    /// An unparseable timeout is ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var(ENV_API_URL) {
            if !url.trim().is_empty() {
                config.base_url = url.trim().to_string();
            }
        }
        if let Ok(timeout) = std::env::var(ENV_API_TIMEOUT) {
            match timeout.trim().parse::<u64>() {
                Ok(secs) => config.timeout_secs = secs,
                Err(_) => tracing::warn!(value = %timeout, "Ignoring invalid backend timeout"),
            }
        }
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let base = Url::parse(&self.base_url)?;
        Ok(base.join(path)?)
    }
}
