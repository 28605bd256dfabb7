//! Engine configuration.
//!
//! The only environment-derived setting is the API base URL; the push
//! channel address is derived from it.

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
const API_URL_ENV: &str = "ALERTDASH_API_URL";

#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the alert backend, no trailing slash.
    pub api_base_url: String,
    /// Timeout applied to snapshot and alert-list fetches.
    pub snapshot_timeout: Duration,
    /// Timeout applied to assistant requests.
    pub assistant_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            snapshot_timeout: Duration::from_secs(10),
            assistant_timeout: Duration::from_secs(30),
        }
    }
}

impl Config {
    /// Read configuration from the environment, falling back to
    /// defaults. An empty override is treated as unset.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Ok(url) = std::env::var(API_URL_ENV) {
            let url = url.trim().trim_end_matches('/');
            if !url.is_empty() {
                cfg.api_base_url = url.to_string();
            }
        }
        cfg
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Push-channel URL: same host as the API, ws scheme, `/ws` path.
    pub fn ws_url(&self) -> String {
        let base = if let Some(rest) = self.api_base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.api_base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{}", self.api_base_url)
        };
        format!("{base}/ws")
    }
}
