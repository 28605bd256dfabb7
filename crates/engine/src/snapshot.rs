//! One-shot fetchers for the aggregate snapshot and the alert list.
//!
//! Each call performs exactly one request; retry policy belongs to the
//! caller. Transport, parse, and shape failures are distinguished so
//! the view layer can show "unknown" instead of a zeroed chart.

use alertdash_core::{Alert, FetchError, SnapshotData};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;

/// Optional query filters for the alert-list endpoint.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub alert_type: Option<String>,
    pub priority: Option<u8>,
}

impl AlertFilter {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(v) = &self.start_time {
            pairs.push(("start_time", v.clone()));
        }
        if let Some(v) = &self.end_time {
            pairs.push(("end_time", v.clone()));
        }
        if let Some(v) = &self.alert_type {
            pairs.push(("alert_type", v.clone()));
        }
        if let Some(v) = self.priority {
            pairs.push(("priority", v.to_string()));
        }
        pairs
    }
}

pub struct SnapshotLoader {
    client: reqwest::Client,
    base_url: String,
}

impl SnapshotLoader {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.snapshot_timeout)
            .build()
            .map_err(|err| FetchError::Transport {
                status: None,
                detail: format!("client build failed: {err}"),
            })?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Fetch the current aggregate snapshot (`GET /api/stats`).
    pub async fn fetch_snapshot(&self) -> Result<SnapshotData, FetchError> {
        let url = format!("{}/api/stats", self.base_url);
        let body = self.get_text(&url, &[]).await?;
        let snapshot: SnapshotData = decode(&body)?;
        debug!(url = %url, "snapshot fetched");
        Ok(snapshot)
    }

    /// Fetch raw alerts (`GET /api/alerts`), optionally filtered.
    ///
    /// A body that is JSON but not an array (e.g. `{"error": ...}`) is
    /// a shape error, never an empty list.
    pub async fn fetch_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>, FetchError> {
        let url = format!("{}/api/alerts", self.base_url);
        let body = self.get_text(&url, &filter.query_pairs()).await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|err| FetchError::Parse {
                detail: err.to_string(),
            })?;
        if !value.is_array() {
            return Err(FetchError::Shape {
                detail: format!("alerts endpoint returned a non-array: {value}"),
            });
        }
        serde_json::from_value(value).map_err(|err| FetchError::Shape {
            detail: err.to_string(),
        })
    }

    async fn get_text(
        &self,
        url: &str,
        query: &[(&'static str, String)],
    ) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|err| FetchError::Transport {
                status: None,
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Transport {
                status: Some(status.as_u16()),
                detail: format!("{url} returned {status}"),
            });
        }
        response.text().await.map_err(|err| FetchError::Transport {
            status: Some(status.as_u16()),
            detail: err.to_string(),
        })
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, FetchError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(|err| FetchError::Parse {
        detail: err.to_string(),
    })?;
    serde_json::from_value(value).map_err(|err| FetchError::Shape {
        detail: err.to_string(),
    })
}
