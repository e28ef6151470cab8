//! Client for the admin service that stores uploaded configs.
//!
//! `GET {base}/configs` lists metadata, `GET {base}/configs/{id}` returns the
//! full `{ meta, config }` record.

use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Invalid admin URL: {url}")]
    InvalidUrl { url: String },

    #[error("Admin request failed ({url}): {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Admin request failed ({url}): {message}")]
    Status { url: String, message: String },

    #[error("Invalid JSON from {url}")]
    InvalidJson { url: String },

    #[error("Admin has no uploaded configs")]
    NoConfigs,

    #[error("Admin response for configId={config_id} is missing config payload")]
    MissingPayload { config_id: String },
}

/// Metadata the admin keeps for each uploaded config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigMeta {
    #[serde(default)]
    pub config_id: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
}

impl ConfigMeta {
    fn created(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

#[derive(Debug, Deserialize)]
struct ConfigList {
    #[serde(default)]
    configs: Vec<ConfigMeta>,
}

#[derive(Debug, Deserialize)]
struct ConfigRecord {
    #[serde(default)]
    config: Option<Value>,
}

/// Latest config: newest `createdAt`, then greatest `configId`. A missing or
/// unparseable `createdAt` counts as older than any real date.
pub fn pick_latest(configs: &[ConfigMeta]) -> Option<&ConfigMeta> {
    configs.iter().max_by(|a, b| {
        a.created()
            .cmp(&b.created())
            .then_with(|| a.config_id.cmp(&b.config_id))
    })
}

/// A config fetched from the admin, with a label of where it came from.
#[derive(Debug, Clone)]
pub struct FetchedConfig {
    pub config: Value,
    pub source_label: String,
}

#[derive(Debug, Clone)]
pub struct AdminClient {
    http: reqwest::Client,
    base: Url,
}

impl AdminClient {
    pub fn new(base_url: &str) -> Result<Self, AdminError> {
        let trimmed = base_url.trim_end_matches('/');
        let base = Url::parse(trimmed)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| AdminError::InvalidUrl {
                url: base_url.to_string(),
            })?;

        Ok(Self {
            http: reqwest::Client::new(),
            base,
        })
    }

    /// Base URL followed by the given (percent-encoded) path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value, AdminError> {
        let label = url.to_string();
        debug!(url = %label, "admin request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| AdminError::Transport {
                url: label.clone(),
                source,
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| AdminError::Transport {
                url: label.clone(),
                source,
            })?;

        let parsed: Value = if body.is_empty() {
            Value::Object(Default::default())
        } else {
            serde_json::from_str(&body).map_err(|_| AdminError::InvalidJson { url: label.clone() })?
        };

        if !status.is_success() {
            let message = parsed
                .get("error")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
            return Err(AdminError::Status {
                url: label,
                message,
            });
        }

        Ok(parsed)
    }

    pub async fn list_configs(&self) -> Result<Vec<ConfigMeta>, AdminError> {
        let url = self.endpoint(&["configs"]);
        let label = url.to_string();
        let value = self.get_json(url).await?;
        let list: ConfigList =
            serde_json::from_value(value).map_err(|_| AdminError::InvalidJson { url: label })?;
        Ok(list.configs)
    }

    /// Fetch a config by id, or the latest one when `config_id` is `None`.
    pub async fn fetch_config(&self, config_id: Option<&str>) -> Result<FetchedConfig, AdminError> {
        let resolved = match config_id {
            Some(id) => id.to_string(),
            None => {
                let configs = self.list_configs().await?;
                let latest = pick_latest(&configs)
                    .filter(|meta| !meta.config_id.is_empty())
                    .ok_or(AdminError::NoConfigs)?;
                info!(config_id = %latest.config_id, "using latest admin config");
                latest.config_id.clone()
            }
        };

        let url = self.endpoint(&["configs", &resolved]);
        let source_label = url.to_string();
        let value = self.get_json(url).await?;

        let record: ConfigRecord = serde_json::from_value(value).map_err(|_| {
            AdminError::InvalidJson {
                url: source_label.clone(),
            }
        })?;

        let config = record
            .config
            .filter(|c| !c.is_null())
            .ok_or(AdminError::MissingPayload {
                config_id: resolved,
            })?;

        Ok(FetchedConfig {
            config,
            source_label,
        })
    }
}
