//! Config document -> checked, ordered campaign list.
//!
//! Schema validation is not done here. Serde enforces the structural shape;
//! the logical checks (unique item order) run before anything is scheduled.

use std::fmt::Write as _;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use serde_json::error::Category;
use thiserror::Error;
use tracing::debug;

use super::admin_client::AdminError;
use super::model::{Campaign, LogicalConfigError, RenderItem};
use super::selector::precedence;

/// The config payload as authored. Unknown top-level fields are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigDocument {
    pub campaigns: Vec<CampaignDocument>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignDocument {
    pub campaign_id: String,
    pub campaign_name: String,
    pub campaign_priority: i64,
    pub generated_at: String,
    pub items: Vec<RenderItem>,
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("Config file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to load config from Admin: {0}")]
    Admin(#[from] AdminError),

    #[error("Config fails logical checks: {0}")]
    Logical(#[from] LogicalConfigError),
}

impl ConfigLoadError {
    /// Process exit code: 1 for a config that is readable but wrong,
    /// 2 for a source that could not be read at all.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigLoadError::NotFound { .. }
            | ConfigLoadError::Read { .. }
            | ConfigLoadError::Admin(_) => 2,
            ConfigLoadError::Parse { source, .. } => match source.classify() {
                Category::Data => 1,
                Category::Io | Category::Syntax | Category::Eof => 2,
            },
            ConfigLoadError::Logical(_) => 1,
        }
    }
}

/// Convert a document into campaigns, sorted by precedence, each with its
/// items in playback order. Fails on the first duplicate item order.
pub fn build_campaigns(doc: ConfigDocument) -> Result<Vec<Arc<Campaign>>, LogicalConfigError> {
    let mut campaigns = doc
        .campaigns
        .into_iter()
        .map(|c| {
            Campaign::new(
                c.campaign_id,
                c.campaign_name,
                c.campaign_priority,
                c.generated_at,
                c.items,
            )
        })
        .collect::<Vec<_>>();

    for campaign in &campaigns {
        campaign.check_unique_order()?;
    }

    campaigns.sort_by(precedence);
    debug!(count = campaigns.len(), "campaigns built");

    Ok(campaigns.into_iter().map(Arc::new).collect())
}

/// Parse a JSON value (e.g. an admin record's `config`) into campaigns.
pub fn from_value(
    value: serde_json::Value,
    origin: &str,
) -> Result<Vec<Arc<Campaign>>, ConfigLoadError> {
    let doc: ConfigDocument =
        serde_json::from_value(value).map_err(|source| ConfigLoadError::Parse {
            origin: origin.to_string(),
            source,
        })?;
    Ok(build_campaigns(doc)?)
}

/// Read, parse and check a config file.
pub fn load_from_file(path: &Path) -> Result<Vec<Arc<Campaign>>, ConfigLoadError> {
    if !path.is_file() {
        return Err(ConfigLoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let doc: ConfigDocument =
        serde_json::from_str(&raw).map_err(|source| ConfigLoadError::Parse {
            origin: path.display().to_string(),
            source,
        })?;

    Ok(build_campaigns(doc)?)
}

/// Deterministic, human-readable summary of the loaded campaigns.
pub fn summary(campaigns: &[Arc<Campaign>], mode: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== IDS Player — Campaign Summary ===");
    let _ = writeln!(out, "Mode: {mode}");
    let _ = writeln!(out, "Campaigns: {}", campaigns.len());

    for c in campaigns {
        let _ = writeln!(out);
        let _ = writeln!(out, "Campaign: {} ({})", c.name(), c.id());
        let _ = writeln!(out, "Priority: {}", c.priority());
        let _ = writeln!(out, "GeneratedAt: {}", c.generated_at());
        let _ = writeln!(out, "Items: {}", c.items().len());
        for it in c.items() {
            let _ = writeln!(
                out,
                "  #{} [{}] id={} duration={}s data={}",
                it.order, it.kind, it.content_id, it.duration_sec, it.data
            );
        }
    }

    out
}
