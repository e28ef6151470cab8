use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Display time used when an item's own duration is unusable.
pub const DEFAULT_ITEM_DURATION: Duration = Duration::from_secs(5);

/// What an item shows. The scheduler never interprets this; renderers do.
///
/// Type strings outside the known set load fine and are kept verbatim, so a
/// renderer can pick its own fallback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentKind {
    Text,
    Image,
    Video,
    Unknown(String),
}

impl ContentKind {
    pub fn as_str(&self) -> &str {
        match self {
            ContentKind::Text => "TEXT",
            ContentKind::Image => "IMAGE",
            ContentKind::Video => "VIDEO",
            ContentKind::Unknown(other) => other,
        }
    }
}

impl From<String> for ContentKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "TEXT" => ContentKind::Text,
            "IMAGE" => ContentKind::Image,
            "VIDEO" => ContentKind::Video,
            _ => ContentKind::Unknown(s),
        }
    }
}

impl From<ContentKind> for String {
    fn from(kind: ContentKind) -> Self {
        match kind {
            ContentKind::Unknown(other) => other,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single displayable unit of a campaign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderItem {
    pub content_id: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Text body for TEXT, a media path or URL otherwise.
    pub data: String,
    pub duration_sec: f64,
    pub order: i64,
}

impl RenderItem {
    /// How long the item stays on screen before the playlist advances.
    pub fn display_duration(&self) -> Duration {
        if self.duration_sec.is_finite() && self.duration_sec > 0.0 {
            Duration::try_from_secs_f64(self.duration_sec).unwrap_or(DEFAULT_ITEM_DURATION)
        } else {
            DEFAULT_ITEM_DURATION
        }
    }
}

/// Config is well-formed but logically unusable. Fatal at load time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogicalConfigError {
    #[error("Duplicate item order detected: campaign={campaign_id} order={order}")]
    DuplicateOrder { campaign_id: String, order: i64 },
}

/// A named, prioritised playlist. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Campaign {
    campaign_id: String,
    campaign_name: String,
    campaign_priority: i64,
    generated_at: String,
    items: Vec<RenderItem>,
}

impl Campaign {
    /// Build a campaign. Items are put in playback order: by `order`, then
    /// by `content_id`.
    pub fn new(
        campaign_id: impl Into<String>,
        campaign_name: impl Into<String>,
        campaign_priority: i64,
        generated_at: impl Into<String>,
        mut items: Vec<RenderItem>,
    ) -> Self {
        items.sort_by(|a, b| {
            a.order
                .cmp(&b.order)
                .then_with(|| a.content_id.cmp(&b.content_id))
        });

        Self {
            campaign_id: campaign_id.into(),
            campaign_name: campaign_name.into(),
            campaign_priority,
            generated_at: generated_at.into(),
            items,
        }
    }

    pub fn id(&self) -> &str {
        &self.campaign_id
    }

    pub fn name(&self) -> &str {
        &self.campaign_name
    }

    pub fn priority(&self) -> i64 {
        self.campaign_priority
    }

    pub fn generated_at(&self) -> &str {
        &self.generated_at
    }

    /// Items in playback order.
    pub fn items(&self) -> &[RenderItem] {
        &self.items
    }

    /// Every `order` value must appear at most once.
    pub fn check_unique_order(&self) -> Result<(), LogicalConfigError> {
        let mut seen = HashSet::with_capacity(self.items.len());
        for item in &self.items {
            if !seen.insert(item.order) {
                return Err(LogicalConfigError::DuplicateOrder {
                    campaign_id: self.campaign_id.clone(),
                    order: item.order,
                });
            }
        }
        Ok(())
    }
}
