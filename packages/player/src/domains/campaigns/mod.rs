//! Campaigns: the immutable playlists a player can show.
//!
//! Campaigns are built once from a config document, checked, and then shared
//! read-only (`Arc<Campaign>`) with the playback scheduler.

pub mod admin_client;
pub mod loader;
pub mod model;
pub mod selector;

pub use admin_client::{AdminClient, AdminError, ConfigMeta, FetchedConfig};
pub use loader::{
    build_campaigns, from_value, load_from_file, summary, ConfigDocument, ConfigLoadError,
};
pub use model::{Campaign, ContentKind, LogicalConfigError, RenderItem, DEFAULT_ITEM_DURATION};
pub use selector::select_campaign;
