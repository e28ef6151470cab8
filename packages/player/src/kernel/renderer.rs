//! Output surface for playback.
//!
//! The scheduler only decides *what* is on screen and *when*. Anything that
//! actually draws implements [`Renderer`]; the default one writes to the log.

use tracing::{debug, info, warn};

use crate::domains::campaigns::{ContentKind, RenderItem};

/// Draws items. Calls are made from the player task, one at a time.
pub trait Renderer: Send {
    fn render(&mut self, item: &RenderItem);
    fn clear(&mut self);
}

/// Renders to the tracing log. Used when no display is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRenderer;

impl Renderer for LogRenderer {
    fn render(&mut self, item: &RenderItem) {
        match &item.kind {
            ContentKind::Text => {
                info!(content_id = %item.content_id, text = %item.data, "render TEXT")
            }
            ContentKind::Image | ContentKind::Video => {
                info!(content_id = %item.content_id, kind = %item.kind, src = %item.data, "render media")
            }
            ContentKind::Unknown(kind) => {
                warn!(content_id = %item.content_id, kind = %kind, "unsupported item type, skipping draw")
            }
        }
    }

    fn clear(&mut self) {
        debug!("clear screen");
    }
}
