pub mod player;
pub mod render_feed;
pub mod renderer;
pub mod timers;

pub use player::{IngestOutcome, Player, PlayerError, PlayerHandle};
pub use render_feed::{FeedMessage, RenderFeed};
pub use renderer::{LogRenderer, Renderer};
pub use timers::{TimerFired, TimerFiredRx, TimerKind, TimerManager};
