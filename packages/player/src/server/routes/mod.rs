pub mod events;
pub mod health;
pub mod state;
pub mod stream;

pub use events::{events_hint, post_event};
pub use health::health_handler;
pub use state::get_state;
pub use stream::render_stream;
