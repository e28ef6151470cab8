// Domain logic: events, player state, campaigns and playback scheduling

pub mod campaigns;
pub mod events;
pub mod playback;
pub mod player_state;
