//! Local video output
//!
//! - Player: VLC/mpv process playing the media element's source

pub mod player;

pub use player::{LocalPlayer, PlayerError, PlayerType};
