//! Clients for the torrent player server
//!
//! - Catalog: REST endpoints (movies, play, control, status)
//! - Push: Socket.IO progress and readiness events

pub mod catalog;
pub mod push;

pub use catalog::{ApiError, CatalogQuery, PlayerApi};
pub use push::{ChannelSignal, PushChannel, PushEvent};
