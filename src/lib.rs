//! torrentplayer - terminal client for a torrent streaming server
//!
//! Browse and search the server's movie catalog, start a transfer, watch its
//! progress arrive over the push channel, and hand the finished stream to a
//! local player.
//!
//! # Modules
//!
//! - `models` - Movies, sessions, transfer status, playback UI state
//! - `api` - REST client and push channel
//! - `controller` - Session state machine (events in, effects out)
//! - `runtime` - Executes controller effects on tokio
//! - `notify` - Transient toasts
//! - `stream` - Local video player
//! - `ui` - TUI components
//! - `app` - TUI state and key handling
//! - `cli` / `commands` - Scriptable subcommands

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod models;
pub mod notify;
pub mod runtime;
pub mod stream;
pub mod ui;

// Re-export commonly used types
pub use models::{
    ControlAction, ControlButtons, MediaElement, Movie, Quality, SessionId, SessionStatus,
    TransferPhase, TransferStatus, UiMode, Viewport,
};

pub use api::{ApiError, CatalogQuery, PlayerApi};
pub use app::{App, InputMode};
pub use controller::{Effect, Event, PlaybackSessionController};
pub use runtime::SessionRuntime;
