//! CLI - Command Line Interface for torrentplayer
//!
//! Every server operation the TUI performs is scriptable. Output is
//! JSON-parseable with `--json` (default when stdout is not a terminal).
//!
//! # Examples
//!
//! ```bash
//! # Catalog
//! torrentplayer search "inception" --json
//! torrentplayer browse --page 2 -Q 1080p
//!
//! # Start a transfer and follow it until the stream is ready
//! torrentplayer play 42 --watch
//!
//! # Transfer control for an existing session
//! torrentplayer pause --session session_k3j9x0a1b
//! torrentplayer status --session session_k3j9x0a1b --watch
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::api::ApiError;
use crate::models::{Quality, SessionId};
use crate::stream::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// General error
    Error = 1,
    InvalidArgs = 2,
    /// Server unreachable or returned garbage
    NetworkError = 3,
    /// Movie or session not found
    NotFound = 4,
    /// Server answered with `success: false`
    Rejected = 5,
    /// Local video player could not start
    PlayerFailed = 6,
}

impl ExitCode {
    /// Exit code for a failed server call
    pub fn for_api_error(error: &ApiError) -> Self {
        match error {
            ApiError::ServerError(404) => ExitCode::NotFound,
            ApiError::Rejected(_) => ExitCode::Rejected,
            _ if error.is_transport() => ExitCode::NetworkError,
            _ => ExitCode::Error,
        }
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// torrentplayer - terminal client for a torrent streaming server
///
/// Run without arguments to launch the interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "torrentplayer",
    version,
    about = "Terminal client for a torrent streaming movie server",
    long_about = "Browse and search the server's movie catalog, start a transfer, \
                  follow its progress and play the stream in VLC or mpv.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  torrentplayer                          Launch interactive TUI\n\
                  torrentplayer search \"inception\"       Search the catalog\n\
                  torrentplayer play 42 --watch          Start and follow a transfer\n\
                  torrentplayer status -s <SESSION>      Session status"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Server base URL (overrides config and TORRENTPLAYER_SERVER)
    #[arg(long, short = 'S', global = true)]
    pub server: Option<String>,

    /// Quality filter (480p, 720p, 1080p, 2160p, 3D)
    #[arg(long, short = 'Q', global = true, value_parser = parse_quality)]
    pub quality: Option<Quality>,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

fn parse_quality(s: &str) -> Result<Quality, String> {
    Quality::from_str_loose(s).ok_or_else(|| {
        format!(
            "unknown quality '{}' (expected one of 480p, 720p, 1080p, 2160p, 3D)",
            s
        )
    })
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search the movie catalog
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List a catalog page
    #[command(visible_alias = "b")]
    Browse(BrowseCmd),

    /// Details for one movie
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// Best torrent for a movie at the selected quality
    #[command(visible_alias = "t")]
    Torrent(TorrentCmd),

    /// Start a transfer for a movie
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Pause a session's transfer
    Pause(SessionArg),

    /// Resume a session's transfer
    Resume(SessionArg),

    /// Stop a session's transfer
    Stop(SessionArg),

    /// Server-side status of a session
    Status(StatusCmd),
}

/// Search by title
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search term
    #[arg(required = true)]
    pub query: String,

    /// Maximum number of results to print
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// One page of the catalog
#[derive(Args, Debug)]
pub struct BrowseCmd {
    /// Page number (1-based)
    #[arg(long, short = 'p', default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,
}

#[derive(Args, Debug)]
pub struct InfoCmd {
    /// Movie id
    #[arg(required = true)]
    pub id: u64,
}

#[derive(Args, Debug)]
pub struct TorrentCmd {
    /// Movie id
    #[arg(required = true)]
    pub id: u64,
}

/// Start a transfer
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Movie id
    #[arg(required = true)]
    pub id: u64,

    /// Reuse an existing session instead of generating one
    #[arg(long, short = 's')]
    pub session: Option<String>,

    /// Follow progress until the stream is ready, then open the player
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// With --watch: print the stream URL instead of opening a player
    #[arg(long)]
    pub no_player: bool,

    /// Player to open (overrides config)
    #[arg(long, value_enum)]
    pub player: Option<PlayerChoice>,
}

impl PlayCmd {
    pub fn session_id(&self) -> SessionId {
        match &self.session {
            Some(id) => SessionId::from_string(id.clone()),
            None => SessionId::generate(),
        }
    }
}

/// Local player selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChoice {
    Vlc,
    Mpv,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> Self {
        match choice {
            PlayerChoice::Vlc => PlayerType::Vlc,
            PlayerChoice::Mpv => PlayerType::Mpv,
        }
    }
}

/// Session targeted by a control command
#[derive(Args, Debug)]
pub struct SessionArg {
    /// Session id printed by `play`
    #[arg(long, short = 's', required = true)]
    pub session: String,
}

impl SessionArg {
    pub fn session_id(&self) -> SessionId {
        SessionId::from_string(self.session.clone())
    }
}

#[derive(Args, Debug)]
pub struct StatusCmd {
    #[command(flatten)]
    pub target: SessionArg,

    /// Keep polling
    #[arg(long, short = 'w')]
    pub watch: bool,

    /// Poll interval in seconds (with --watch)
    #[arg(long, short = 'i', default_value = "2")]
    pub interval: u64,
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// JSON envelope for CLI output
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// `play` response
#[derive(Debug, Serialize, Deserialize)]
pub struct PlayResponse {
    pub session_id: String,
    pub movie_id: u64,
    pub quality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub torrent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_url: Option<String>,
}

/// `pause` / `resume` / `stop` response
#[derive(Debug, Serialize, Deserialize)]
pub struct ControlResponse {
    pub session_id: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data as a JSON envelope
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let output = JsonOutput::success(data);
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    /// Print one JSON object per line (for --watch streams)
    pub fn print_line<T: Serialize>(&self, data: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string(data)?);
        Ok(())
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Report a failed server call with the matching exit code
    pub fn api_error(&self, context: &str, error: &ApiError) -> ExitCode {
        let detail = error
            .server_message()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        self.error(format!("{}: {}", context, detail), ExitCode::for_api_error(error))
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
