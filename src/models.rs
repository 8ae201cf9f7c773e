//! Data structures and types for torrentplayer
//!
//! Contains all shared models used across the application organized by domain:
//! - **Catalog**: movie entries returned by the catalog endpoints
//! - **Session**: the per-process session id and control actions
//! - **Transfer**: server-reported download progress
//! - **Playback**: UI mode, control buttons, the media element

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

// =============================================================================
// Catalog Models
// =============================================================================

/// Catalog entry as served by `/api/movies` and `/api/movie/<id>`
///
/// Immutable snapshot from the server: the client renders it, never edits it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub year: Option<u16>,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub mpa_rating: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub medium_cover_image: Option<String>,
    #[serde(default)]
    pub large_cover_image: Option<String>,
}

/// Scraped entries carry `null` for keys the source did not have
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Movie {
    /// Rating with one decimal, "N/A" when the server has none
    pub fn rating_label(&self) -> String {
        match self.rating {
            Some(rating) => format!("{:.1}", rating),
            None => "N/A".to_string(),
        }
    }

    /// Poster URL with the medium -> large fallback chain
    pub fn poster(&self) -> Option<&str> {
        self.medium_cover_image
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.large_cover_image.as_deref().filter(|s| !s.is_empty()))
    }

    /// First three genres, for catalog cards
    pub fn card_genres(&self) -> &[String] {
        &self.genres[..self.genres.len().min(3)]
    }

    /// "2010 • 8.8/10 ⭐" line shown under the playback title
    pub fn subtitle_line(&self) -> String {
        let year = self.year.map(|y| y.to_string()).unwrap_or_else(|| "?".into());
        format!("{} • {}/10 ⭐", year, self.rating_label())
    }

    /// Summary text with the placeholder used when the server sends none
    pub fn summary_or_placeholder(&self) -> &str {
        self.summary
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or("No summary available")
    }

    /// Detail lines for the playback panel
    pub fn detail_lines(&self) -> Vec<String> {
        let unknown = || "N/A".to_string();
        vec![
            format!("Rating: {}/10 ⭐", self.rating_label()),
            format!(
                "Runtime: {} minutes",
                self.runtime.map(|r| r.to_string()).unwrap_or_else(unknown)
            ),
            format!("Genres: {}", self.genres.join(", ")),
            format!(
                "Language: {}",
                self.language.clone().unwrap_or_else(unknown)
            ),
            format!(
                "MPA Rating: {}",
                self.mpa_rating.clone().unwrap_or_else(unknown)
            ),
        ]
    }
}

impl fmt::Display for Movie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.year {
            Some(year) => write!(f, "{} ({})", self.title, year),
            None => write!(f, "{}", self.title),
        }
    }
}

/// Quality filter sent with catalog and play requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Quality {
    #[serde(rename = "480p")]
    SD480p,
    #[default]
    #[serde(rename = "720p")]
    HD720p,
    #[serde(rename = "1080p")]
    FHD1080p,
    #[serde(rename = "2160p")]
    UHD2160p,
    #[serde(rename = "3D")]
    ThreeD,
}

impl Quality {
    /// All selectable qualities, in cycle order
    pub const ALL: [Quality; 5] = [
        Quality::SD480p,
        Quality::HD720p,
        Quality::FHD1080p,
        Quality::UHD2160p,
        Quality::ThreeD,
    ];

    /// Wire value for query strings and JSON bodies
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::SD480p => "480p",
            Quality::HD720p => "720p",
            Quality::FHD1080p => "1080p",
            Quality::UHD2160p => "2160p",
            Quality::ThreeD => "3D",
        }
    }

    /// Parse quality from a string (e.g., "4K", "1080p", "720p")
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s_lower = s.trim().to_lowercase();
        match s_lower.as_str() {
            "480p" | "480" | "sd" => Some(Quality::SD480p),
            "720p" | "720" | "hd" => Some(Quality::HD720p),
            "1080p" | "1080" | "fhd" => Some(Quality::FHD1080p),
            "2160p" | "2160" | "4k" | "uhd" => Some(Quality::UHD2160p),
            "3d" => Some(Quality::ThreeD),
            _ => None,
        }
    }

    /// Next quality in the selector (wraps around)
    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|q| q == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Torrent summary from `/api/torrent/<id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentInfo {
    pub url: Option<String>,
    pub quality: Option<String>,
    pub size: Option<String>,
    #[serde(default)]
    pub seeds: u32,
    #[serde(default)]
    pub peers: u32,
}

impl fmt::Display for TorrentInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} 👤{} peers {}",
            self.quality.as_deref().unwrap_or("???"),
            self.size.as_deref().unwrap_or("? GB"),
            self.seeds,
            self.peers
        )
    }
}

// =============================================================================
// Session Models
// =============================================================================

/// Client-generated correlation token for this process's server-side resources
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh id: `session_` followed by 9 base-36 characters
    pub fn generate() -> Self {
        let raw = Uuid::new_v4().as_u128();
        Self(format!("session_{}", to_base36(raw, 9)))
    }

    /// Wrap an existing id (e.g. one passed on the command line)
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for SessionId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

fn to_base36(mut n: u128, len: usize) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut out = Vec::with_capacity(len);
    for _ in 0..len {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Transfer control action sent to `/api/control/<session_id>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    Pause,
    Resume,
    Stop,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::Stop => "stop",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Transfer Models
// =============================================================================

/// Lifecycle phase reported by the server for the session's transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TransferPhase {
    Downloading,
    Paused,
    /// Any other server phase (seeding, ready_to_play, checking, ...)
    Other(String),
}

impl From<String> for TransferPhase {
    fn from(s: String) -> Self {
        match s.as_str() {
            "downloading" => TransferPhase::Downloading,
            "paused" => TransferPhase::Paused,
            _ => TransferPhase::Other(s),
        }
    }
}

impl From<TransferPhase> for String {
    fn from(phase: TransferPhase) -> String {
        phase.to_string()
    }
}

impl fmt::Display for TransferPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferPhase::Downloading => f.write_str("downloading"),
            TransferPhase::Paused => f.write_str("paused"),
            TransferPhase::Other(s) => f.write_str(s),
        }
    }
}

/// Latest server-reported transfer state; overwritten on every progress event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferStatus {
    pub phase: TransferPhase,
    /// Completion percentage, 0-100
    pub progress: f64,
    /// Bytes per second
    pub download_rate: f64,
    pub peers: u32,
}

impl TransferStatus {
    /// Progress as "42.5%"
    pub fn format_progress(&self) -> String {
        format!("{:.1}%", self.progress)
    }

    /// Rate as "1.5 MB/s"
    pub fn format_rate(&self) -> String {
        format!("{}/s", format_bytes(self.download_rate))
    }

    /// Progress as a 0.0-1.0 ratio for gauges
    pub fn ratio(&self) -> f64 {
        (self.progress / 100.0).clamp(0.0, 1.0)
    }
}

impl fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} @ {} ({} peers)",
            self.phase,
            self.format_progress(),
            self.format_rate(),
            self.peers
        )
    }
}

/// Format a byte count with 1024 steps: "0 B", "512 B", "1.5 KB", "2 MB"
pub fn format_bytes(bytes: f64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    if bytes <= 0.0 || !bytes.is_finite() {
        return "0 B".to_string();
    }
    let exp = ((bytes.ln() / 1024f64.ln()).floor() as i32).clamp(0, UNITS.len() as i32 - 1);
    let value = bytes / 1024f64.powi(exp);
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[exp as usize])
    } else {
        format!("{:.1} {}", rounded, UNITS[exp as usize])
    }
}

/// Snapshot from `/api/status/<session_id>`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStatus {
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub torrent_status: Option<serde_json::Value>,
    #[serde(default)]
    pub current_movie: Option<Movie>,
    #[serde(default)]
    pub streaming_available: bool,
}

// =============================================================================
// Playback Models
// =============================================================================

/// Which panel is visible; exactly one at any time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UiMode {
    #[default]
    Catalog,
    Playback,
}

impl fmt::Display for UiMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiMode::Catalog => f.write_str("Movies"),
            UiMode::Playback => f.write_str("Video"),
        }
    }
}

/// Enablement of the transfer control buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlButtons {
    pub pause: bool,
    pub resume: bool,
    pub stop: bool,
}

impl ControlButtons {
    pub fn is_enabled(&self, action: ControlAction) -> bool {
        match action {
            ControlAction::Pause => self.pause,
            ControlAction::Resume => self.resume,
            ControlAction::Stop => self.stop,
        }
    }
}

/// Local media element: what source is loaded and whether it is running
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaElement {
    /// Resolved stream URL, empty when nothing is loaded
    pub source: Option<String>,
    pub playing: bool,
}

impl MediaElement {
    pub fn has_source(&self) -> bool {
        self.source.as_deref().is_some_and(|s| !s.is_empty())
    }
}

/// Viewport size used to decide whether autoplay is attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Width in CSS-pixel equivalents
    pub width: u32,
    /// Widths at or below this are treated as mobile
    pub mobile_breakpoint: u32,
}

impl Viewport {
    pub const DEFAULT_BREAKPOINT: u32 = 768;
    pub const DEFAULT_CELL_WIDTH: u32 = 10;

    pub fn new(width: u32) -> Self {
        Self {
            width,
            mobile_breakpoint: Self::DEFAULT_BREAKPOINT,
        }
    }

    /// Viewport derived from a terminal width in cells
    pub fn from_terminal(columns: u16, cell_width_px: u32, mobile_breakpoint: u32) -> Self {
        Self {
            width: u32::from(columns).saturating_mul(cell_width_px),
            mobile_breakpoint,
        }
    }

    pub fn is_mobile(&self) -> bool {
        self.width <= self.mobile_breakpoint
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1280)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
