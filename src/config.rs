//! Configuration management for torrentplayer
//!
//! Handles config file loading and environment overrides.
//! Config is stored at ~/.config/torrentplayer/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{Quality, Viewport};
use crate::stream::PlayerType;

/// Server used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:5000";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the torrent player server
    pub server_url: String,
    /// Quality filter for catalog and play requests
    pub quality: Quality,
    /// Local video player
    pub player: PlayerType,
    /// Viewport widths at or below this are treated as mobile (no autoplay)
    pub mobile_breakpoint: u32,
    /// Pixel width assumed per terminal cell. At 10 px an 80-column terminal
    /// is 800 px wide and autoplays; narrow splits under 77 columns do not.
    pub cell_width_px: u32,
    /// Register the background cache directory on startup
    pub cache_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            quality: Quality::default(),
            player: PlayerType::default(),
            mobile_breakpoint: Viewport::DEFAULT_BREAKPOINT,
            cell_width_px: Viewport::DEFAULT_CELL_WIDTH,
            cache_enabled: true,
        }
    }
}

impl Config {
    /// Get config file path (~/.config/torrentplayer/config.toml)
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("torrentplayer").join("config.toml"))
    }

    /// Load config from the default path, or return default if not found.
    /// Environment overrides are applied either way.
    pub fn load() -> Self {
        let mut config = Self::path()
            .and_then(|p| Self::load_from(&p).ok())
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load config from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read config {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
    }

    /// Apply TORRENTPLAYER_SERVER / TORRENTPLAYER_QUALITY
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("TORRENTPLAYER_SERVER") {
            if !url.trim().is_empty() {
                self.server_url = url;
            }
        }
        if let Ok(q) = std::env::var("TORRENTPLAYER_QUALITY") {
            match Quality::from_str_loose(&q) {
                Some(quality) => self.quality = quality,
                None => tracing::warn!("ignoring unknown TORRENTPLAYER_QUALITY {:?}", q),
            }
        }
    }

    /// Viewport for a terminal of the given width
    pub fn viewport(&self, columns: u16) -> Viewport {
        Viewport::from_terminal(columns, self.cell_width_px, self.mobile_breakpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.quality, Quality::HD720p);
        assert_eq!(config.mobile_breakpoint, 768);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            server_url = "http://media.lan:5000"
            quality = "1080p"
            player = "mpv"
            "#,
        )
        .unwrap();
        assert_eq!(config.server_url, "http://media.lan:5000");
        assert_eq!(config.quality, Quality::FHD1080p);
        assert_eq!(config.player, PlayerType::Mpv);
        assert_eq!(config.cell_width_px, 10);
        assert!(config.cache_enabled);
    }

    #[test]
    fn test_viewport_from_columns() {
        let config = Config::default();
        assert!(config.viewport(76).is_mobile());
        assert!(!config.viewport(80).is_mobile());
        assert!(!config.viewport(160).is_mobile());
    }
}
