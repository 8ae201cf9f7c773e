//! Background cache helper
//!
//! Optional: prepares the per-user cache directory on startup. The TUI writes
//! its log file there. Registration failure is logged and never fatal.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Registered cache directory
#[derive(Debug, Clone)]
pub struct CacheHelper {
    dir: PathBuf,
}

impl CacheHelper {
    /// Default location (~/.cache/torrentplayer)
    pub fn default_dir() -> Option<PathBuf> {
        dirs::cache_dir().map(|p| p.join("torrentplayer"))
    }

    /// Create the directory if needed
    pub fn register(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Could not create cache dir {}", dir.display()))?;
        Ok(Self { dir })
    }

    /// Register at the default location when enabled; logs the outcome
    pub fn register_default(enabled: bool) -> Option<Self> {
        if !enabled {
            return None;
        }
        let dir = Self::default_dir()?;
        match Self::register(&dir) {
            Ok(helper) => {
                info!("Cache helper registered: {}", helper.dir.display());
                Some(helper)
            }
            Err(e) => {
                warn!("Cache helper registration failed: {:#}", e);
                None
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Log file used in TUI mode
    pub fn log_path(&self) -> PathBuf {
        self.dir.join("torrentplayer.log")
    }
}
