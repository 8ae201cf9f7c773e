//! Local video player
//!
//! The media element's output: a VLC or mpv process playing the stream URL
//! the server reported in `video_ready`. Players run in their own session so
//! terminal signals aimed at the TUI never reach them.

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::{Child, Command};

/// Player used for `video_ready` streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerType {
    #[default]
    Vlc,
    Mpv,
}

impl PlayerType {
    /// Executable name looked up on PATH
    fn binary(&self) -> &'static str {
        match self {
            PlayerType::Vlc => "vlc",
            PlayerType::Mpv => "mpv",
        }
    }

    /// App-bundle installs that are not on PATH
    fn bundled(&self) -> &'static [&'static str] {
        match self {
            PlayerType::Vlc => &["/Applications/VLC.app/Contents/MacOS/VLC"],
            PlayerType::Mpv => &["/Applications/mpv.app/Contents/MacOS/mpv"],
        }
    }

    /// Flags after the URL: start immediately, exit when the stream ends
    fn stream_args(&self) -> &'static [&'static str] {
        match self {
            PlayerType::Vlc => &["--no-video-title-show", "--play-and-exit"],
            PlayerType::Mpv => &["--force-window=immediate", "--cache=yes"],
        }
    }

    /// Resolve the executable, bundles first
    pub fn locate(&self) -> Option<PathBuf> {
        self.bundled()
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file())
            .or_else(|| find_on_path(self.binary(), std::env::var_os("PATH")?))
    }
}

impl fmt::Display for PlayerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayerType::Vlc => f.write_str("VLC"),
            PlayerType::Mpv => f.write_str("mpv"),
        }
    }
}

fn find_on_path(binary: &str, path: OsString) -> Option<PathBuf> {
    std::env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("{0} is not installed")]
    NotInstalled(PlayerType),
    #[error("Could not run player: {0}")]
    Io(#[from] std::io::Error),
}

/// Launches the configured player for a stream URL
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalPlayer {
    player_type: PlayerType,
}

impl LocalPlayer {
    pub fn new(player_type: PlayerType) -> Self {
        Self { player_type }
    }

    pub fn player_type(&self) -> PlayerType {
        self.player_type
    }

    pub fn is_available(&self) -> bool {
        self.player_type.locate().is_some()
    }

    /// Spawn the player on `stream_url`; the child is killed when dropped
    pub fn play(&self, stream_url: &str) -> Result<Child, PlayerError> {
        let program = self
            .player_type
            .locate()
            .ok_or(PlayerError::NotInstalled(self.player_type))?;

        let mut cmd = Command::new(program);
        cmd.arg(stream_url)
            .args(self.player_type.stream_args())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        #[cfg(unix)]
        {
            // SAFETY: setsid is async-signal-safe and touches no parent state
            unsafe {
                cmd.pre_exec(|| {
                    if libc::setsid() == -1 {
                        return Err(std::io::Error::last_os_error());
                    }
                    Ok(())
                });
            }
        }

        Ok(cmd.spawn()?)
    }

    /// Play and block until the player window is closed
    pub async fn play_and_wait(&self, stream_url: &str) -> Result<(), PlayerError> {
        let mut child = self.play(stream_url)?;
        child.wait().await?;
        Ok(())
    }
}
