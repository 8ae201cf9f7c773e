//! Transient notifications (toasts)
//!
//! Every user-visible outcome goes through here. Entries expire on their own
//! after [`TOAST_TTL`]; pruning is idempotent so a torn-down view never leaves
//! anything behind.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Lifetime of a notification
pub const TOAST_TTL: Duration = Duration::from_secs(5);

/// Severity of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => f.write_str("info"),
            Level::Success => f.write_str("success"),
            Level::Warning => f.write_str("warning"),
            Level::Error => f.write_str("error"),
        }
    }
}

/// A single notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: Level,
    pub message: String,
    pub created: Instant,
}

impl Toast {
    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.created) >= TOAST_TTL
    }
}

/// Notification queue, oldest first
#[derive(Debug, Default)]
pub struct Notifications {
    toasts: VecDeque<Toast>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notification created now
    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.push_at(level, message, Instant::now());
    }

    /// Push a notification with an explicit creation time
    pub fn push_at(&mut self, level: Level, message: impl Into<String>, created: Instant) {
        let message = message.into();
        tracing::debug!(%level, %message, "notification");
        self.toasts.push_back(Toast {
            level,
            message,
            created,
        });
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Level::Warning, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Drop every notification older than [`TOAST_TTL`]
    pub fn prune(&mut self, now: Instant) {
        self.toasts.retain(|t| !t.is_expired(now));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.back()
    }

    /// Number of notifications at the given level
    pub fn count(&self, level: Level) -> usize {
        self.toasts.iter().filter(|t| t.level == level).count()
    }
}
