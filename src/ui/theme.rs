//! Theme for torrentplayer
//!
//! Color palette and style helpers for the TUI: a dark cinema palette with
//! a green accent for live transfers.

use ratatui::style::{Color, Modifier, Style};

use crate::models::TransferPhase;
use crate::notify::Level;

/// Color palette
pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    // CORE PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    /// Background: #14161c (projection-room black)
    pub const BACKGROUND: Color = Color::Rgb(0x14, 0x16, 0x1c);

    /// Primary: #6ac045 (catalog green)
    pub const PRIMARY: Color = Color::Rgb(0x6a, 0xc0, 0x45);

    /// Secondary: #5aa9e6 (sky blue)
    pub const SECONDARY: Color = Color::Rgb(0x5a, 0xa9, 0xe6);

    /// Accent: #f5c518 (marquee gold)
    pub const ACCENT: Color = Color::Rgb(0xf5, 0xc5, 0x18);

    /// Text: #e6e6e6
    pub const TEXT: Color = Color::Rgb(0xe6, 0xe6, 0xe6);

    /// Dim: #6b7080
    pub const DIM: Color = Color::Rgb(0x6b, 0x70, 0x80);

    /// Success: #4caf50
    pub const SUCCESS: Color = Color::Rgb(0x4c, 0xaf, 0x50);

    /// Warning: #ff9800
    pub const WARNING: Color = Color::Rgb(0xff, 0x98, 0x00);

    /// Error: #f44336
    pub const ERROR: Color = Color::Rgb(0xf4, 0x43, 0x36);

    /// Info: #2196f3
    pub const INFO: Color = Color::Rgb(0x21, 0x96, 0xf3);

    /// Panels and the status bar
    pub const BACKGROUND_LIGHT: Color = Color::Rgb(0x1f, 0x22, 0x2b);

    pub const BORDER: Color = Color::Rgb(0x3a, 0x3f, 0x4d);

    pub const BORDER_FOCUSED: Color = Self::PRIMARY;

    // ═══════════════════════════════════════════════════════════════════════
    // STYLE HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    pub fn text() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND)
    }

    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn secondary() -> Style {
        Style::default().fg(Self::SECONDARY)
    }

    pub fn accent() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default()
            .fg(Self::BORDER_FOCUSED)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected catalog row
    pub fn list_item_selected() -> Style {
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn input() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND_LIGHT)
    }

    pub fn input_cursor() -> Style {
        Style::default().fg(Self::BACKGROUND).bg(Self::PRIMARY)
    }

    pub fn keybind() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    pub fn keybind_desc() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND_LIGHT)
    }

    pub fn year() -> Style {
        Style::default().fg(Self::SECONDARY)
    }

    pub fn genre() -> Style {
        Style::default().fg(Self::DIM)
    }

    /// Rating color: green for well rated, fading toward red
    pub fn rating(rating: Option<f32>) -> Style {
        let color = match rating {
            Some(r) if r >= 7.5 => Self::SUCCESS,
            Some(r) if r >= 6.0 => Self::WARNING,
            Some(r) if r > 0.0 => Self::ERROR,
            _ => Self::DIM,
        };
        Style::default().fg(color)
    }

    /// Transfer progress gauge
    pub fn progress_bar() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .bg(Self::BACKGROUND_LIGHT)
    }

    /// Phase label in the playback panel
    pub fn phase(phase: &TransferPhase) -> Style {
        let color = match phase {
            TransferPhase::Downloading => Self::SUCCESS,
            TransferPhase::Paused => Self::WARNING,
            TransferPhase::Other(_) => Self::SECONDARY,
        };
        Style::default().fg(color).add_modifier(Modifier::BOLD)
    }

    /// Control button, enabled or greyed out
    pub fn button(enabled: bool) -> Style {
        if enabled {
            Style::default()
                .fg(Self::BACKGROUND)
                .bg(Self::ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Self::DIM).bg(Self::BACKGROUND_LIGHT)
        }
    }

    /// Toast color per notification level
    pub fn toast(level: Level) -> Style {
        let color = match level {
            Level::Info => Self::INFO,
            Level::Success => Self::SUCCESS,
            Level::Warning => Self::WARNING,
            Level::Error => Self::ERROR,
        };
        Style::default()
            .fg(Self::BACKGROUND)
            .bg(color)
            .add_modifier(Modifier::BOLD)
    }

    /// Online / offline indicator
    pub fn connectivity(online: bool) -> Style {
        Style::default().fg(if online { Self::SUCCESS } else { Self::ERROR })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// COLOR UTILITIES
// ═══════════════════════════════════════════════════════════════════════════

/// Relative luminance of an sRGB color (WCAG 2.0 definition)
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    fn channel(c: u8) -> f64 {
        let c = c as f64 / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }

    0.2126 * channel(r) + 0.7152 * channel(g) + 0.0722 * channel(b)
}

/// Contrast ratio between two colors, from 1 (same) to 21 (black on white)
pub fn contrast_ratio(fg: (u8, u8, u8), bg: (u8, u8, u8)) -> f64 {
    let l1 = relative_luminance(fg.0, fg.1, fg.2);
    let l2 = relative_luminance(bg.0, bg.1, bg.2);
    let (lighter, darker) = if l1 > l2 { (l1, l2) } else { (l2, l1) };
    (lighter + 0.05) / (darker + 0.05)
}

/// RGB tuple of a ratatui color (only the Rgb variant)
pub fn color_to_rgb(color: Color) -> Option<(u8, u8, u8)> {
    match color {
        Color::Rgb(r, g, b) => Some((r, g, b)),
        _ => None,
    }
}
