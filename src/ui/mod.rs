//! Terminal UI components
//!
//! Built with ratatui. One screen: a header with the panel tabs, the
//! visible panel (catalog or playback), a footer with key hints, and the
//! toast stack drawn on top.

pub mod catalog;
pub mod playback;
pub mod theme;
pub mod toast;

pub use theme::Theme;

use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph},
};

use crate::app::{App, InputMode};
use crate::controller::PlaybackSessionController;
use crate::models::UiMode;

/// Draw the whole screen
pub fn render(frame: &mut Frame, app: &mut App, controller: &PlaybackSessionController) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Theme::text()), area);

    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header, controller);
    match controller.mode() {
        UiMode::Catalog => catalog::render(frame, body, app, controller),
        UiMode::Playback => playback::render(frame, body, controller),
    }
    render_footer(frame, footer, app, controller);
    toast::render(frame, body, controller.notifications());
}

fn render_header(frame: &mut Frame, area: Rect, controller: &PlaybackSessionController) {
    let tab = |mode: UiMode| {
        let style = if controller.mode() == mode {
            Theme::accent()
        } else {
            Theme::dimmed()
        };
        Span::styled(format!(" {} ", mode), style)
    };
    let label = if controller.is_online() {
        "online"
    } else {
        "offline"
    };

    let line = Line::from(vec![
        Span::styled(" torrentplayer ", Theme::title()),
        tab(UiMode::Catalog),
        Span::styled("|", Theme::dimmed()),
        tab(UiMode::Playback),
        Span::raw("  "),
        Span::styled(format!("[{}]", controller.quality()), Theme::secondary()),
        Span::raw("  "),
        Span::styled("●", Theme::connectivity(controller.is_online())),
        Span::styled(format!(" {}  ", label), Theme::dimmed()),
        Span::styled(controller.session().to_string(), Theme::dimmed()),
    ]);
    frame.render_widget(Paragraph::new(line).style(Theme::status_bar()), area);
}

fn render_footer(
    frame: &mut Frame,
    area: Rect,
    app: &App,
    controller: &PlaybackSessionController,
) {
    if !app.show_help {
        return;
    }
    let hints: &[(&str, &str)] = match (app.input_mode, controller.mode()) {
        (InputMode::Editing, _) => &[("Enter", "search"), ("Esc", "cancel")],
        (_, UiMode::Catalog) => &[
            ("/", "search"),
            ("↑↓", "select"),
            ("Enter", "play"),
            ("m", "load more"),
            ("Q", "quality"),
            ("Tab", "video"),
            ("q", "quit"),
        ],
        (_, UiMode::Playback) => &[
            ("Space", "pause/resume"),
            ("x", "stop"),
            ("Enter", "start video"),
            ("r", "refresh"),
            ("Esc", "movies"),
            ("q", "quit"),
        ],
    };

    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, desc) in hints {
        spans.push(Span::styled(format!(" {}", key), Theme::keybind()));
        spans.push(Span::styled(format!(" {} ", desc), Theme::keybind_desc()));
    }
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Theme::status_bar()),
        area,
    );
}
