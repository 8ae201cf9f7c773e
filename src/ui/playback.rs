//! Playback panel
//!
//! Active movie details, transfer progress, control buttons and the state
//! of the local video player.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Gauge, Paragraph, Wrap},
};

use crate::controller::PlaybackSessionController;
use crate::models::{ControlAction, ControlButtons, MediaElement, TransferPhase, TransferStatus};
use crate::ui::Theme;

pub fn render(frame: &mut Frame, area: Rect, controller: &PlaybackSessionController) {
    let [info_area, progress_area, controls_area, video_area] = Layout::vertical([
        Constraint::Min(5),
        Constraint::Length(4),
        Constraint::Length(3),
        Constraint::Length(3),
    ])
    .areas(area);

    render_info(frame, info_area, controller);
    render_progress(frame, progress_area, controller.transfer());
    render_controls(frame, controls_area, controller.buttons());
    render_video(frame, video_area, controller.media());
}

fn panel(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(format!(" {} ", title), Theme::title()))
}

fn render_info(frame: &mut Frame, area: Rect, controller: &PlaybackSessionController) {
    let Some(movie) = controller.active_movie() else {
        let empty = Paragraph::new("No movie selected. Pick one from the Movies panel.")
            .style(Theme::dimmed())
            .alignment(Alignment::Center)
            .block(panel("NOW PLAYING"));
        frame.render_widget(empty, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(movie.title.clone(), Theme::accent())),
        Line::from(Span::styled(movie.subtitle_line(), Theme::secondary())),
        Line::default(),
    ];
    lines.extend(movie.detail_lines().into_iter().map(Line::from));
    lines.push(Line::default());
    lines.push(Line::from(Span::styled(
        movie.summary_or_placeholder().to_string(),
        Theme::dimmed(),
    )));

    let info = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(panel("NOW PLAYING"));
    frame.render_widget(info, area);
}

fn render_progress(frame: &mut Frame, area: Rect, transfer: Option<&TransferStatus>) {
    let block = panel("TRANSFER");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let [gauge_area, stats_area] =
        Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).areas(inner);

    let Some(status) = transfer else {
        frame.render_widget(
            Paragraph::new("Waiting for progress...").style(Theme::dimmed()),
            gauge_area,
        );
        return;
    };

    let gauge = Gauge::default()
        .gauge_style(Theme::progress_bar())
        .ratio(status.ratio())
        .label(status.format_progress());
    frame.render_widget(gauge, gauge_area);

    let stats = Line::from(vec![
        Span::styled(status.phase.to_string(), Theme::phase(&status.phase)),
        Span::styled("  ↓ ", Theme::dimmed()),
        Span::raw(status.format_rate()),
        Span::styled("  peers ", Theme::dimmed()),
        Span::raw(status.peers.to_string()),
    ]);
    frame.render_widget(Paragraph::new(stats), stats_area);
}

fn render_controls(frame: &mut Frame, area: Rect, buttons: ControlButtons) {
    let button = |action: ControlAction, label: &str, key: &str| {
        vec![
            Span::styled(
                format!(" {} [{}] ", label, key),
                Theme::button(buttons.is_enabled(action)),
            ),
            Span::raw("  "),
        ]
    };

    let mut spans = Vec::new();
    spans.extend(button(ControlAction::Pause, "Pause", "p"));
    spans.extend(button(ControlAction::Resume, "Resume", "u"));
    spans.extend(button(ControlAction::Stop, "Stop", "x"));

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(panel("CONTROLS")),
        area,
    );
}

fn render_video(frame: &mut Frame, area: Rect, media: &MediaElement) {
    let line = match media.source.as_deref().filter(|s| !s.is_empty()) {
        None => Line::from(Span::styled("No video loaded", Theme::dimmed())),
        Some(source) => {
            let (state, style) = if media.playing {
                ("playing", Theme::phase(&TransferPhase::Downloading))
            } else {
                ("ready - press Enter", Theme::accent())
            };
            Line::from(vec![
                Span::styled(state, style),
                Span::styled("  ", Theme::dimmed()),
                Span::raw(source.to_string()),
            ])
        }
    };
    frame.render_widget(Paragraph::new(line).block(panel("VIDEO")), area);
}
