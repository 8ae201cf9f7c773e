//! Catalog panel
//!
//! Search box on top, the accumulated result list below, and a detail pane
//! for the selected movie when the terminal is wide enough.

use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap},
};

use crate::app::{App, InputMode};
use crate::controller::PlaybackSessionController;
use crate::models::Movie;
use crate::ui::Theme;

/// Detail pane only shows at or above this width
const DETAIL_MIN_WIDTH: u16 = 100;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    app: &mut App,
    controller: &PlaybackSessionController,
) {
    let [search_area, list_area] =
        Layout::vertical([Constraint::Length(3), Constraint::Min(3)]).areas(area);
    render_search(frame, search_area, app);

    if list_area.width >= DETAIL_MIN_WIDTH {
        let [list_area, detail_area] =
            Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
                .areas(list_area);
        render_list(frame, list_area, app, controller);
        let selected = controller.results().get(app.list.selected);
        render_detail(frame, detail_area, selected);
    } else {
        render_list(frame, list_area, app, controller);
    }
}

fn render_search(frame: &mut Frame, area: Rect, app: &App) {
    let editing = app.input_mode == InputMode::Editing;
    let border_style = if editing {
        Theme::border_focused()
    } else {
        Theme::border()
    };

    let mut spans = Vec::new();
    if app.search.query.is_empty() && !editing {
        spans.push(Span::styled("Search movies...", Theme::dimmed()));
    } else {
        let chars: Vec<char> = app.search.query.chars().collect();
        let cursor = app.search.cursor.min(chars.len());
        let before: String = chars[..cursor].iter().collect();
        spans.push(Span::styled(before, Theme::input()));
        if editing {
            let at = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
            spans.push(Span::styled(at, Theme::input_cursor()));
            let after: String = chars.iter().skip(cursor + 1).collect();
            spans.push(Span::styled(after, Theme::input()));
        } else {
            let after: String = chars[cursor..].iter().collect();
            spans.push(Span::styled(after, Theme::input()));
        }
    }

    let input = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border_style)
            .title(Span::styled(" SEARCH ", Theme::title())),
    );
    frame.render_widget(input, area);
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    app: &mut App,
    controller: &PlaybackSessionController,
) {
    let movies = controller.results();
    let title = if controller.is_loading() {
        " MOVIES (loading...) ".to_string()
    } else if movies.is_empty() {
        " MOVIES ".to_string()
    } else {
        format!(" MOVIES ({}/{}) ", app.list.selected + 1, movies.len())
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border_focused())
        .title(Span::styled(title, Theme::title()));

    if movies.is_empty() {
        let text = if controller.is_loading() {
            "Loading movies..."
        } else {
            "No movies found"
        };
        let empty = Paragraph::new(text)
            .style(Theme::dimmed())
            .alignment(Alignment::Center)
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // One row is reserved for the load-more hint
    let visible = area.height.saturating_sub(3) as usize;
    app.list.scroll_into_view(visible);

    let mut items: Vec<ListItem> = movies
        .iter()
        .enumerate()
        .skip(app.list.offset)
        .take(visible)
        .map(|(i, movie)| movie_item(movie, i == app.list.selected))
        .collect();
    items.push(ListItem::new(Line::from(vec![
        Span::styled("  [m] ", Theme::keybind()),
        Span::styled(
            format!("Load more (page {})", controller.page() + 1),
            Theme::dimmed(),
        ),
    ])));

    frame.render_widget(List::new(items).block(block), area);
}

/// `▸ Inception (2010) ★ 8.8  Action, Sci-Fi`
fn movie_item(movie: &Movie, selected: bool) -> ListItem<'static> {
    let marker = if selected { "▸ " } else { "  " };
    let year = movie.year.map(|y| format!(" ({})", y)).unwrap_or_default();
    let title_style = if selected {
        Theme::list_item_selected()
    } else {
        Theme::text()
    };

    ListItem::new(Line::from(vec![
        Span::styled(marker, Theme::accent()),
        Span::styled(movie.title.clone(), title_style),
        Span::styled(year, Theme::year()),
        Span::raw(" "),
        Span::styled(
            format!("★ {}", movie.rating_label()),
            Theme::rating(movie.rating),
        ),
        Span::raw("  "),
        Span::styled(movie.card_genres().join(", "), Theme::genre()),
    ]))
}

fn render_detail(frame: &mut Frame, area: Rect, movie: Option<&Movie>) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Theme::border())
        .title(Span::styled(" DETAILS ", Theme::title()));

    let Some(movie) = movie else {
        frame.render_widget(block, area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(movie.title.clone(), Theme::accent())),
        Line::from(Span::styled(movie.subtitle_line(), Theme::secondary())),
        Line::default(),
    ];
    lines.extend(
        movie
            .detail_lines()
            .into_iter()
            .map(|l| Line::from(Span::styled(l, Theme::dimmed()))),
    );
    if let Some(poster) = movie.poster() {
        lines.push(Line::from(Span::styled(format!("Poster: {}", poster), Theme::dimmed())));
    }
    lines.push(Line::default());
    lines.push(Line::from(movie.summary_or_placeholder().to_string()));

    let detail = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(block);
    frame.render_widget(detail, area);
}
