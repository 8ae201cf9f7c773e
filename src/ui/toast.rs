//! Toast stack, drawn over the top-right corner of the body

use ratatui::{
    prelude::*,
    widgets::{Clear, Paragraph},
};

use crate::notify::Notifications;
use crate::ui::Theme;

/// Most toasts visible at once; newest at the bottom
const MAX_VISIBLE: usize = 3;
const TOAST_WIDTH: u16 = 44;

pub fn render(frame: &mut Frame, area: Rect, notifications: &Notifications) {
    if notifications.is_empty() || area.width < 10 {
        return;
    }
    let width = TOAST_WIDTH.min(area.width);
    let skip = notifications.len().saturating_sub(MAX_VISIBLE);

    for (row, toast) in notifications.iter().skip(skip).enumerate() {
        let y = area.y + row as u16;
        if y >= area.bottom() {
            break;
        }
        let rect = Rect::new(area.right() - width, y, width, 1);
        frame.render_widget(Clear, rect);
        frame.render_widget(
            Paragraph::new(format!(" {} ", toast.message)).style(Theme::toast(toast.level)),
            rect,
        );
    }
}
