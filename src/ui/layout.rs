//! Layout components (content area, status bar)

use crate::services::{Notice, NoticeLevel};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Keyboard hints shown on the right of the status bar
pub const HINTS: &str = "Tab:next  Ctrl+S:save  Ctrl+A:add  Ctrl+D:remove  Ctrl+E:enhance  Esc:quit";

/// Split the screen into content and a one-line status bar
pub fn create_layout(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);
    (chunks[0], chunks[1])
}

fn notice_style(level: NoticeLevel) -> Style {
    match level {
        NoticeLevel::Info => Style::default().bg(Color::DarkGray).fg(Color::White),
        NoticeLevel::Success => Style::default().bg(Color::DarkGray).fg(Color::Green),
        NoticeLevel::Error => Style::default().bg(Color::DarkGray).fg(Color::Red),
    }
}

/// Draw the status bar: file prompt or latest notice, then key hints
pub fn draw_status_bar(
    frame: &mut Frame,
    area: Rect,
    notice: Option<&Notice>,
    prompt: Option<&str>,
) {
    let mut spans = vec![Span::raw(" ")];

    if let Some(path) = prompt {
        spans.push(Span::styled(
            format!("File: {path}▌"),
            Style::default().bg(Color::DarkGray).fg(Color::Cyan),
        ));
    } else if let Some(notice) = notice {
        spans.push(Span::styled(notice.message.clone(), notice_style(notice.level)));
    }

    let status = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status, area);

    let hints = format!(" {HINTS} ");
    let width = (hints.chars().count() as u16).min(area.width);
    let hint_area = Rect {
        x: area.right().saturating_sub(width),
        y: area.y,
        width,
        height: 1,
    };
    let hint_widget =
        Paragraph::new(hints).style(Style::default().bg(Color::DarkGray).fg(Color::Gray));
    frame.render_widget(hint_widget, hint_area);
}
