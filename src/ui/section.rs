//! Section page: header, field rows and submit state

use super::field_renderer::{draw_field, field_height};
use crate::engine::{Row, SectionView};
use crate::state::FieldPath;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

fn row_height(row: &Row) -> u16 {
    row.fields().into_iter().map(field_height).max().unwrap_or(0)
}

fn row_contains(row: &Row, path: &FieldPath) -> bool {
    row.fields()
        .into_iter()
        .any(|field| field.path.question == path.question)
}

/// First row to draw so that the focused row is visible in `height` rows
pub fn first_visible_row(rows: &[Row], focus: Option<&FieldPath>, height: u16) -> usize {
    let Some(focused) = focus.and_then(|path| rows.iter().position(|r| row_contains(r, path)))
    else {
        return 0;
    };
    let mut start = focused;
    let mut used = row_height(&rows[focused]);
    while start > 0 {
        let above = row_height(&rows[start - 1]);
        if used.saturating_add(above) > height {
            break;
        }
        used += above;
        start -= 1;
    }
    start
}

/// Draw the section page
pub fn draw_section(frame: &mut Frame, area: Rect, view: &SectionView, focus: Option<&FieldPath>) {
    let title_style = if view.loading {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let title = if view.loading {
        format!(" {} (saving…) ", view.label)
    } else {
        format!(" {} ", view.label)
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(title_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let header_height = u16::from(view.description.is_some()) + u16::from(view.submit_error.is_some());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(header_height), Constraint::Min(0)])
        .split(inner);

    let mut header = Vec::new();
    if let Some(description) = &view.description {
        header.push(Line::from(Span::styled(
            description.clone(),
            Style::default().fg(Color::Gray),
        )));
    }
    if let Some(error) = &view.submit_error {
        header.push(Line::from(Span::styled(
            error.clone(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )));
    }
    frame.render_widget(Paragraph::new(header).wrap(Wrap { trim: true }), chunks[0]);

    let body = chunks[1];
    let start = first_visible_row(&view.rows, focus, body.height);
    let mut y = body.y;
    for row in &view.rows[start..] {
        let height = row_height(row);
        let remaining = body.bottom().saturating_sub(y);
        if remaining == 0 {
            break;
        }
        let row_area = Rect {
            x: body.x,
            y,
            width: body.width,
            height: height.min(remaining),
        };
        draw_row(frame, row_area, row, focus);
        y += row_area.height;
    }
}

fn draw_row(frame: &mut Frame, area: Rect, row: &Row, focus: Option<&FieldPath>) {
    match row {
        Row::Single(field) => draw_field(frame, area, field, focus),
        Row::Pair(left, right) => {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
                .split(area);
            draw_field(frame, columns[0], left, focus);
            draw_field(frame, columns[1], right, focus);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::render_section;
    use crate::test_support::session;
    use pretty_assertions::assert_eq;
    use ratatui::{backend::TestBackend, Terminal};

    #[test]
    fn test_first_row_without_focus() {
        let view = render_section(&session());
        assert_eq!(first_visible_row(&view.rows, None, 10), 0);
    }

    #[test]
    fn test_scrolls_to_focused_row() {
        let view = render_section(&session());
        let focus = FieldPath::question("availableFrom");
        let start = first_visible_row(&view.rows, Some(&focus), 6);
        // two 3-row fields fit: resume and availableFrom
        let ids: Vec<&str> = view.rows[start]
            .fields()
            .into_iter()
            .map(|f| f.path.question.as_str())
            .collect();
        assert_eq!(ids, vec!["resume"]);
    }

    #[test]
    fn test_pair_row_is_drawn_side_by_side() {
        let view = render_section(&session());
        let mut terminal = Terminal::new(TestBackend::new(80, 12)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                draw_section(frame, area, &view, None)
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        let line: String = (0..80u16)
            .map(|x| buffer[(x, 2u16)].symbol().to_string())
            .collect();
        assert!(line.contains("First name"));
        assert!(line.contains("Last name"));
    }
}
