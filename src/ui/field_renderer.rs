//! Field rendering for schema-driven forms

use crate::engine::{Choice, Control, EnhanceButton, FieldView, FileDisplay, GroupView};
use crate::state::FieldPath;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Rows taken by a single-line bordered field
const LINE_FIELD_HEIGHT: u16 = 3;
/// Rows taken by a textarea
const TEXTAREA_HEIGHT: u16 = 6;

/// Height a field needs when drawn
pub fn field_height(field: &FieldView) -> u16 {
    match &field.control {
        Control::Textarea { .. } => TEXTAREA_HEIGHT,
        Control::Repeater { groups, .. } => {
            let groups = groups
                .iter()
                .map(group_height)
                .fold(0u16, u16::saturating_add);
            // borders plus the add/remove hint line
            groups.saturating_add(3)
        }
        _ => LINE_FIELD_HEIGHT,
    }
}

/// Height of one repeater group including its border
fn group_height(group: &GroupView) -> u16 {
    group
        .fields
        .iter()
        .map(field_height)
        .fold(2u16, u16::saturating_add)
}

/// Draw a field; `focus` is the path that currently has keyboard focus
pub fn draw_field(frame: &mut Frame, area: Rect, field: &FieldView, focus: Option<&FieldPath>) {
    let is_active = focus == Some(&field.path);

    if let Control::Repeater { groups, can_add } = &field.control {
        draw_repeater(frame, area, field, groups, *can_add, focus);
        return;
    }

    let border_style = if is_active {
        Style::default().fg(Color::Cyan)
    } else if field.error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let content = match &field.control {
        Control::Text { value, .. } | Control::Date { value } => {
            Paragraph::new(text_line(value, is_active, field.read_only))
        }
        Control::Textarea { value, enhance, .. } => {
            let mut lines: Vec<Line> = value.lines().map(|l| Line::from(l.to_string())).collect();
            if is_active {
                let cursor = Span::styled("▌", Style::default().fg(Color::Cyan));
                match lines.last_mut() {
                    Some(last) => last.spans.push(cursor),
                    None => lines.push(Line::from(cursor)),
                }
            } else if lines.is_empty() {
                lines.push(Line::from(Span::styled(
                    "(empty)",
                    Style::default().fg(Color::DarkGray),
                )));
            }
            if let Some(button) = enhance {
                lines.push(enhance_line(button));
            }
            Paragraph::new(lines)
        }
        Control::Radio { options } | Control::Dropdown { options, .. } => {
            Paragraph::new(choice_line(options, "(•)", "( )"))
        }
        Control::MultiSelect { options } => Paragraph::new(choice_line(options, "[x]", "[ ]")),
        Control::File { accept, current } => Paragraph::new(file_line(accept, current)),
        Control::Repeater { .. } => return,
    };

    frame.render_widget(
        content.wrap(Wrap { trim: false }).block(field_block(field, border_style)),
        area,
    );
}

fn field_block(field: &FieldView, border_style: Style) -> Block<'static> {
    let marker = if field.required { " *" } else { "" };
    let lock = if field.read_only { " (locked)" } else { "" };
    let mut block = Block::default()
        .title(format!(" {}{marker}{lock} ", field.label))
        .borders(Borders::ALL)
        .border_style(border_style);
    if let Some(error) = field.error {
        block = block.title_bottom(Line::from(Span::styled(
            format!(" {error} "),
            Style::default().fg(Color::Red),
        )));
    }
    block
}

fn text_line(value: &str, is_active: bool, read_only: bool) -> Line<'static> {
    let style = if read_only {
        Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC)
    } else if is_active {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let display = if value.is_empty() && !is_active {
        "(empty)".to_string()
    } else {
        value.to_string()
    };
    let cursor = if is_active && !read_only { "▌" } else { "" };
    Line::from(vec![
        Span::styled(display, style),
        Span::styled(cursor, Style::default().fg(Color::Cyan)),
    ])
}

fn choice_line(options: &[Choice], on: &str, off: &str) -> Line<'static> {
    let mut spans = Vec::with_capacity(options.len() * 2);
    for choice in options {
        let style = if choice.selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mark = if choice.selected { on } else { off };
        spans.push(Span::styled(format!("{mark} {}", choice.label), style));
        spans.push(Span::raw("  "));
    }
    Line::from(spans)
}

fn file_line(accept: &[String], current: &FileDisplay) -> Line<'static> {
    let hint = if accept.is_empty() {
        String::new()
    } else {
        format!("  [{}]", accept.join(", "))
    };
    let (label, style) = match current {
        FileDisplay::Empty => ("(no file)".to_string(), Style::default().fg(Color::DarkGray)),
        FileDisplay::New { name, preview_url } => (
            match preview_url {
                Some(url) => format!("{name} (new, {url})"),
                None => format!("{name} (new)"),
            },
            Style::default().fg(Color::Green),
        ),
        FileDisplay::Existing { name, url } => {
            (format!("{name} <{url}>"), Style::default().fg(Color::Blue))
        }
    };
    Line::from(vec![
        Span::styled(label, style),
        Span::styled(hint, Style::default().fg(Color::DarkGray)),
    ])
}

fn enhance_line(button: &EnhanceButton) -> Line<'static> {
    let (text, style) = if button.in_flight {
        ("✦ Enhancing…", Style::default().fg(Color::Yellow))
    } else if button.enabled {
        ("✦ Enhance (Ctrl+E)", Style::default().fg(Color::Magenta))
    } else {
        ("✦ Enhance", Style::default().fg(Color::DarkGray))
    };
    Line::from(Span::styled(text, style))
}

fn draw_repeater(
    frame: &mut Frame,
    area: Rect,
    field: &FieldView,
    groups: &[GroupView],
    can_add: bool,
    focus: Option<&FieldPath>,
) {
    let in_repeater = focus.is_some_and(|path| path.question == field.path.question);
    let border_style = if in_repeater {
        Style::default().fg(Color::Cyan)
    } else if field.error.is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let block = field_block(field, border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut constraints: Vec<Constraint> = groups
        .iter()
        .map(|g| Constraint::Length(group_height(g)))
        .collect();
    constraints.push(Constraint::Length(1));
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    for (group, chunk) in groups.iter().zip(chunks.iter()) {
        let title = if group.can_remove {
            format!(" #{} (Ctrl+D removes) ", group.index + 1)
        } else {
            format!(" #{} ", group.index + 1)
        };
        let group_block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray));
        let group_inner = group_block.inner(*chunk);
        frame.render_widget(group_block, *chunk);

        let field_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints(
                group
                    .fields
                    .iter()
                    .map(|f| Constraint::Length(field_height(f))),
            )
            .split(group_inner);
        for (nested, nested_area) in group.fields.iter().zip(field_chunks.iter()) {
            draw_field(frame, *nested_area, nested, focus);
        }
    }

    let hint = if can_add {
        Span::styled("+ Add (Ctrl+A)", Style::default().fg(Color::Green))
    } else if groups.is_empty() {
        Span::styled("(no entries)", Style::default().fg(Color::DarkGray))
    } else {
        Span::raw("")
    };
    if let Some(last) = chunks.last() {
        frame.render_widget(Paragraph::new(Line::from(hint)), *last);
    }
}
