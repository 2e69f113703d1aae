//! UI module for rendering the TUI

pub mod field_renderer;
mod layout;
mod section;

use crate::engine::SectionView;
use crate::services::Notice;
use crate::state::FieldPath;
use ratatui::Frame;

/// Everything the frontend draws in one frame
pub struct Screen<'a> {
    pub view: &'a SectionView,
    pub focus: Option<&'a FieldPath>,
    pub notice: Option<&'a Notice>,
    /// Path being typed for the focused file field
    pub file_prompt: Option<&'a str>,
}

/// Main draw function
pub fn draw(frame: &mut Frame, screen: &Screen) {
    let (content, status) = layout::create_layout(frame.area());
    section::draw_section(frame, content, screen.view, screen.focus);
    layout::draw_status_bar(frame, status, screen.notice, screen.file_prompt);
}
