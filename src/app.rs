//! Application state and core logic

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use url::Url;

use dossier::engine::{
    render_section, Control, EnhanceOutcome, EnhanceTicket, SectionView, SubmitError,
    SubmitOutcome, SubmitTicket,
};
use dossier::error::ServiceError;
use dossier::services::{Notice, NoticeLevel, Notifier, SectionStore, TextRewriter};
use dossier::state::{FieldPath, FileHandle, FormSession, DROPDOWN_NONE};
use dossier::ui::Screen;

/// Result of a background call, fed back into the session
pub enum Completion {
    Saved(SubmitTicket, Result<(), ServiceError>),
    Enhanced(EnhanceTicket, Result<String, ServiceError>),
}

/// Notifier that queues notices for the status bar
pub struct ChannelNotifier {
    tx: UnboundedSender<Notice>,
}

impl Notifier for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        // the receiver lives as long as the app
        let _ = self.tx.send(notice);
    }
}

/// Main application struct
pub struct App {
    session: FormSession,
    store: Arc<dyn SectionStore>,
    rewriter: Arc<dyn TextRewriter>,
    notifier: ChannelNotifier,
    notices: UnboundedReceiver<Notice>,
    completions_tx: UnboundedSender<Completion>,
    completions: UnboundedReceiver<Completion>,
    /// Index into the section's focus order
    focus: usize,
    /// Latest notice shown in the status bar
    pub notice: Option<Notice>,
    /// Path typed for the focused file field
    file_prompt: Option<String>,
    quit: bool,
}

impl App {
    pub fn new(
        session: FormSession,
        store: Arc<dyn SectionStore>,
        rewriter: Arc<dyn TextRewriter>,
    ) -> Self {
        let (notice_tx, notices) = mpsc::unbounded_channel();
        let (completions_tx, completions) = mpsc::unbounded_channel();
        Self {
            session,
            store,
            rewriter,
            notifier: ChannelNotifier { tx: notice_tx },
            notices,
            completions_tx,
            completions,
            focus: 0,
            notice: None,
            file_prompt: None,
            quit: false,
        }
    }

    /// Check if app should quit
    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn session(&self) -> &FormSession {
        &self.session
    }

    /// Current view model of the section
    pub fn view(&self) -> SectionView {
        render_section(&self.session)
    }

    /// Path that currently has keyboard focus
    pub fn focused(&self) -> Option<FieldPath> {
        self.view().focus_order().get(self.focus).cloned()
    }

    /// Everything needed to draw one frame from `view`
    pub fn screen<'a>(&'a self, view: &'a SectionView, focus: Option<&'a FieldPath>) -> Screen<'a> {
        Screen {
            view,
            focus,
            notice: self.notice.as_ref(),
            file_prompt: self.file_prompt.as_deref(),
        }
    }

    fn set_notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            message: message.into(),
        });
    }

    fn move_focus(&mut self, forward: bool) {
        let len = self.view().focus_order().len();
        if len == 0 {
            self.focus = 0;
            return;
        }
        self.focus = if forward {
            (self.focus + 1) % len
        } else {
            (self.focus + len - 1) % len
        };
        self.file_prompt = None;
    }

    fn clamp_focus(&mut self) {
        let len = self.view().focus_order().len();
        self.focus = self.focus.min(len.saturating_sub(1));
    }

    /// Handle a key press
    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc if self.file_prompt.is_some() => self.file_prompt = None,
            KeyCode::Esc => self.quit = true,
            KeyCode::Tab => self.move_focus(true),
            KeyCode::BackTab => self.move_focus(false),
            KeyCode::Char('s') if ctrl => self.start_submit(),
            KeyCode::Char('a') if ctrl => self.add_group(),
            KeyCode::Char('d') if ctrl => self.remove_group(),
            KeyCode::Char('e') if ctrl => self.start_enhance(),
            _ if ctrl => {}
            _ => self.edit_focused(key).await,
        }
        Ok(())
    }

    fn start_submit(&mut self) {
        match self.session.begin_submit() {
            Ok(ticket) => {
                let store = Arc::clone(&self.store);
                let tx = self.completions_tx.clone();
                tokio::spawn(async move {
                    let result = store.save(&ticket.section_id, &ticket.values).await;
                    let _ = tx.send(Completion::Saved(ticket, result));
                });
                self.set_notice(NoticeLevel::Info, "Saving…");
            }
            Err(SubmitError::Invalid(count)) => {
                let noun = if count == 1 { "field needs" } else { "fields need" };
                self.set_notice(NoticeLevel::Error, format!("{count} {noun} attention"));
            }
            Err(SubmitError::InFlight) => {}
        }
    }

    fn start_enhance(&mut self) {
        let Some(path) = self.focused() else {
            return;
        };
        let Some(ticket) = self.session.begin_enhance(&path) else {
            return;
        };
        let rewriter = Arc::clone(&self.rewriter);
        let tx = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = rewriter.rewrite(&ticket.request()).await;
            let _ = tx.send(Completion::Enhanced(ticket, result));
        });
    }

    fn add_group(&mut self) {
        let Some(path) = self.focused() else {
            return;
        };
        match self.session.add_group(&path.question) {
            Ok(true) => {}
            Ok(false) => self.set_notice(NoticeLevel::Info, "No more entries can be added"),
            Err(err) => tracing::debug!(%path, %err, "add ignored"),
        }
    }

    fn remove_group(&mut self) {
        let Some(path) = self.focused() else {
            return;
        };
        let Some(index) = path.group_index() else {
            return;
        };
        match self.session.remove_group(&path.question, index) {
            Ok(true) => self.clamp_focus(),
            Ok(false) => self.set_notice(NoticeLevel::Info, "At least one entry is kept"),
            Err(err) => tracing::warn!(%path, %err, "remove failed"),
        }
    }

    async fn edit_focused(&mut self, key: KeyEvent) {
        let Some(path) = self.focused() else {
            return;
        };
        let view = self.view();
        let Some(field) = view.field(&path) else {
            return;
        };
        if field.read_only {
            return;
        }

        let result = match &field.control {
            Control::Text { value, .. } | Control::Date { value } => match key.code {
                KeyCode::Char(c) => self.session.input_change(&path, &format!("{value}{c}")),
                KeyCode::Backspace => self.session.input_change(&path, &pop_char(value)),
                _ => Ok(()),
            },
            Control::Textarea { value, .. } => match key.code {
                KeyCode::Char(c) => self.session.input_change(&path, &format!("{value}{c}")),
                KeyCode::Enter => self.session.input_change(&path, &format!("{value}\n")),
                KeyCode::Backspace => self.session.input_change(&path, &pop_char(value)),
                _ => Ok(()),
            },
            Control::Radio { options } | Control::Dropdown { options, .. } => {
                let labels: Vec<&str> = options.iter().map(|c| c.label.as_str()).collect();
                let current = options.iter().position(|c| c.selected);
                let next = match key.code {
                    KeyCode::Right | KeyCode::Char(' ') => Some(cycle(current, labels.len(), true)),
                    KeyCode::Left => Some(cycle(current, labels.len(), false)),
                    KeyCode::Backspace | KeyCode::Delete => None,
                    _ => return,
                };
                let text = next.and_then(|i| labels.get(i).copied());
                let text = match (&field.control, text) {
                    (_, Some(text)) => text,
                    (Control::Dropdown { .. }, None) => DROPDOWN_NONE,
                    (_, None) => "",
                };
                self.session.input_change(&path, text)
            }
            Control::MultiSelect { options } => match key.code {
                KeyCode::Char(c @ '1'..='9') => {
                    let index = c as usize - '1' as usize;
                    match options.get(index) {
                        Some(choice) => self.session.toggle_option(&path, &choice.label),
                        None => Ok(()),
                    }
                }
                _ => Ok(()),
            },
            Control::File { .. } => {
                self.edit_file_prompt(&path, key).await;
                Ok(())
            }
            Control::Repeater { .. } => Ok(()),
        };

        if let Err(err) = result {
            tracing::debug!(%path, %err, "edit rejected");
        }
    }

    async fn edit_file_prompt(&mut self, path: &FieldPath, key: KeyEvent) {
        match key.code {
            KeyCode::Delete => {
                self.file_prompt = None;
                if let Err(err) = self.session.file_change(path, None) {
                    tracing::debug!(%path, %err, "clear rejected");
                }
            }
            KeyCode::Char(c) => self.file_prompt.get_or_insert_with(String::new).push(c),
            KeyCode::Backspace => {
                if let Some(prompt) = self.file_prompt.as_mut() {
                    prompt.pop();
                }
            }
            KeyCode::Enter => {
                let Some(prompt) = self.file_prompt.take() else {
                    return;
                };
                match open_file(Path::new(prompt.trim())).await {
                    Ok(handle) => match self.session.file_change(path, Some(handle)) {
                        Ok(Some(error)) => self.set_notice(NoticeLevel::Error, error.message()),
                        Ok(None) => {}
                        Err(err) => tracing::warn!(%path, %err, "file change failed"),
                    },
                    Err(err) => {
                        tracing::debug!(%err, file = %prompt, "could not open file");
                        self.set_notice(NoticeLevel::Error, format!("Cannot open {prompt}"));
                    }
                }
            }
            _ => {}
        }
    }

    /// Apply finished background calls and queued notices
    pub fn poll_background(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            self.complete(completion);
        }
        while let Ok(notice) = self.notices.try_recv() {
            self.notice = Some(notice);
        }
        for url in self.session.drain_released_previews() {
            tracing::debug!(%url, "preview released");
        }
    }

    /// Wait for the next background completion and apply it
    pub async fn next_completion(&mut self) -> bool {
        match self.completions.recv().await {
            Some(completion) => {
                self.complete(completion);
                while let Ok(notice) = self.notices.try_recv() {
                    self.notice = Some(notice);
                }
                true
            }
            None => false,
        }
    }

    fn complete(&mut self, completion: Completion) {
        match completion {
            Completion::Saved(ticket, result) => match self.session.finish_submit(ticket, result) {
                SubmitOutcome::Saved => self.set_notice(NoticeLevel::Success, "Changes saved"),
                SubmitOutcome::Failed(message) => self.set_notice(NoticeLevel::Error, message),
                SubmitOutcome::Discarded => {}
            },
            Completion::Enhanced(ticket, result) => {
                let outcome = self.session.finish_enhance(ticket, result, &self.notifier);
                if outcome == EnhanceOutcome::Discarded {
                    tracing::debug!("enhance result dropped");
                }
            }
        }
    }
}

fn pop_char(value: &str) -> String {
    let mut text = value.to_string();
    text.pop();
    text
}

fn cycle(current: Option<usize>, len: usize, forward: bool) -> usize {
    match (current, forward) {
        (_, _) if len == 0 => 0,
        (None, true) => 0,
        (None, false) => len - 1,
        (Some(i), true) => (i + 1) % len,
        (Some(i), false) => (i + len - 1) % len,
    }
}

/// Mime type guessed from the file's extension
fn guess_mime(file: &FileHandle) -> &'static str {
    match file.extension().as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Handle for a local file, keeping its location as a `file://` URL
async fn open_file(path: &Path) -> Result<FileHandle> {
    let path = tokio::fs::canonicalize(path).await?;
    let metadata = tokio::fs::metadata(&path).await?;
    if !metadata.is_file() {
        anyhow::bail!("{} is not a file", path.display());
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let source = Url::from_file_path(&path)
        .map_err(|()| anyhow::anyhow!("{} has no file URL", path.display()))?;

    let mut file = FileHandle::new(&name, "", metadata.len()).with_source(source.as_str());
    file.mime_type = guess_mime(&file).to_string();
    Ok(file)
}
