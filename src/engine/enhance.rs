//! AI text enhancement of textarea fields

use crate::error::ServiceError;
use crate::services::{Notice, Notifier, RewriteRequest, TextRewriter};
use crate::state::{FieldPath, FormSession, Value};

/// An enhancement that has been started for one field
#[derive(Debug, Clone)]
pub struct EnhanceTicket {
    epoch: u64,
    /// Stable id of the group a group-scoped path was issued for
    group_id: Option<u64>,
    pub path: FieldPath,
    pub text: String,
}

impl EnhanceTicket {
    pub fn request(&self) -> RewriteRequest {
        RewriteRequest {
            question_id: self.path.question.clone(),
            text: self.text.clone(),
            group_index: self.path.group_index(),
            field_id: self.path.group.as_ref().map(|slot| slot.field.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceOutcome {
    Applied,
    Failed(String),
    /// The field no longer exists in the shape the ticket was issued for
    Discarded,
}

impl FormSession {
    /// Whether the enhance affordance of `path` is enabled
    pub fn can_enhance(&self, path: &FieldPath) -> bool {
        let Ok(question) = self.spec(path) else {
            return false;
        };
        question.rewrite_enabled()
            && !self.is_locked(path)
            && !self.loading
            && !self.enhancing.contains(path)
            && self
                .read(path)
                .and_then(Value::as_text)
                .is_some_and(|text| !text.trim().is_empty())
    }

    /// Mark `path` as enhancing and capture its text
    ///
    /// Returns `None` when the affordance is disabled, including while an
    /// enhancement for the same field is already in flight.
    pub fn begin_enhance(&mut self, path: &FieldPath) -> Option<EnhanceTicket> {
        if !self.can_enhance(path) {
            tracing::debug!(%path, "enhance request ignored");
            return None;
        }
        let text = self.read(path).and_then(Value::as_text)?.to_string();
        self.enhancing.insert(path.clone());
        tracing::debug!(%path, chars = text.chars().count(), "enhance started");

        Some(EnhanceTicket {
            epoch: self.epoch,
            group_id: path
                .group_index()
                .and_then(|index| self.group_id(&path.question, index)),
            path: path.clone(),
            text,
        })
    }

    /// Apply the rewriter's answer for `ticket`
    pub fn finish_enhance(
        &mut self,
        ticket: EnhanceTicket,
        result: Result<String, ServiceError>,
        notifier: &dyn Notifier,
    ) -> EnhanceOutcome {
        if ticket.epoch != self.epoch {
            tracing::debug!(path = %ticket.path, "discarding enhance result from a replaced schema");
            return EnhanceOutcome::Discarded;
        }
        let Some(path) = self.current_path(&ticket) else {
            tracing::debug!(path = %ticket.path, "discarding enhance result for a removed group");
            return EnhanceOutcome::Discarded;
        };
        self.enhancing.remove(&path);

        match result {
            Ok(text) => {
                if let Err(err) = self.input_change(&path, &text) {
                    tracing::warn!(%path, %err, "could not apply enhanced text");
                    return EnhanceOutcome::Discarded;
                }
                tracing::info!(%path, "enhanced text applied");
                notifier.notify(Notice::success("Text enhanced"));
                EnhanceOutcome::Applied
            }
            Err(err) => {
                tracing::warn!(%path, %err, "rewrite failed");
                let message = err.user_message();
                notifier.notify(Notice::error(message));
                EnhanceOutcome::Failed(message.to_string())
            }
        }
    }

    /// Where the ticket's field lives now: its group moves down when an
    /// earlier group is removed, and a removed group has no path
    fn current_path(&self, ticket: &EnhanceTicket) -> Option<FieldPath> {
        match (&ticket.path.group, ticket.group_id) {
            (Some(slot), Some(id)) => {
                let index = self.group_index_of(&ticket.path.question, id)?;
                Some(FieldPath::group_field(&ticket.path.question, index, &slot.field))
            }
            _ => Some(ticket.path.clone()),
        }
    }

    /// Run a full enhancement against `rewriter`; `None` if it did not start
    pub async fn enhance<R>(
        &mut self,
        path: &FieldPath,
        rewriter: &R,
        notifier: &dyn Notifier,
    ) -> Option<EnhanceOutcome>
    where
        R: TextRewriter + ?Sized,
    {
        let ticket = self.begin_enhance(path)?;
        let result = rewriter.rewrite(&ticket.request()).await;
        Some(self.finish_enhance(ticket, result, notifier))
    }
}
