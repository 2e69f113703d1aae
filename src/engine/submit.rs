//! Submission coordinator
//!
//! A save is split in two halves so the external call can run anywhere
//! (inline, on a spawned task) while the session stays single-owner:
//! [`FormSession::begin_submit`] validates and hands out a ticket holding a
//! values snapshot, and [`FormSession::finish_submit`] applies the result.

use thiserror::Error;

use crate::error::ServiceError;
use crate::services::{user_message, SectionStore, GENERIC_MESSAGE};
use crate::state::{FormSession, Values};

/// Why a submission did not start
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    InFlight,

    #[error("{0} question(s) failed validation")]
    Invalid(usize),
}

/// Proof that a submission was started, carrying what must be saved
#[derive(Debug)]
pub struct SubmitTicket {
    epoch: u64,
    pub section_id: String,
    pub values: Values,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved,
    /// Persistence failed; the message is stored as the form's submit error
    Failed(String),
    /// The session moved on (new schema) before the save completed
    Discarded,
}

impl FormSession {
    /// Validate and, if clean, enter the loading state
    pub fn begin_submit(&mut self) -> Result<SubmitTicket, SubmitError> {
        if self.loading {
            tracing::debug!(section = %self.section().id, "submit ignored while loading");
            return Err(SubmitError::InFlight);
        }
        self.loading = true;
        self.errors_mut().clear_submit();

        let errors = self.validate();
        if errors.has_field_errors() {
            let count = errors.len();
            self.errors_mut().replace_fields(errors);
            self.loading = false;
            tracing::debug!(section = %self.section().id, count, "submit blocked by validation");
            return Err(SubmitError::Invalid(count));
        }
        self.errors_mut().replace_fields(errors);

        Ok(SubmitTicket {
            epoch: self.epoch,
            section_id: self.section().id.clone(),
            values: self.values().clone(),
        })
    }

    /// Apply the result of the persistence call started by `ticket`
    pub fn finish_submit(
        &mut self,
        ticket: SubmitTicket,
        result: Result<(), ServiceError>,
    ) -> SubmitOutcome {
        if ticket.epoch != self.epoch {
            tracing::debug!(section = %ticket.section_id, "discarding stale submit result");
            return SubmitOutcome::Discarded;
        }
        self.loading = false;

        match result {
            Ok(()) => {
                tracing::info!(section = %ticket.section_id, "section saved");
                SubmitOutcome::Saved
            }
            Err(err) => {
                tracing::warn!(section = %ticket.section_id, %err, "section save failed");
                let message = match user_message(&err.code) {
                    GENERIC_MESSAGE => "Failed to save changes. Please try again.",
                    known => known,
                };
                self.errors_mut().set_submit(message);
                SubmitOutcome::Failed(message.to_string())
            }
        }
    }

    /// Run a full submission against `store`
    pub async fn submit<S>(&mut self, store: &S) -> Result<SubmitOutcome, SubmitError>
    where
        S: SectionStore + ?Sized,
    {
        let ticket = self.begin_submit()?;
        let result = store.save(&ticket.section_id, &ticket.values).await;
        Ok(self.finish_submit(ticket, result))
    }
}
