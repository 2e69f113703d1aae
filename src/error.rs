//! Error taxonomy shared by the form engine and the service boundary
//!
//! Field-level validation failures are not errors in this sense: they are
//! returned as data (see [`crate::state::FieldError`]). The types here cover
//! programmer/schema mistakes and failures reported by external services.

use crate::state::FieldPath;
use thiserror::Error;

/// Operation-fatal engine errors
///
/// These indicate that the caller and the schema disagree about the shape of
/// the form state, not that the user entered something wrong.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("question `{0}` does not exist in this section")]
    UnknownQuestion(String),

    #[error("question `{question}` has no field `{field}`")]
    UnknownField { question: String, field: String },

    #[error("question `{0}` is not a repeater")]
    NotARepeater(String),

    #[error("group index {index} is out of range for `{question}` ({len} groups)")]
    IndexOutOfRange {
        question: String,
        index: usize,
        len: usize,
    },

    #[error("`{path}` does not accept a {attempted} edit")]
    KindMismatch { path: FieldPath, attempted: &'static str },

    #[error("`{option}` is not an option of `{path}`")]
    UnknownOption { path: FieldPath, option: String },

    #[error("`{0}` is read-only")]
    ReadOnly(String),
}

/// A failure reported by an external collaborator (auth, billing, OTP,
/// storage, rewrite)
///
/// `code` follows the provider's own vocabulary (`auth/wrong-password`,
/// `card_declined`, ...) and is what the user-facing message table keys on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ServiceError {
    pub code: String,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Message suitable for a toast, looked up from the static code table
    pub fn user_message(&self) -> &'static str {
        crate::services::user_message(&self.code)
    }
}
