//! Form engine operations over a [`FormSession`](crate::state::FormSession)
//!
//! Each submodule adds one concern to the session: rendering to a view
//! model, repeater group management, validation, submission and text
//! enhancement.

mod enhance;
mod render;
mod repeater;
mod submit;
mod validate;

pub use enhance::{EnhanceOutcome, EnhanceTicket};
pub use render::{
    render_field, render_section, Choice, Control, EnhanceButton, FieldView, FileDisplay,
    GroupView, Row, Scope, SectionView,
};
pub use submit::{SubmitError, SubmitOutcome, SubmitTicket};
pub use validate::{check_field, file_type_allowed, validate, validate_question};
