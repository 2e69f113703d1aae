//! Section schema model
//!
//! A [`Section`] is the declarative description of one page of user-editable
//! data. It is deserialized from the camelCase JSON the dashboard stores and
//! converted into typed [`FieldKind`] variants up front, so the rest of the
//! engine never compares type strings.

mod question;
mod raw;

pub use question::{
    FieldKind, Pattern, Question, RepeaterSpec, SchemaError, Section, TextRules,
    DEFAULT_MAX_GROUPS,
};
