//! Per-field validation errors of a form

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::path::FieldPath;

/// A field-scoped validation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldError {
    Required,
    TooLong,
    InvalidFormat,
    UnsupportedFileType,
}

impl FieldError {
    pub fn message(&self) -> &'static str {
        match self {
            FieldError::Required => "required",
            FieldError::TooLong => "too long",
            FieldError::InvalidFormat => "invalid format",
            FieldError::UnsupportedFileType => "unsupported file type",
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Errors of one group, keyed by field id
pub type GroupErrors = BTreeMap<String, FieldError>;

/// Error state of one question
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorEntry {
    Field(FieldError),
    /// Repeater errors, keyed by group index then field id
    Groups(BTreeMap<usize, GroupErrors>),
}

/// Error map of a whole form plus the form-level submit message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, ErrorEntry>,
    submit: Option<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// No field errors and no submit error
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.submit.is_none()
    }

    pub fn has_field_errors(&self) -> bool {
        !self.fields.is_empty()
    }

    /// Number of questions carrying an error entry
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, question: &str) -> Option<&ErrorEntry> {
        self.fields.get(question)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ErrorEntry)> {
        self.fields.iter()
    }

    pub fn insert(&mut self, question: &str, entry: ErrorEntry) {
        self.fields.insert(question.to_string(), entry);
    }

    /// Error attached to exactly this path
    pub fn for_path(&self, path: &FieldPath) -> Option<FieldError> {
        match (self.fields.get(&path.question)?, &path.group) {
            (ErrorEntry::Field(err), None) => Some(*err),
            (ErrorEntry::Groups(groups), Some(slot)) => {
                groups.get(&slot.index)?.get(&slot.field).copied()
            }
            _ => None,
        }
    }

    pub fn set(&mut self, path: &FieldPath, error: FieldError) {
        match &path.group {
            None => {
                self.fields
                    .insert(path.question.clone(), ErrorEntry::Field(error));
            }
            Some(slot) => {
                let entry = self
                    .fields
                    .entry(path.question.clone())
                    .or_insert_with(|| ErrorEntry::Groups(BTreeMap::new()));
                if let ErrorEntry::Field(_) = entry {
                    *entry = ErrorEntry::Groups(BTreeMap::new());
                }
                if let ErrorEntry::Groups(groups) = entry {
                    groups
                        .entry(slot.index)
                        .or_default()
                        .insert(slot.field.clone(), error);
                }
            }
        }
    }

    /// Remove the error at `path`, pruning empty nested maps
    pub fn clear_path(&mut self, path: &FieldPath) {
        let Some(slot) = &path.group else {
            self.fields.remove(&path.question);
            return;
        };
        let Some(ErrorEntry::Groups(groups)) = self.fields.get_mut(&path.question) else {
            return;
        };
        if let Some(group) = groups.get_mut(&slot.index) {
            group.remove(&slot.field);
            if group.is_empty() {
                groups.remove(&slot.index);
            }
        }
        if groups.is_empty() {
            self.fields.remove(&path.question);
        }
    }

    /// Drop a question-level error without touching nested group errors
    pub fn clear_question_level(&mut self, question: &str) {
        if let Some(ErrorEntry::Field(_)) = self.fields.get(question) {
            self.fields.remove(question);
        }
    }

    /// Follow a group removal: drop the removed group's errors and shift
    /// later groups down by one
    pub fn remove_group(&mut self, question: &str, removed: usize) {
        let Some(ErrorEntry::Groups(groups)) = self.fields.get_mut(question) else {
            return;
        };
        let shifted = std::mem::take(groups)
            .into_iter()
            .filter(|(index, _)| *index != removed)
            .map(|(index, errs)| {
                if index > removed {
                    (index - 1, errs)
                } else {
                    (index, errs)
                }
            })
            .collect::<BTreeMap<_, _>>();
        if shifted.is_empty() {
            self.fields.remove(question);
        } else {
            *groups = shifted;
        }
    }

    /// Every leaf error with its full path, in question/group/field order
    pub fn paths(&self) -> Vec<(FieldPath, FieldError)> {
        let mut out = Vec::new();
        for (question, entry) in &self.fields {
            match entry {
                ErrorEntry::Field(err) => out.push((FieldPath::question(question), *err)),
                ErrorEntry::Groups(groups) => {
                    for (index, fields) in groups {
                        for (field, err) in fields {
                            out.push((FieldPath::group_field(question, *index, field), *err));
                        }
                    }
                }
            }
        }
        out
    }

    pub fn submit(&self) -> Option<&str> {
        self.submit.as_deref()
    }

    pub fn set_submit(&mut self, message: impl Into<String>) {
        self.submit = Some(message.into());
    }

    pub fn clear_submit(&mut self) {
        self.submit = None;
    }

    /// Replace field errors, keeping the submit message untouched
    pub fn replace_fields(&mut self, other: FormErrors) {
        self.fields = other.fields;
    }

    pub fn clear(&mut self) {
        self.fields.clear();
        self.submit = None;
    }
}
