//! Typed questions and sections

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::raw::RawSection;

/// Group ceiling used when a multi-group repeater does not set `maxGroups`
pub const DEFAULT_MAX_GROUPS: usize = 10;

/// Problems found while converting a raw schema into typed questions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("question `{id}` has unknown type `{kind}`")]
    UnknownType { id: String, kind: String },

    #[error("question `{id}` has an invalid pattern: {reason}")]
    InvalidPattern { id: String, reason: String },

    #[error("repeater field `{id}` cannot itself be a repeater")]
    NestedRepeater { id: String },

    #[error("duplicate id `{id}`")]
    DuplicateId { id: String },

    #[error("repeater `{id}` must allow at least one group")]
    ZeroMaxGroups { id: String },
}

/// A compiled `validation.pattern`
///
/// Matching is unanchored, the same as a `RegExp.test` call.
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Length and format constraints of text-like fields
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRules {
    pub max_length: Option<usize>,
    pub pattern: Option<Pattern>,
}

/// Repeated group definition
#[derive(Debug, Clone, PartialEq)]
pub struct RepeaterSpec {
    pub fields: Vec<Question>,
    pub allow_multiple: bool,
    pub max_groups: usize,
}

impl RepeaterSpec {
    /// Maximum number of groups the value may hold
    pub fn capacity(&self) -> usize {
        if self.allow_multiple {
            self.max_groups
        } else {
            1
        }
    }

    pub fn field(&self, id: &str) -> Option<&Question> {
        self.fields.iter().find(|f| f.id == id)
    }
}

/// The control a question is rendered as
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text(TextRules),
    Textarea {
        rules: TextRules,
        enable_rewrite: bool,
    },
    Radio {
        options: Vec<String>,
    },
    /// `checkbox` and `multipleChoice`
    MultiSelect {
        options: Vec<String>,
    },
    /// `dropdown` and `select`
    Dropdown {
        options: Vec<String>,
    },
    File {
        file_types: Vec<String>,
    },
    Date,
    Repeater(RepeaterSpec),
}

impl FieldKind {
    /// Short name used in logs and error messages
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text(_) => "text",
            FieldKind::Textarea { .. } => "textarea",
            FieldKind::Radio { .. } => "radio",
            FieldKind::MultiSelect { .. } => "multi-select",
            FieldKind::Dropdown { .. } => "dropdown",
            FieldKind::File { .. } => "file",
            FieldKind::Date => "date",
            FieldKind::Repeater(_) => "repeater",
        }
    }
}

/// One schema-described input
///
/// Entries inside a repeater group ("fields") use the same type; the schema
/// conversion guarantees they are never repeaters themselves.
#[derive(Debug, Clone, PartialEq)]
pub struct Question {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub kind: FieldKind,
}

impl Question {
    pub fn new(id: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            description: None,
            required: false,
            kind,
        }
    }

    /// Plain single-line text question
    pub fn text(id: &str, label: &str) -> Self {
        Self::new(id, label, FieldKind::Text(TextRules::default()))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn text_rules(&self) -> Option<&TextRules> {
        match &self.kind {
            FieldKind::Text(rules) | FieldKind::Textarea { rules, .. } => Some(rules),
            _ => None,
        }
    }

    pub fn options(&self) -> &[String] {
        match &self.kind {
            FieldKind::Radio { options }
            | FieldKind::MultiSelect { options }
            | FieldKind::Dropdown { options } => options,
            _ => &[],
        }
    }

    pub fn repeater(&self) -> Option<&RepeaterSpec> {
        match &self.kind {
            FieldKind::Repeater(spec) => Some(spec),
            _ => None,
        }
    }

    /// True for textareas that expose the enhance affordance
    pub fn rewrite_enabled(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Textarea {
                enable_rewrite: true,
                ..
            }
        )
    }
}

/// An ordered collection of questions making up one page of the profile
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSection")]
pub struct Section {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
}

impl Section {
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Parse a section from its JSON representation
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
