//! Form field value objects

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::schema::{FieldKind, Question};

/// One repeated entry of a repeater question, keyed by field id
pub type Group = BTreeMap<String, Value>;

/// Current values of a section, keyed by question id
pub type Values = BTreeMap<String, Value>;

/// A newly selected file that has not been persisted yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileHandle {
    pub id: Uuid,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
    /// Where the selected bytes live, e.g. a `file://` URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl FileHandle {
    pub fn new(name: &str, mime_type: &str, size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Lowercased extension of the file name, without the dot
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }
}

/// Value of a file field: either a fresh selection or a reference left by a
/// previous save
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FileValue {
    New(FileHandle),
    Existing { name: Option<String>, url: String },
}

impl FileValue {
    /// Stored form of the value: a new file becomes an existing reference
    /// to its source, `None` when it has no source to point at
    pub fn persisted(&self) -> Option<FileValue> {
        match self {
            FileValue::New(handle) => handle.source.as_ref().map(|url| FileValue::Existing {
                name: Some(handle.name.clone()),
                url: url.clone(),
            }),
            FileValue::Existing { .. } => Some(self.clone()),
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            FileValue::New(handle) => &handle.name,
            FileValue::Existing {
                name: Some(name), ..
            } => name,
            FileValue::Existing { url, .. } => url.rsplit('/').next().unwrap_or(url),
        }
    }
}

/// Type-safe field values
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// text, textarea, radio, dropdown and date fields
    Text(String),
    /// checkbox / multipleChoice, in selection order
    Multi(Vec<String>),
    File(FileValue),
    Groups(Vec<Group>),
}

impl Value {
    pub fn text(value: &str) -> Self {
        Value::Text(value.to_string())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            Value::Multi(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileValue> {
        match self {
            Value::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn as_groups(&self) -> Option<&[Group]> {
        match self {
            Value::Groups(groups) => Some(groups),
            _ => None,
        }
    }

    /// Whether the value counts as "not answered"
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Text(s) => s.trim().is_empty(),
            Value::Multi(items) => items.is_empty(),
            Value::File(_) => false,
            Value::Groups(groups) => groups.is_empty(),
        }
    }

    /// Whether this value has the shape the given field kind stores
    pub fn fits(&self, kind: &FieldKind) -> bool {
        matches!(
            (self, kind),
            (
                Value::Text(_),
                FieldKind::Text(_)
                    | FieldKind::Textarea { .. }
                    | FieldKind::Radio { .. }
                    | FieldKind::Dropdown { .. }
                    | FieldKind::Date
            ) | (Value::Multi(_), FieldKind::MultiSelect { .. })
                | (Value::File(_), FieldKind::File { .. })
                | (Value::Groups(_), FieldKind::Repeater(_))
        )
    }

    /// Coerce a stored JSON value into the shape `question` expects
    ///
    /// Returns `None` when nothing usable is present; values of the wrong
    /// shape are dropped rather than guessed at.
    pub fn from_json(question: &Question, json: &serde_json::Value) -> Option<Value> {
        use serde_json::Value as Json;

        match &question.kind {
            FieldKind::Text(_)
            | FieldKind::Textarea { .. }
            | FieldKind::Radio { .. }
            | FieldKind::Dropdown { .. }
            | FieldKind::Date => match json {
                Json::String(s) => Some(Value::Text(s.clone())),
                Json::Number(n) => Some(Value::Text(n.to_string())),
                Json::Bool(b) => Some(Value::Text(b.to_string())),
                _ => None,
            },
            FieldKind::MultiSelect { .. } => match json {
                Json::Array(items) => Some(Value::Multi(
                    items
                        .iter()
                        .filter_map(|item| item.as_str().map(str::to_string))
                        .collect(),
                )),
                Json::String(s) if !s.is_empty() => Some(Value::Multi(vec![s.clone()])),
                _ => None,
            },
            FieldKind::File { .. } => match json {
                Json::String(url) if !url.is_empty() => Some(Value::File(FileValue::Existing {
                    name: None,
                    url: url.clone(),
                })),
                Json::Object(map) => {
                    let url = map.get("url")?.as_str()?.to_string();
                    let name = map.get("name").and_then(|n| n.as_str()).map(str::to_string);
                    Some(Value::File(FileValue::Existing { name, url }))
                }
                _ => None,
            },
            FieldKind::Repeater(spec) => {
                let Json::Array(items) = json else {
                    return None;
                };
                let mut groups: Vec<Group> = items
                    .iter()
                    .filter_map(|item| item.as_object())
                    .map(|entry| {
                        spec.fields
                            .iter()
                            .filter_map(|field| {
                                let raw = entry.get(&field.id)?;
                                Value::from_json(field, raw).map(|v| (field.id.clone(), v))
                            })
                            .collect()
                    })
                    .collect();
                if groups.len() > spec.capacity() {
                    tracing::warn!(
                        question = %question.id,
                        stored = groups.len(),
                        capacity = spec.capacity(),
                        "truncating stored groups to repeater capacity"
                    );
                    groups.truncate(spec.capacity());
                }
                Some(Value::Groups(groups))
            }
        }
    }
}
