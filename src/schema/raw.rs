//! Wire shape of stored schemas and its conversion into typed questions

use std::collections::HashSet;

use serde::Deserialize;

use super::question::{
    FieldKind, Pattern, Question, RepeaterSpec, SchemaError, Section, TextRules,
    DEFAULT_MAX_GROUPS,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawSection {
    id: String,
    #[serde(default)]
    label: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    questions: Vec<Option<RawQuestion>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    label: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    input_type: Option<String>,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    validation: Option<RawValidation>,
    #[serde(default)]
    enable_rewrite: bool,
    #[serde(default)]
    allow_multiple_groups: bool,
    #[serde(default)]
    repeater_fields: Option<Vec<Option<RawQuestion>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawValidation {
    #[serde(default)]
    max_length: Option<usize>,
    #[serde(default)]
    pattern: Option<String>,
    #[serde(default)]
    file_types: Option<Vec<String>>,
    #[serde(default)]
    max_groups: Option<usize>,
}

impl TryFrom<RawSection> for Section {
    type Error = SchemaError;

    fn try_from(raw: RawSection) -> Result<Self, Self::Error> {
        let questions = convert_list(raw.questions, false)?;
        Ok(Section {
            id: raw.id,
            label: raw.label,
            description: raw.description,
            questions,
        })
    }
}

/// Convert a list of entries, dropping nulls and rejecting duplicate ids
fn convert_list(
    entries: Vec<Option<RawQuestion>>,
    inside_repeater: bool,
) -> Result<Vec<Question>, SchemaError> {
    let mut seen = HashSet::new();
    let mut out = Vec::with_capacity(entries.len());

    for entry in entries {
        let Some(raw) = entry else {
            tracing::debug!("skipping null schema entry");
            continue;
        };
        if !seen.insert(raw.id.clone()) {
            return Err(SchemaError::DuplicateId { id: raw.id });
        }
        out.push(convert_question(raw, inside_repeater)?);
    }

    Ok(out)
}

fn convert_question(raw: RawQuestion, inside_repeater: bool) -> Result<Question, SchemaError> {
    let validation = raw.validation.unwrap_or_default();
    let options = raw.options.unwrap_or_default();

    let kind = match raw.kind.as_str() {
        "text" => {
            let rules = text_rules(&raw.id, &validation)?;
            if raw.input_type.as_deref() == Some("textarea") {
                FieldKind::Textarea {
                    rules,
                    enable_rewrite: raw.enable_rewrite,
                }
            } else {
                FieldKind::Text(rules)
            }
        }
        "radio" => FieldKind::Radio { options },
        "checkbox" | "multipleChoice" => FieldKind::MultiSelect { options },
        "dropdown" | "select" => FieldKind::Dropdown { options },
        "file" => FieldKind::File {
            file_types: validation.file_types.unwrap_or_default(),
        },
        "date" => FieldKind::Date,
        "repeater" => {
            if inside_repeater {
                return Err(SchemaError::NestedRepeater { id: raw.id });
            }
            let max_groups = validation.max_groups.unwrap_or(DEFAULT_MAX_GROUPS);
            if raw.allow_multiple_groups && max_groups == 0 {
                return Err(SchemaError::ZeroMaxGroups { id: raw.id });
            }
            FieldKind::Repeater(RepeaterSpec {
                fields: convert_list(raw.repeater_fields.unwrap_or_default(), true)?,
                allow_multiple: raw.allow_multiple_groups,
                max_groups,
            })
        }
        other => {
            return Err(SchemaError::UnknownType {
                id: raw.id,
                kind: other.to_string(),
            })
        }
    };

    Ok(Question {
        label: raw.label.or(raw.question).unwrap_or_else(|| raw.id.clone()),
        id: raw.id,
        description: raw.description,
        required: raw.required,
        kind,
    })
}

fn text_rules(id: &str, validation: &RawValidation) -> Result<TextRules, SchemaError> {
    let pattern = validation
        .pattern
        .as_deref()
        .map(Pattern::new)
        .transpose()
        .map_err(|e| SchemaError::InvalidPattern {
            id: id.to_string(),
            reason: e.to_string(),
        })?;

    Ok(TextRules {
        max_length: validation.max_length,
        pattern,
    })
}
