//! Validation engine
//!
//! Produces a [`FormErrors`] map from values and schema. Failures are data:
//! nothing in here returns an `Err` or panics on bad input.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::schema::{FieldKind, Question, Section};
use crate::state::{
    ErrorEntry, FieldError, FileHandle, FileValue, FormErrors, FormSession, GroupErrors, Value,
    Values, Viewer, DROPDOWN_NONE,
};

/// Whether `file` matches one of the accepted types
///
/// Entries may be MIME types (`image/png`), wildcards (`image/*`) or file
/// extensions (`.pdf`). An empty list accepts everything.
pub fn file_type_allowed(allowed: &[String], file: &FileHandle) -> bool {
    if allowed.is_empty() {
        return true;
    }
    let mime = file.mime_type.trim().to_ascii_lowercase();
    let extension = file.extension();

    allowed.iter().any(|entry| {
        let entry = entry.trim().to_ascii_lowercase();
        if let Some(ext) = entry.strip_prefix('.') {
            extension.as_deref() == Some(ext)
        } else if let Some(top) = entry.strip_suffix("/*") {
            mime.split_once('/').is_some_and(|(t, _)| t == top)
        } else {
            entry == mime
        }
    })
}

/// Validate every question of `section`
pub fn validate(section: &Section, values: &Values, viewer: &Viewer) -> FormErrors {
    let mut errors = FormErrors::new();
    for question in &section.questions {
        if viewer.locks(&question.id) {
            continue;
        }
        if let Some(entry) = validate_question(question, values.get(&question.id)) {
            errors.insert(&question.id, entry);
        }
    }
    errors
}

/// Validate one top-level question, recursing into repeater groups
pub fn validate_question(question: &Question, value: Option<&Value>) -> Option<ErrorEntry> {
    let FieldKind::Repeater(spec) = &question.kind else {
        return check_field(question, value).map(ErrorEntry::Field);
    };

    let groups = value.and_then(Value::as_groups).unwrap_or(&[]);
    if question.required && groups.is_empty() {
        return Some(ErrorEntry::Field(FieldError::Required));
    }

    let mut nested = BTreeMap::new();
    for (index, group) in groups.iter().enumerate() {
        let errors: GroupErrors = spec
            .fields
            .iter()
            .filter_map(|field| {
                check_field(field, group.get(&field.id)).map(|err| (field.id.clone(), err))
            })
            .collect();
        if !errors.is_empty() {
            nested.insert(index, errors);
        }
    }

    (!nested.is_empty()).then_some(ErrorEntry::Groups(nested))
}

/// Rules of a single non-repeater field, first failure wins
pub fn check_field(field: &Question, value: Option<&Value>) -> Option<FieldError> {
    let empty = match (value, &field.kind) {
        (None, _) => true,
        (Some(Value::Text(s)), FieldKind::Dropdown { .. }) if s == DROPDOWN_NONE => true,
        (Some(v), _) => v.is_empty(),
    };
    if empty {
        return field.required.then_some(FieldError::Required);
    }
    let value = value?;

    match (&field.kind, value) {
        (FieldKind::Text(rules) | FieldKind::Textarea { rules, .. }, Value::Text(text)) => {
            if rules.max_length.is_some_and(|max| text.chars().count() > max) {
                return Some(FieldError::TooLong);
            }
            if rules.pattern.as_ref().is_some_and(|p| !p.is_match(text)) {
                return Some(FieldError::InvalidFormat);
            }
            None
        }
        (FieldKind::Date, Value::Text(text)) => NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
            .is_err()
            .then_some(FieldError::InvalidFormat),
        (FieldKind::File { file_types }, Value::File(FileValue::New(file))) => {
            (!file_type_allowed(file_types, file)).then_some(FieldError::UnsupportedFileType)
        }
        _ => None,
    }
}

impl FormSession {
    /// Validate the current values without touching the stored errors
    pub fn validate(&self) -> FormErrors {
        validate(self.section(), self.values(), self.viewer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{FieldPath, InitialData};
    use crate::test_support::{google_viewer, profile_section, session};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn valid_session() -> FormSession {
        let initial = json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "summary": "Analytical engine programmer",
            "availableFrom": "2025-01-15",
            "experience": [{"title": "Engineer", "company": "Babbage & Co"}]
        });
        FormSession::new(
            profile_section(),
            crate::test_support::password_viewer(),
            initial.as_object().unwrap(),
        )
    }

    mod file_types {
        use super::*;

        fn allowed(entries: &[&str]) -> Vec<String> {
            entries.iter().map(|s| s.to_string()).collect()
        }

        #[test]
        fn test_mime_match() {
            let file = FileHandle::new("a.png", "image/png", 1);
            assert!(file_type_allowed(&allowed(&["image/png", "image/jpeg"]), &file));
            let pdf = FileHandle::new("a.pdf", "application/pdf", 1);
            assert!(!file_type_allowed(&allowed(&["image/png", "image/jpeg"]), &pdf));
        }

        #[test]
        fn test_extension_and_wildcard() {
            let docx = FileHandle::new("CV.DOCX", "application/octet-stream", 1);
            assert!(file_type_allowed(&allowed(&[".docx"]), &docx));
            let gif = FileHandle::new("a.gif", "image/gif", 1);
            assert!(file_type_allowed(&allowed(&["image/*"]), &gif));
            assert!(!file_type_allowed(&allowed(&["video/*"]), &gif));
        }

        #[test]
        fn test_empty_list_accepts_anything() {
            let file = FileHandle::new("x.bin", "application/octet-stream", 1);
            assert!(file_type_allowed(&[], &file));
        }
    }

    mod rules {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_valid_values_produce_no_errors() {
            assert_eq!(valid_session().validate(), FormErrors::new());
        }

        #[test]
        fn test_emptying_one_required_field_adds_exactly_one_error() {
            let mut session = valid_session();
            session
                .input_change(&FieldPath::question("firstName"), "")
                .unwrap();

            let errors = session.validate();
            assert_eq!(errors.len(), 1);
            assert_eq!(
                errors.get("firstName"),
                Some(&ErrorEntry::Field(FieldError::Required))
            );
        }

        #[test]
        fn test_required_beats_other_rules() {
            let q = Question::text("firstName", "First").required();
            assert_eq!(check_field(&q, Some(&Value::text("  "))), Some(FieldError::Required));
            assert_eq!(check_field(&q, None), Some(FieldError::Required));
        }

        #[test]
        fn test_stored_value_over_max_length_is_too_long() {
            let initial = json!({"firstName": "x".repeat(31)});
            let session = FormSession::new(
                profile_section(),
                crate::test_support::password_viewer(),
                initial.as_object().unwrap(),
            );
            assert_eq!(
                session.validate().get("firstName"),
                Some(&ErrorEntry::Field(FieldError::TooLong))
            );
        }

        #[test]
        fn test_pattern_mismatch_is_invalid_format() {
            let mut session = valid_session();
            session
                .input_change(&FieldPath::question("email"), "not-an-email")
                .unwrap();
            assert_eq!(
                session.validate().get("email"),
                Some(&ErrorEntry::Field(FieldError::InvalidFormat))
            );
        }

        #[test]
        fn test_bad_date_is_invalid_format() {
            let mut session = valid_session();
            session
                .input_change(&FieldPath::question("availableFrom"), "2025-02-30")
                .unwrap();
            assert_eq!(
                session.validate().get("availableFrom"),
                Some(&ErrorEntry::Field(FieldError::InvalidFormat))
            );
        }

        #[test]
        fn test_optional_empty_fields_pass() {
            let q = Question::text("nickname", "Nickname");
            assert_eq!(check_field(&q, None), None);
            assert_eq!(check_field(&q, Some(&Value::text(""))), None);
        }

        #[test]
        fn test_dropdown_none_sentinel_counts_as_empty() {
            let section: Section = serde_json::from_value(json!({
                "id": "s", "label": "S",
                "questions": [{"id": "country", "type": "select", "label": "Country",
                               "required": true, "options": ["Germany"]}]
            }))
            .unwrap();
            let q = section.question("country").unwrap();
            assert_eq!(
                check_field(q, Some(&Value::text("none"))),
                Some(FieldError::Required)
            );
        }
    }

    mod repeaters {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_errors_are_nested_per_group() {
            let mut session = session();
            for _ in 0..3 {
                assert!(session.add_group("experience").unwrap());
            }

            let errors = session.validate();
            let paths: Vec<String> = errors
                .paths()
                .into_iter()
                .filter(|(p, _)| p.question == "experience")
                .map(|(p, e)| format!("{p}: {e}"))
                .collect();

            assert_eq!(
                paths,
                vec![
                    "experience[0].title: required",
                    "experience[1].title: required",
                    "experience[2].title: required",
                ]
            );
            assert!(matches!(errors.get("experience"), Some(ErrorEntry::Groups(_))));
        }

        #[test]
        fn test_required_repeater_without_groups() {
            let section: Section = serde_json::from_value(json!({
                "id": "s", "label": "S",
                "questions": [{"id": "education", "type": "repeater", "label": "Education",
                               "required": true, "allowMultipleGroups": true,
                               "repeaterFields": [{"id": "school", "type": "text", "label": "School"}]}]
            }))
            .unwrap();
            let q = section.question("education").unwrap();
            assert_eq!(
                validate_question(q, None),
                Some(ErrorEntry::Field(FieldError::Required))
            );
        }
    }

    mod locked_email {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_google_email_is_exempt() {
            let session =
                FormSession::new(profile_section(), google_viewer(), &InitialData::new());
            let errors = session.validate();
            assert!(errors.get("email").is_none());
            assert!(errors.get("firstName").is_some());
        }

        #[test]
        fn test_password_email_is_validated() {
            let errors = session().validate();
            assert_eq!(
                errors.get("email"),
                Some(&ErrorEntry::Field(FieldError::Required))
            );
        }
    }
}
