//! Form state store
//!
//! [`FormSession`] owns the runtime state of one rendered section. Every
//! mutation goes through one of its methods; the renderer only reads it.

use std::collections::{HashMap, HashSet};

use super::errors::{FieldError, FormErrors};
use super::field::{FileHandle, FileValue, Group, Value, Values};
use super::path::FieldPath;
use super::previews::PreviewCache;
use crate::engine::file_type_allowed;
use crate::error::EngineError;
use crate::schema::{FieldKind, Question, Section};
use crate::state::Viewer;

/// Stored profile data a section is seeded from, keyed by question id
pub type InitialData = serde_json::Map<String, serde_json::Value>;

/// Sentinel a dropdown uses for "nothing selected"
pub const DROPDOWN_NONE: &str = "none";

/// Runtime values, errors and in-flight flags of one section instance
#[derive(Debug)]
pub struct FormSession {
    section: Section,
    viewer: Viewer,
    values: Values,
    errors: FormErrors,
    pub(crate) loading: bool,
    pub(crate) enhancing: HashSet<FieldPath>,
    previews: PreviewCache,
    /// Bumped whenever the schema is replaced; tickets from older epochs are stale
    pub(crate) epoch: u64,
    /// Per repeater, a stable id for each group in order; ids are minted
    /// lazily, so the list is always a prefix of the group array
    group_ids: HashMap<String, Vec<u64>>,
    next_group_id: u64,
}

impl FormSession {
    pub fn new(section: Section, viewer: Viewer, initial: &InitialData) -> Self {
        let values = seed_values(&section, initial);
        tracing::debug!(section = %section.id, seeded = values.len(), "form session created");
        Self {
            section,
            viewer,
            values,
            errors: FormErrors::new(),
            loading: false,
            enhancing: HashSet::new(),
            previews: PreviewCache::new(),
            epoch: 0,
            group_ids: HashMap::new(),
            next_group_id: 0,
        }
    }

    /// Swap in a new schema; all runtime state is rebuilt from `initial`
    pub fn replace_section(&mut self, section: Section, initial: &InitialData) {
        tracing::debug!(from = %self.section.id, to = %section.id, "replacing section schema");
        self.previews.release_all();
        self.values = seed_values(&section, initial);
        self.section = section;
        self.errors.clear();
        self.loading = false;
        self.enhancing.clear();
        self.group_ids.clear();
        self.epoch += 1;
    }

    /// Tear the session down, returning preview URLs the host must revoke
    pub fn discard(mut self) -> Vec<String> {
        self.previews.release_all();
        self.previews.drain_released()
    }

    pub fn section(&self) -> &Section {
        &self.section
    }

    pub fn viewer(&self) -> &Viewer {
        &self.viewer
    }

    pub fn values(&self) -> &Values {
        &self.values
    }

    pub fn value(&self, question: &str) -> Option<&Value> {
        self.values.get(question)
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut FormErrors {
        &mut self.errors
    }

    pub(crate) fn previews_mut(&mut self) -> &mut PreviewCache {
        &mut self.previews
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_enhancing(&self, path: &FieldPath) -> bool {
        self.enhancing.contains(path)
    }

    pub fn preview_url(&self, path: &FieldPath) -> Option<&str> {
        self.previews.get(path)
    }

    /// Preview URLs released since the last call; the host revokes them
    pub fn drain_released_previews(&mut self) -> Vec<String> {
        self.previews.drain_released()
    }

    /// Whether the field at `path` is read-only for this viewer
    pub fn is_locked(&self, path: &FieldPath) -> bool {
        path.group.is_none() && self.viewer.locks(&path.question)
    }

    /// Schema entry the path points at
    pub fn spec(&self, path: &FieldPath) -> Result<&Question, EngineError> {
        let question = self
            .section
            .question(&path.question)
            .ok_or_else(|| EngineError::UnknownQuestion(path.question.clone()))?;
        let Some(slot) = &path.group else {
            return Ok(question);
        };
        let repeater = question
            .repeater()
            .ok_or_else(|| EngineError::NotARepeater(path.question.clone()))?;
        repeater
            .field(&slot.field)
            .ok_or_else(|| EngineError::UnknownField {
                question: path.question.clone(),
                field: slot.field.clone(),
            })
    }

    /// Current value at the path
    pub fn read(&self, path: &FieldPath) -> Option<&Value> {
        let value = self.values.get(&path.question)?;
        match &path.group {
            None => Some(value),
            Some(slot) => value.as_groups()?.get(slot.index)?.get(&slot.field),
        }
    }

    /// Stable id of group `index`, minting ids up to it on first use
    pub(crate) fn group_id(&mut self, question: &str, index: usize) -> Option<u64> {
        if index >= self.group_count(question) {
            return None;
        }
        let ids = self.group_ids.entry(question.to_string()).or_default();
        while ids.len() <= index {
            ids.push(self.next_group_id);
            self.next_group_id += 1;
        }
        Some(ids[index])
    }

    /// Current index of the group with stable id `id`
    pub(crate) fn group_index_of(&self, question: &str, id: u64) -> Option<usize> {
        self.group_ids.get(question)?.iter().position(|&g| g == id)
    }

    /// Drop the stable id of a removed group; later ids move down with
    /// their groups
    pub(crate) fn forget_group_id(&mut self, question: &str, removed: usize) {
        if let Some(ids) = self.group_ids.get_mut(question) {
            if removed < ids.len() {
                ids.remove(removed);
            }
        }
    }

    pub fn group_count(&self, question: &str) -> usize {
        self.values
            .get(question)
            .and_then(Value::as_groups)
            .map_or(0, <[Group]>::len)
    }

    /// Text edit for text, textarea, radio, dropdown and date fields
    ///
    /// Text is capped at `maxLength` characters. An empty radio/dropdown
    /// selection (or the dropdown's "none" sentinel) clears the value.
    pub fn input_change(&mut self, path: &FieldPath, text: &str) -> Result<(), EngineError> {
        if self.is_locked(path) {
            return Err(EngineError::ReadOnly(path.to_string()));
        }

        let value = {
            let question = self.spec(path)?;
            match &question.kind {
                FieldKind::Text(rules) | FieldKind::Textarea { rules, .. } => {
                    Some(Value::Text(clip(text, rules.max_length)))
                }
                FieldKind::Date => Some(Value::text(text)),
                FieldKind::Radio { options } => choose(path, options, text, false)?,
                FieldKind::Dropdown { options } => choose(path, options, text, true)?,
                _ => {
                    return Err(EngineError::KindMismatch {
                        path: path.clone(),
                        attempted: "text",
                    })
                }
            }
        };

        self.write(path, value)?;
        self.errors.clear_path(path);
        Ok(())
    }

    /// Add or remove one option of a multi-select field
    pub fn toggle_option(&mut self, path: &FieldPath, option: &str) -> Result<(), EngineError> {
        let FieldKind::MultiSelect { options } = &self.spec(path)?.kind else {
            return Err(EngineError::KindMismatch {
                path: path.clone(),
                attempted: "multi-select",
            });
        };
        if !options.iter().any(|o| o == option) {
            return Err(EngineError::UnknownOption {
                path: path.clone(),
                option: option.to_string(),
            });
        }

        let mut selected = self
            .read(path)
            .and_then(Value::as_multi)
            .map(<[String]>::to_vec)
            .unwrap_or_default();
        if let Some(pos) = selected.iter().position(|s| s == option) {
            selected.remove(pos);
        } else {
            selected.push(option.to_string());
        }

        self.write(path, Some(Value::Multi(selected)))?;
        self.errors.clear_path(path);
        Ok(())
    }

    /// Select a new file or clear the field with `None`
    ///
    /// A file whose type is not accepted leaves the value untouched and
    /// records an `unsupported file type` error, which is also returned.
    pub fn file_change(
        &mut self,
        path: &FieldPath,
        file: Option<FileHandle>,
    ) -> Result<Option<FieldError>, EngineError> {
        let FieldKind::File { file_types } = &self.spec(path)?.kind else {
            return Err(EngineError::KindMismatch {
                path: path.clone(),
                attempted: "file",
            });
        };

        let Some(file) = file else {
            self.write(path, None)?;
            self.previews.release(path);
            self.errors.clear_path(path);
            return Ok(None);
        };

        if !file_type_allowed(file_types, &file) {
            tracing::debug!(%path, mime = %file.mime_type, name = %file.name, "rejected file type");
            self.errors.set(path, FieldError::UnsupportedFileType);
            return Ok(Some(FieldError::UnsupportedFileType));
        }

        self.write(path, Some(Value::File(FileValue::New(file.clone()))))?;
        self.previews.url_for(path, &file);
        self.errors.clear_path(path);
        Ok(None)
    }

    /// Store or clear the value at `path`
    pub(crate) fn write(&mut self, path: &FieldPath, value: Option<Value>) -> Result<(), EngineError> {
        match &path.group {
            None => {
                match value {
                    Some(v) => self.values.insert(path.question.clone(), v),
                    None => self.values.remove(&path.question),
                };
            }
            Some(slot) => {
                let group = self.group_mut(&path.question, slot.index)?;
                match value {
                    Some(v) => group.insert(slot.field.clone(), v),
                    None => group.remove(&slot.field),
                };
            }
        }
        Ok(())
    }

    /// Group array of a repeater question, created empty on first access
    pub(crate) fn groups_mut(&mut self, question: &str) -> Result<&mut Vec<Group>, EngineError> {
        let spec = self
            .section
            .question(question)
            .ok_or_else(|| EngineError::UnknownQuestion(question.to_string()))?;
        if spec.repeater().is_none() {
            return Err(EngineError::NotARepeater(question.to_string()));
        }

        let entry = self
            .values
            .entry(question.to_string())
            .or_insert_with(|| Value::Groups(Vec::new()));
        if !matches!(entry, Value::Groups(_)) {
            *entry = Value::Groups(Vec::new());
        }
        match entry {
            Value::Groups(groups) => Ok(groups),
            _ => Err(EngineError::NotARepeater(question.to_string())),
        }
    }

    pub(crate) fn group_mut(&mut self, question: &str, index: usize) -> Result<&mut Group, EngineError> {
        let groups = self.groups_mut(question)?;
        let len = groups.len();
        groups.get_mut(index).ok_or_else(|| EngineError::IndexOutOfRange {
            question: question.to_string(),
            index,
            len,
        })
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        if !self.previews.is_empty() {
            tracing::debug!(
                section = %self.section.id,
                previews = self.previews.len(),
                "form session dropped with live previews"
            );
        }
    }
}

/// Build values from stored data; single-group repeaters always hold their
/// one group so its fields can be rendered
fn seed_values(section: &Section, initial: &InitialData) -> Values {
    let mut values = Values::new();
    for question in &section.questions {
        let Some(raw) = initial.get(&question.id) else {
            if question.repeater().is_some_and(|spec| !spec.allow_multiple) {
                values.insert(question.id.clone(), Value::Groups(vec![Group::new()]));
            }
            continue;
        };
        match Value::from_json(question, raw) {
            Some(value) => {
                values.insert(question.id.clone(), value);
            }
            None => {
                tracing::debug!(question = %question.id, "dropping stored value of unexpected shape")
            }
        }
    }
    values
}

/// Cap `text` at `max` characters
fn clip(text: &str, max: Option<usize>) -> String {
    match max {
        Some(max) => text.chars().take(max).collect(),
        None => text.to_string(),
    }
}

/// Validate a single-choice selection against the option list
fn choose(
    path: &FieldPath,
    options: &[String],
    text: &str,
    allow_none_sentinel: bool,
) -> Result<Option<Value>, EngineError> {
    if text.is_empty() || (allow_none_sentinel && text == DROPDOWN_NONE) {
        return Ok(None);
    }
    if options.iter().any(|o| o == text) {
        Ok(Some(Value::text(text)))
    } else {
        Err(EngineError::UnknownOption {
            path: path.clone(),
            option: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::IdentityProvider;
    use crate::test_support::{google_viewer, profile_section, session};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    mod seeding {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_initial_values_are_coerced() {
            let initial = json!({
                "firstName": "Ada",
                "skills": ["rust"],
                "resume": "https://cdn/cv.pdf",
                "unknownQuestion": "ignored",
                "experience": [{"title": "Engineer"}]
            });
            let session = FormSession::new(
                profile_section(),
                Viewer::default(),
                initial.as_object().unwrap(),
            );

            assert_eq!(session.value("firstName"), Some(&Value::text("Ada")));
            assert!(session.value("unknownQuestion").is_none());
            assert_eq!(session.group_count("experience"), 1);
            assert!(session.errors().is_empty());
        }

        #[test]
        fn test_replace_section_bumps_epoch_and_resets() {
            let mut session = session();
            session.input_change(&FieldPath::question("firstName"), "Ada").unwrap();
            session.loading = true;

            session.replace_section(profile_section(), &InitialData::new());

            assert_eq!(session.epoch, 1);
            assert!(!session.is_loading());
            assert!(session.values().is_empty());
        }
    }

    mod text_input {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_input_replaces_value() {
            let mut session = session();
            let path = FieldPath::question("firstName");
            session.input_change(&path, "Ad").unwrap();
            session.input_change(&path, "Ada").unwrap();
            assert_eq!(session.read(&path), Some(&Value::text("Ada")));
        }

        #[test]
        fn test_input_is_capped_at_max_length() {
            let mut session = session();
            let path = FieldPath::question("firstName");
            let long = "x".repeat(45);
            session.input_change(&path, &long).unwrap();
            assert_eq!(session.read(&path).unwrap().as_text().unwrap().len(), 30);
        }

        #[test]
        fn test_edit_clears_field_error() {
            let mut session = session();
            let path = FieldPath::question("firstName");
            session.errors_mut().set(&path, FieldError::Required);
            session.input_change(&path, "Ada").unwrap();
            assert!(session.errors().for_path(&path).is_none());
        }

        #[test]
        fn test_locked_email_rejects_edits() {
            let mut session = FormSession::new(profile_section(), google_viewer(), &InitialData::new());
            let err = session
                .input_change(&FieldPath::question("email"), "x@y.z")
                .unwrap_err();
            assert_eq!(err, EngineError::ReadOnly("email".to_string()));
        }

        #[test]
        fn test_email_editable_for_password_accounts() {
            let mut session = session();
            assert_eq!(session.viewer().provider, IdentityProvider::Password);
            session
                .input_change(&FieldPath::question("email"), "ada@example.com")
                .unwrap();
        }

        #[test]
        fn test_text_edit_on_multiselect_is_mismatch() {
            let mut session = session();
            let err = session
                .input_change(&FieldPath::question("skills"), "rust")
                .unwrap_err();
            assert!(matches!(err, EngineError::KindMismatch { attempted: "text", .. }));
        }

        #[test]
        fn test_unknown_question() {
            let mut session = session();
            let err = session
                .input_change(&FieldPath::question("nope"), "x")
                .unwrap_err();
            assert_eq!(err, EngineError::UnknownQuestion("nope".to_string()));
        }
    }

    mod choices {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_radio_accepts_option_and_clears_on_empty() {
            let mut session = session();
            let path = FieldPath::question("workType");
            session.input_change(&path, "remote").unwrap();
            assert_eq!(session.read(&path), Some(&Value::text("remote")));
            session.input_change(&path, "").unwrap();
            assert!(session.read(&path).is_none());
        }

        #[test]
        fn test_radio_rejects_unknown_option() {
            let mut session = session();
            let err = session
                .input_change(&FieldPath::question("workType"), "mars")
                .unwrap_err();
            assert!(matches!(err, EngineError::UnknownOption { .. }));
        }

        #[test]
        fn test_dropdown_none_sentinel_clears() {
            let mut session = session();
            let path = FieldPath::question("country");
            session.input_change(&path, "Germany").unwrap();
            session.input_change(&path, DROPDOWN_NONE).unwrap();
            assert!(session.read(&path).is_none());
        }

        #[test]
        fn test_toggle_keeps_selection_order() {
            let mut session = session();
            let path = FieldPath::question("skills");
            session.toggle_option(&path, "sql").unwrap();
            session.toggle_option(&path, "rust").unwrap();
            session.toggle_option(&path, "go").unwrap();
            session.toggle_option(&path, "rust").unwrap();
            assert_eq!(
                session.read(&path),
                Some(&Value::Multi(vec!["sql".into(), "go".into()]))
            );
        }
    }

    mod files {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_accepted_file_gets_preview() {
            let mut session = session();
            let path = FieldPath::question("resume");
            let outcome = session
                .file_change(&path, Some(FileHandle::new("cv.pdf", "application/pdf", 2048)))
                .unwrap();

            assert!(outcome.is_none());
            assert!(matches!(
                session.read(&path),
                Some(Value::File(FileValue::New(_)))
            ));
            assert!(session.preview_url(&path).is_some());
        }

        #[test]
        fn test_rejected_file_leaves_value() {
            let mut session = session();
            let path = FieldPath::group_field("experience", 0, "logo");
            session.add_group("experience").unwrap();

            let outcome = session
                .file_change(&path, Some(FileHandle::new("logo.pdf", "application/pdf", 10)))
                .unwrap();

            assert_eq!(outcome, Some(FieldError::UnsupportedFileType));
            assert!(session.read(&path).is_none());
            assert_eq!(
                session.errors().for_path(&path),
                Some(FieldError::UnsupportedFileType)
            );
        }

        #[test]
        fn test_clearing_file_releases_preview() {
            let mut session = session();
            let path = FieldPath::question("resume");
            session
                .file_change(&path, Some(FileHandle::new("cv.pdf", "application/pdf", 1)))
                .unwrap();
            session.file_change(&path, None).unwrap();

            assert!(session.read(&path).is_none());
            assert!(session.preview_url(&path).is_none());
            assert_eq!(session.drain_released_previews().len(), 1);
        }

        #[test]
        fn test_discard_returns_live_previews() {
            let mut session = session();
            session
                .file_change(
                    &FieldPath::question("resume"),
                    Some(FileHandle::new("cv.pdf", "application/pdf", 1)),
                )
                .unwrap();
            assert_eq!(session.discard().len(), 1);
        }
    }

    #[test]
    fn test_group_field_write_out_of_range() {
        let mut session = session();
        let err = session
            .input_change(&FieldPath::group_field("experience", 0, "title"), "x")
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::IndexOutOfRange {
                question: "experience".to_string(),
                index: 0,
                len: 0,
            }
        );
    }

    #[test]
    fn test_clip_counts_chars() {
        assert_eq!(clip("héllo", Some(2)), "hé");
        assert_eq!(clip("héllo", None), "héllo");
    }
}
