//! Group repeater controller

use crate::error::EngineError;
use crate::schema::RepeaterSpec;
use crate::state::{FieldPath, FormSession, Group, Value};

impl FormSession {
    fn repeater_spec(&self, question: &str) -> Result<&RepeaterSpec, EngineError> {
        self.section()
            .question(question)
            .ok_or_else(|| EngineError::UnknownQuestion(question.to_string()))?
            .repeater()
            .ok_or_else(|| EngineError::NotARepeater(question.to_string()))
    }

    /// Append an empty group
    ///
    /// Returns `Ok(false)` without changing anything when the repeater is
    /// already at its capacity.
    pub fn add_group(&mut self, question: &str) -> Result<bool, EngineError> {
        let capacity = self.repeater_spec(question)?.capacity();
        let groups = self.groups_mut(question)?;
        if groups.len() >= capacity {
            tracing::debug!(question, capacity, "group ceiling reached");
            return Ok(false);
        }
        groups.push(Group::new());
        let count = groups.len();

        self.errors_mut().clear_question_level(question);
        tracing::debug!(question, groups = count, "added group");
        Ok(true)
    }

    /// Remove the group at `index`, shifting later groups down
    ///
    /// Only multi-group repeaters with more than one group can shrink; the
    /// last remaining group is kept and `Ok(false)` is returned.
    pub fn remove_group(&mut self, question: &str, index: usize) -> Result<bool, EngineError> {
        let allow_multiple = self.repeater_spec(question)?.allow_multiple;
        let groups = self.groups_mut(question)?;
        let len = groups.len();
        if index >= len {
            tracing::warn!(question, index, len, "remove_group out of range");
            return Err(EngineError::IndexOutOfRange {
                question: question.to_string(),
                index,
                len,
            });
        }
        if !allow_multiple || len <= 1 {
            tracing::debug!(question, "keeping last group");
            return Ok(false);
        }
        groups.remove(index);

        self.errors_mut().remove_group(question, index);
        self.previews_mut().remove_group(question, index);
        self.enhancing = std::mem::take(&mut self.enhancing)
            .into_iter()
            .filter_map(|path| path.after_group_removal(question, index))
            .collect();
        self.forget_group_id(question, index);

        tracing::debug!(question, index, groups = len - 1, "removed group");
        Ok(true)
    }

    /// Set one field of one group
    pub fn set_group_field(
        &mut self,
        question: &str,
        index: usize,
        field: &str,
        value: Value,
    ) -> Result<(), EngineError> {
        let path = FieldPath::group_field(question, index, field);
        if !value.fits(&self.spec(&path)?.kind) {
            return Err(EngineError::KindMismatch {
                attempted: value_kind(&value),
                path,
            });
        }

        self.write(&path, Some(value)).inspect_err(|err| {
            tracing::warn!(%path, %err, "set_group_field rejected");
        })?;
        self.errors_mut().clear_path(&path);
        Ok(())
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Text(_) => "text",
        Value::Multi(_) => "multi-select",
        Value::File(_) => "file",
        Value::Groups(_) => "groups",
    }
}
