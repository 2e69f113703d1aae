//! Addressing of fields inside a section

use std::fmt;

/// Position of a field inside one repeater group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupSlot {
    pub index: usize,
    pub field: String,
}

/// Address of an editable field: a top-level question, or a field inside
/// one group of a repeater question
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath {
    pub question: String,
    pub group: Option<GroupSlot>,
}

impl FieldPath {
    pub fn question(id: &str) -> Self {
        Self {
            question: id.to_string(),
            group: None,
        }
    }

    pub fn group_field(question: &str, index: usize, field: &str) -> Self {
        Self {
            question: question.to_string(),
            group: Some(GroupSlot {
                index,
                field: field.to_string(),
            }),
        }
    }

    pub fn group_index(&self) -> Option<usize> {
        self.group.as_ref().map(|slot| slot.index)
    }

    /// Where this path points after group `removed` of `question` is
    /// deleted: `None` inside the removed group, one index down after it
    pub fn after_group_removal(&self, question: &str, removed: usize) -> Option<FieldPath> {
        match &self.group {
            Some(slot) if self.question == question && slot.index == removed => None,
            Some(slot) if self.question == question && slot.index > removed => {
                Some(FieldPath::group_field(question, slot.index - 1, &slot.field))
            }
            _ => Some(self.clone()),
        }
    }

    /// Id of the innermost field this path points at
    pub fn leaf_id(&self) -> &str {
        self.group
            .as_ref()
            .map(|slot| slot.field.as_str())
            .unwrap_or(&self.question)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.group {
            None => write!(f, "{}", self.question),
            Some(slot) => write!(f, "{}[{}].{}", self.question, slot.index, slot.field),
        }
    }
}
