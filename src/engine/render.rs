//! Field renderer
//!
//! Maps schema + session state to a view model. Rendering is pure: it only
//! reads the session, and every control names the [`FieldPath`] its edits
//! must be sent to.

use crate::schema::{FieldKind, Question};
use crate::state::{ErrorEntry, FieldError, FieldPath, FileValue, FormSession, Value};

/// Adjacent questions that share one two-column row
const PAIRED_ROWS: [(&str, &str); 2] = [("firstName", "lastName"), ("email", "phoneNumber")];

/// Where a field is being rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    TopLevel,
    Group { question: &'a str, index: usize },
}

impl Scope<'_> {
    fn path(&self, id: &str) -> FieldPath {
        match self {
            Scope::TopLevel => FieldPath::question(id),
            Scope::Group { question, index } => FieldPath::group_field(question, *index, id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnhanceButton {
    pub enabled: bool,
    pub in_flight: bool,
}

/// What a file control currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileDisplay {
    Empty,
    New {
        name: String,
        preview_url: Option<String>,
    },
    Existing {
        name: String,
        url: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupView {
    pub index: usize,
    pub fields: Vec<FieldView>,
    pub can_remove: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    Text {
        value: String,
        max_length: Option<usize>,
    },
    Textarea {
        value: String,
        max_length: Option<usize>,
        enhance: Option<EnhanceButton>,
    },
    Radio {
        options: Vec<Choice>,
    },
    MultiSelect {
        options: Vec<Choice>,
    },
    Dropdown {
        options: Vec<Choice>,
        selected: Option<String>,
    },
    File {
        accept: Vec<String>,
        current: FileDisplay,
    },
    Date {
        value: String,
    },
    Repeater {
        groups: Vec<GroupView>,
        can_add: bool,
    },
}

/// A renderable field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldView {
    pub path: FieldPath,
    pub label: String,
    pub description: Option<String>,
    pub required: bool,
    pub read_only: bool,
    pub error: Option<FieldError>,
    pub control: Control,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Single(FieldView),
    Pair(FieldView, FieldView),
}

impl Row {
    pub fn fields(&self) -> Vec<&FieldView> {
        match self {
            Row::Single(field) => vec![field],
            Row::Pair(left, right) => vec![left, right],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    pub rows: Vec<Row>,
    pub loading: bool,
    pub submit_error: Option<String>,
}

impl SectionView {
    /// Paths in keyboard focus order: every field, repeaters before their
    /// group fields
    pub fn focus_order(&self) -> Vec<FieldPath> {
        let mut order = Vec::new();
        for row in &self.rows {
            for field in row.fields() {
                order.push(field.path.clone());
                if let Control::Repeater { groups, .. } = &field.control {
                    for group in groups {
                        order.extend(group.fields.iter().map(|f| f.path.clone()));
                    }
                }
            }
        }
        order
    }

    /// Find a rendered field by path, searching inside repeater groups
    pub fn field(&self, path: &FieldPath) -> Option<&FieldView> {
        self.rows.iter().flat_map(Row::fields).find_map(|field| {
            if &field.path == path {
                return Some(field);
            }
            match &field.control {
                Control::Repeater { groups, .. } => groups
                    .iter()
                    .flat_map(|g| g.fields.iter())
                    .find(|f| &f.path == path),
                _ => None,
            }
        })
    }
}

/// Render one field; `None` when there is no descriptor to render
pub fn render_field(
    question: Option<&Question>,
    session: &FormSession,
    scope: Scope<'_>,
) -> Option<FieldView> {
    let question = question?;
    let path = scope.path(&question.id);
    let read_only = session.is_locked(&path);
    let value = session.read(&path);

    let control = match &question.kind {
        _ if read_only => Control::Text {
            value: value
                .and_then(Value::as_text)
                .or(session.viewer().email.as_deref())
                .unwrap_or_default()
                .to_string(),
            max_length: None,
        },
        FieldKind::Text(rules) => Control::Text {
            value: text_of(value),
            max_length: rules.max_length,
        },
        FieldKind::Textarea {
            rules,
            enable_rewrite,
        } => Control::Textarea {
            value: text_of(value),
            max_length: rules.max_length,
            enhance: enable_rewrite.then(|| EnhanceButton {
                enabled: session.can_enhance(&path),
                in_flight: session.is_enhancing(&path),
            }),
        },
        FieldKind::Radio { options } => Control::Radio {
            options: single_choices(options, value),
        },
        FieldKind::MultiSelect { options } => {
            let selected = value.and_then(Value::as_multi).unwrap_or_default();
            Control::MultiSelect {
                options: options
                    .iter()
                    .map(|o| Choice {
                        label: o.clone(),
                        selected: selected.contains(o),
                    })
                    .collect(),
            }
        }
        FieldKind::Dropdown { options } => Control::Dropdown {
            options: single_choices(options, value),
            selected: value.and_then(Value::as_text).map(str::to_string),
        },
        FieldKind::File { file_types } => Control::File {
            accept: file_types.clone(),
            current: match value.and_then(Value::as_file) {
                None => FileDisplay::Empty,
                Some(FileValue::New(handle)) => FileDisplay::New {
                    name: handle.name.clone(),
                    preview_url: session.preview_url(&path).map(str::to_string),
                },
                Some(existing @ FileValue::Existing { url, .. }) => FileDisplay::Existing {
                    name: existing.display_name().to_string(),
                    url: url.clone(),
                },
            },
        },
        FieldKind::Date => Control::Date {
            value: text_of(value),
        },
        FieldKind::Repeater(spec) => {
            // A repeater never nests, so groups only exist at the top level
            let count = session.group_count(&question.id);
            let can_remove = spec.allow_multiple && count > 1;
            let groups = (0..count)
                .map(|index| GroupView {
                    index,
                    fields: spec
                        .fields
                        .iter()
                        .filter_map(|field| {
                            render_field(
                                Some(field),
                                session,
                                Scope::Group {
                                    question: &question.id,
                                    index,
                                },
                            )
                        })
                        .collect(),
                    can_remove,
                })
                .collect();
            Control::Repeater {
                groups,
                can_add: spec.allow_multiple && count < spec.max_groups,
            }
        }
    };

    let error = match (&path.group, session.errors().get(&path.question)) {
        (None, Some(ErrorEntry::Field(err))) => Some(*err),
        (Some(_), _) => session.errors().for_path(&path),
        _ => None,
    };

    Some(FieldView {
        path,
        label: question.label.clone(),
        description: question.description.clone(),
        required: question.required && !read_only,
        read_only,
        error,
        control,
    })
}

/// Render the whole section, merging the fixed column pairs into one row
pub fn render_section(session: &FormSession) -> SectionView {
    let section = session.section();
    let mut rows = Vec::with_capacity(section.questions.len());
    let mut questions = section.questions.iter().peekable();

    while let Some(question) = questions.next() {
        let Some(view) = render_field(Some(question), session, Scope::TopLevel) else {
            continue;
        };
        let pairs_with_next = questions.peek().is_some_and(|next| {
            PAIRED_ROWS
                .iter()
                .any(|(left, right)| question.id == *left && next.id == *right)
        });
        if pairs_with_next {
            let partner = questions
                .next()
                .and_then(|next| render_field(Some(next), session, Scope::TopLevel));
            if let Some(partner) = partner {
                rows.push(Row::Pair(view, partner));
                continue;
            }
        }
        rows.push(Row::Single(view));
    }

    SectionView {
        id: section.id.clone(),
        label: section.label.clone(),
        description: section.description.clone(),
        rows,
        loading: session.is_loading(),
        submit_error: session.errors().submit().map(str::to_string),
    }
}

fn text_of(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_text)
        .unwrap_or_default()
        .to_string()
}

fn single_choices(options: &[String], value: Option<&Value>) -> Vec<Choice> {
    let selected = value.and_then(Value::as_text);
    options
        .iter()
        .map(|o| Choice {
            label: o.clone(),
            selected: selected == Some(o.as_str()),
        })
        .collect()
}
