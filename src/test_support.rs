//! Shared fixtures for unit tests

use serde_json::json;

use crate::schema::Section;
use crate::state::{FormSession, IdentityProvider, InitialData, Viewer};

/// A profile section exercising every field kind
pub fn profile_section() -> Section {
    serde_json::from_value(json!({
        "id": "profile",
        "label": "Profile",
        "description": "Tell employers about yourself",
        "questions": [
            {"id": "firstName", "type": "text", "label": "First name", "required": true,
             "validation": {"maxLength": 30}},
            {"id": "lastName", "type": "text", "label": "Last name"},
            {"id": "email", "type": "text", "label": "Email", "required": true,
             "validation": {"pattern": "^[^@\\s]+@[^@\\s]+\\.[^@\\s]+$"}},
            {"id": "phoneNumber", "type": "text", "label": "Phone"},
            {"id": "summary", "type": "text", "inputType": "textarea", "label": "Summary",
             "enableRewrite": true, "validation": {"maxLength": 200}},
            {"id": "workType", "type": "radio", "label": "Work type",
             "options": ["remote", "hybrid", "onsite"]},
            {"id": "skills", "type": "checkbox", "label": "Skills",
             "options": ["rust", "go", "sql"]},
            {"id": "country", "type": "dropdown", "label": "Country",
             "options": ["Germany", "France"]},
            {"id": "resume", "type": "file", "label": "Resume",
             "validation": {"fileTypes": ["application/pdf", ".docx"]}},
            {"id": "availableFrom", "type": "date", "label": "Available from"},
            {"id": "experience", "type": "repeater", "label": "Experience",
             "allowMultipleGroups": true, "validation": {"maxGroups": 3},
             "repeaterFields": [
                {"id": "title", "type": "text", "label": "Title", "required": true},
                {"id": "company", "type": "text", "label": "Company"},
                {"id": "description", "type": "text", "inputType": "textarea",
                 "label": "Description", "enableRewrite": true},
                {"id": "logo", "type": "file", "label": "Logo",
                 "validation": {"fileTypes": ["image/png", "image/jpeg"]}}
             ]}
        ]
    }))
    .expect("fixture section parses")
}

/// Session over [`profile_section`] for a password account with no stored data
pub fn session() -> FormSession {
    FormSession::new(profile_section(), password_viewer(), &InitialData::new())
}

pub fn password_viewer() -> Viewer {
    Viewer::new("user-1", Some("ada@example.com"), IdentityProvider::Password)
}

pub fn google_viewer() -> Viewer {
    Viewer::new("user-2", Some("ada@gmail.com"), IdentityProvider::Google)
}
