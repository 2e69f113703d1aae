//! Section store backed by JSON files in a local directory
//!
//! Each section is kept in `<dir>/<section_id>.json`. Writes go to a
//! temporary file first and are renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::traits::SectionStore;
use crate::error::ServiceError;
use crate::state::{Group, InitialData, Value, Values};

pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn section_path(&self, section_id: &str) -> Result<PathBuf, ServiceError> {
        let valid = !section_id.is_empty()
            && section_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ServiceError::new(
                "storage/invalid-section",
                format!("section id `{section_id}` is not a valid file name"),
            ));
        }
        Ok(self.dir.join(format!("{section_id}.json")))
    }
}

/// Values as written to disk: new files become `{name, url}` references
fn stored_values(values: &Values) -> Result<Values, ServiceError> {
    values
        .iter()
        .map(|(id, value)| Ok((id.clone(), stored_value(id, value)?)))
        .collect()
}

fn stored_value(id: &str, value: &Value) -> Result<Value, ServiceError> {
    match value {
        Value::File(file) => file.persisted().map(Value::File).ok_or_else(|| {
            ServiceError::new(
                "storage/file-source",
                format!("`{id}` holds a file with no readable source"),
            )
        }),
        Value::Groups(groups) => groups
            .iter()
            .map(|group| {
                group
                    .iter()
                    .map(|(field, v)| Ok((field.clone(), stored_value(field, v)?)))
                    .collect::<Result<Group, ServiceError>>()
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Groups),
        other => Ok(other.clone()),
    }
}

fn io_error(err: std::io::Error) -> ServiceError {
    ServiceError::new("storage/unavailable", err.to_string())
}

#[async_trait]
impl SectionStore for JsonFileStore {
    async fn load(&self, section_id: &str) -> Result<InitialData, ServiceError> {
        let path = self.section_path(section_id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(section = section_id, "no stored data yet");
                return Ok(InitialData::new());
            }
            Err(e) => return Err(io_error(e)),
        };
        serde_json::from_str(&content)
            .map_err(|e| ServiceError::new("storage/corrupt", format!("{}: {e}", path.display())))
    }

    async fn save(&self, section_id: &str, values: &Values) -> Result<(), ServiceError> {
        let path = self.section_path(section_id)?;
        tokio::fs::create_dir_all(&self.dir).await.map_err(io_error)?;

        let stored = stored_values(values)?;
        let content = serde_json::to_string_pretty(&stored)
            .map_err(|e| ServiceError::new("storage/encode", e.to_string()))?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(io_error)?;
        tokio::fs::rename(&tmp, &path).await.map_err(io_error)?;

        tracing::info!(section = section_id, path = %path.display(), "saved section");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn temp_store() -> JsonFileStore {
        let dir = std::env::temp_dir().join(format!("dossier-test-{}", uuid::Uuid::new_v4()));
        JsonFileStore::new(dir)
    }

    #[tokio::test]
    async fn test_load_missing_section_is_empty() {
        let store = temp_store();
        let data = store.load("profile").await.unwrap();
        assert!(data.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = temp_store();
        let mut values = Values::new();
        values.insert("firstName".to_string(), Value::text("Ada"));
        values.insert(
            "skills".to_string(),
            Value::Multi(vec!["rust".to_string()]),
        );

        store.save("profile", &values).await.unwrap();
        let data = store.load("profile").await.unwrap();

        assert_eq!(serde_json::Value::Object(data), json!({"firstName": "Ada", "skills": ["rust"]}));
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_new_files_reload_as_existing_references() {
        use crate::state::{FieldPath, FileHandle, FileValue, FormSession};
        use crate::test_support::{password_viewer, profile_section, session};

        let store = temp_store();
        let mut session = session();
        let resume = FileHandle::new("cv.pdf", "application/pdf", 10)
            .with_source("file:///home/ada/cv.pdf");
        session
            .file_change(&FieldPath::question("resume"), Some(resume))
            .unwrap();
        session.add_group("experience").unwrap();
        session
            .input_change(&FieldPath::group_field("experience", 0, "title"), "Engineer")
            .unwrap();
        let logo = FileHandle::new("acme.png", "image/png", 4).with_source("file:///tmp/acme.png");
        session
            .file_change(&FieldPath::group_field("experience", 0, "logo"), Some(logo))
            .unwrap();
        session
            .input_change(&FieldPath::question("firstName"), "Ada")
            .unwrap();
        session
            .input_change(&FieldPath::question("email"), "ada@example.com")
            .unwrap();

        let ticket = session.begin_submit().unwrap();
        store.save(&ticket.section_id, &ticket.values).await.unwrap();
        let reloaded = FormSession::new(
            profile_section(),
            password_viewer(),
            &store.load("profile").await.unwrap(),
        );

        assert_eq!(
            reloaded.value("resume"),
            Some(&Value::File(FileValue::Existing {
                name: Some("cv.pdf".to_string()),
                url: "file:///home/ada/cv.pdf".to_string(),
            }))
        );
        assert_eq!(
            reloaded.read(&FieldPath::group_field("experience", 0, "logo")),
            Some(&Value::File(FileValue::Existing {
                name: Some("acme.png".to_string()),
                url: "file:///tmp/acme.png".to_string(),
            }))
        );
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_file_without_source_is_not_saved() {
        use crate::state::{FileHandle, FileValue};

        let store = temp_store();
        let mut values = Values::new();
        values.insert(
            "resume".to_string(),
            Value::File(FileValue::New(FileHandle::new("cv.pdf", "application/pdf", 1))),
        );

        let err = store.save("profile", &values).await.unwrap_err();

        assert_eq!(err.code, "storage/file-source");
        assert!(!store.dir().join("profile.json").exists());
        let _ = std::fs::remove_dir_all(store.dir());
    }

    #[tokio::test]
    async fn test_rejects_path_like_section_ids() {
        let store = temp_store();
        let err = store.save("../etc", &Values::new()).await.unwrap_err();
        assert_eq!(err.code, "storage/invalid-section");
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let store = temp_store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("profile.json"), "not json").unwrap();

        let err = store.load("profile").await.unwrap_err();
        assert_eq!(err.code, "storage/corrupt");
        let _ = std::fs::remove_dir_all(store.dir());
    }
}
