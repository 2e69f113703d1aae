//! Preview URLs for newly selected files
//!
//! A preview URL is minted once per selected file and reused across
//! re-renders. URLs that are superseded or whose field goes away are moved to
//! a release queue; the host drains that queue and revokes them.

use std::collections::HashMap;

use uuid::Uuid;

use super::field::FileHandle;
use super::path::FieldPath;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PreviewEntry {
    file_id: Uuid,
    url: String,
}

#[derive(Debug, Default)]
pub struct PreviewCache {
    entries: HashMap<FieldPath, PreviewEntry>,
    released: Vec<String>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preview URL for `file` at `path`, minting one only if the cached entry
    /// belongs to a different file
    pub fn url_for(&mut self, path: &FieldPath, file: &FileHandle) -> &str {
        let stale = self
            .entries
            .get(path)
            .is_some_and(|entry| entry.file_id != file.id);
        if stale {
            self.release(path);
        }
        let entry = self.entries.entry(path.clone()).or_insert_with(|| {
            let url = format!("blob:dossier/{}", Uuid::new_v4());
            tracing::debug!(%path, %url, "minted file preview");
            PreviewEntry {
                file_id: file.id,
                url,
            }
        });
        &entry.url
    }

    pub fn get(&self, path: &FieldPath) -> Option<&str> {
        self.entries.get(path).map(|entry| entry.url.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Release the preview at `path`, if any
    pub fn release(&mut self, path: &FieldPath) {
        if let Some(entry) = self.entries.remove(path) {
            self.released.push(entry.url);
        }
    }

    /// Follow a group removal: release previews of the removed group and
    /// re-key previews of later groups one index down
    pub fn remove_group(&mut self, question: &str, removed: usize) {
        let affected: Vec<FieldPath> = self
            .entries
            .keys()
            .filter(|p| {
                p.question == question && p.group_index().is_some_and(|index| index >= removed)
            })
            .cloned()
            .collect();

        let mut moved = Vec::new();
        for path in affected {
            let Some(entry) = self.entries.remove(&path) else {
                continue;
            };
            match path.group {
                Some(slot) if slot.index > removed => {
                    moved.push((FieldPath::group_field(question, slot.index - 1, &slot.field), entry));
                }
                _ => self.released.push(entry.url),
            }
        }
        self.entries.extend(moved);
    }

    /// Release every preview, e.g. when the form is discarded
    pub fn release_all(&mut self) {
        let urls = self.entries.drain().map(|(_, entry)| entry.url);
        self.released.extend(urls);
    }

    /// URLs the host must revoke
    pub fn drain_released(&mut self) -> Vec<String> {
        std::mem::take(&mut self.released)
    }
}
