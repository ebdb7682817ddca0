//! Durable record of which chapters have been translated.
//!
//! The record is a small JSON document (`{"translated_indices": [..]}`)
//! that is rewritten whole after every completed chapter. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a crash mid-write leaves the previous record intact.

use crate::error::ProgressError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Set of chapter ids already translated and appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(default)]
    translated_indices: BTreeSet<usize>,
}

impl ProgressRecord {
    /// Returns true if the chapter has been completed.
    pub fn contains(&self, id: usize) -> bool {
        self.translated_indices.contains(&id)
    }

    /// Marks a chapter as completed. Returns false if it already was.
    pub fn insert(&mut self, id: usize) -> bool {
        self.translated_indices.insert(id)
    }

    /// Undoes an in-memory `insert` whose commit failed.
    pub(crate) fn rollback(&mut self, id: usize) {
        self.translated_indices.remove(&id);
    }

    /// Number of completed chapters.
    pub fn len(&self) -> usize {
        self.translated_indices.len()
    }

    /// Returns true if no chapter has been completed.
    pub fn is_empty(&self) -> bool {
        self.translated_indices.is_empty()
    }

    /// Completed ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.translated_indices.iter().copied()
    }
}

impl FromIterator<usize> for ProgressRecord {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Self {
            translated_indices: iter.into_iter().collect(),
        }
    }
}

/// How the record was obtained by [`ProgressStore::load`].
#[derive(Debug)]
pub enum LoadStatus {
    /// Read from an existing, valid file.
    Loaded,
    /// No file yet; first run.
    Missing,
    /// A file exists but could not be read or parsed. The run continues
    /// from an empty record, and the next save overwrites that file.
    Corrupt(ProgressError),
}

/// File-backed progress store.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
}

impl ProgressStore {
    /// Creates a store for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the progress file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the record, falling back to an empty one.
    ///
    /// Never fails: a missing file is a first run, and an unreadable or
    /// malformed file is reported through [`LoadStatus::Corrupt`] so the
    /// caller can warn about it.
    pub fn load(&self) -> (ProgressRecord, LoadStatus) {
        match self.try_load() {
            Ok(record) => (record, LoadStatus::Loaded),
            Err(ProgressError::ReadError(e)) if e.kind() == ErrorKind::NotFound => {
                (ProgressRecord::default(), LoadStatus::Missing)
            }
            Err(e) => (ProgressRecord::default(), LoadStatus::Corrupt(e)),
        }
    }

    fn try_load(&self) -> Result<ProgressRecord, ProgressError> {
        let content = std::fs::read_to_string(&self.path).map_err(ProgressError::ReadError)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Overwrites the progress file with the complete record.
    pub fn save(&self, record: &ProgressRecord) -> Result<(), ProgressError> {
        let write_error = |message: String| ProgressError::WriteError {
            path: self.path.clone(),
            message,
        };

        let content = serde_json::to_string_pretty(record)?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file =
            tempfile::NamedTempFile::new_in(dir).map_err(|e| write_error(e.to_string()))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.as_file().sync_all())
            .map_err(|e| write_error(e.to_string()))?;
        file.persist(&self.path)
            .map_err(|e| write_error(e.error.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty_record() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("translation_data.json"));

        let (record, status) = store.load();
        assert!(record.is_empty());
        assert!(matches!(status, LoadStatus::Missing));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("translation_data.json"));

        let record: ProgressRecord = [3, 0, 7].into_iter().collect();
        store.save(&record).unwrap();

        let (loaded, status) = store.load();
        assert!(matches!(status, LoadStatus::Loaded));
        assert_eq!(loaded, record);
        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec![0, 3, 7]);
    }

    #[test]
    fn test_save_overwrites_whole_file() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("translation_data.json"));

        store.save(&[0, 1, 2, 3].into_iter().collect()).unwrap();
        store.save(&[5].into_iter().collect()).unwrap();

        let (loaded, _) = store.load();
        assert_eq!(loaded.ids().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_file_is_human_readable() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translation_data.json");
        let store = ProgressStore::new(&path);

        store.save(&[1, 2].into_iter().collect()).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["translated_indices"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_reads_unordered_indices_with_duplicates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translation_data.json");
        std::fs::write(&path, r#"{"translated_indices": [4, 1, 4]}"#).unwrap();

        let (loaded, _) = ProgressStore::new(&path).load();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.contains(1));
        assert!(loaded.contains(4));
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("translation_data.json");
        std::fs::write(&path, "{ not json").unwrap();

        let (record, status) = ProgressStore::new(&path).load();
        assert!(record.is_empty());
        assert!(matches!(
            status,
            LoadStatus::Corrupt(ProgressError::ParseError(_))
        ));
    }

    #[test]
    fn test_save_into_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let store = ProgressStore::new(dir.path().join("absent").join("progress.json"));

        let result = store.save(&[0].into_iter().collect());
        assert!(matches!(result, Err(ProgressError::WriteError { .. })));
    }

    #[test]
    fn test_insert_and_rollback() {
        let mut record = ProgressRecord::default();
        assert!(record.insert(2));
        assert!(!record.insert(2));
        record.rollback(2);
        assert!(!record.contains(2));
    }
}
