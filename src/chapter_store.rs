//! Per-chapter storage on disk.
//!
//! Chapters are written once, into a directory that did not exist before.
//! If the directory is already present nothing is rewritten, even when the
//! source or `max_chars` changed since; a manifest records which split the
//! directory holds so that such drift can at least be reported.

use crate::error::StorageError;
use crate::segmenter::Chapter;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Manifest file name inside the chapters directory.
const MANIFEST_FILENAME: &str = "manifest.json";

/// Describes the split a chapters directory was written from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterManifest {
    /// SHA-256 of the source text and `max_chars`.
    pub fingerprint: String,
    pub max_chars: usize,
    pub chapter_count: usize,
}

impl ChapterManifest {
    /// Builds the manifest for a segmentation of `source`.
    pub fn new(source: &str, max_chars: usize, chapter_count: usize) -> Self {
        Self {
            fingerprint: fingerprint(source, max_chars),
            max_chars,
            chapter_count,
        }
    }
}

/// Computes the split fingerprint for a source text.
pub fn fingerprint(source: &str, max_chars: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(max_chars.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Result of [`ChapterStore::persist`].
#[derive(Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The directory was created and every chapter written.
    Written { count: usize },
    /// The directory existed and matches the current split.
    AlreadyPresent,
    /// The directory existed but was written from a different split
    /// (or has no manifest). Stored files were left untouched.
    Stale { stored: Option<ChapterManifest> },
}

/// Writes chapters as `<label>.txt` files under one directory.
#[derive(Debug, Clone)]
pub struct ChapterStore {
    dir: PathBuf,
}

impl ChapterStore {
    /// Creates a store rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the chapter files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file for a given chapter.
    pub fn chapter_path(&self, chapter: &Chapter) -> PathBuf {
        self.dir.join(chapter_file_name(chapter))
    }

    /// Persists chapters unless the directory already exists.
    ///
    /// Files are written into a staging directory next to the target and
    /// renamed into place once complete, so an interrupted write never
    /// leaves a partial chapters directory behind.
    pub fn persist(
        &self,
        chapters: &[Chapter],
        manifest: &ChapterManifest,
    ) -> Result<PersistOutcome, StorageError> {
        self.persist_with(chapters, manifest, write_chapter_file)
    }

    fn persist_with<F>(
        &self,
        chapters: &[Chapter],
        manifest: &ChapterManifest,
        mut write_chapter: F,
    ) -> Result<PersistOutcome, StorageError>
    where
        F: FnMut(&Path, &Chapter) -> Result<(), StorageError>,
    {
        if self.dir.exists() {
            let stored = self.read_manifest()?;
            return Ok(match stored {
                Some(ref stored) if stored == manifest => PersistOutcome::AlreadyPresent,
                stored => PersistOutcome::Stale { stored },
            });
        }

        let parent = match self.dir.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;

        // Removed on drop unless renamed into place first.
        let staging = tempfile::Builder::new()
            .prefix(".chapters-")
            .tempdir_in(parent)
            .map_err(|e| StorageError::io(parent, e))?;

        for chapter in chapters {
            let path = staging.path().join(chapter_file_name(chapter));
            write_chapter(&path, chapter)?;
        }

        let manifest_path = staging.path().join(MANIFEST_FILENAME);
        let content = serde_json::to_string_pretty(manifest)?;
        fs::write(&manifest_path, content).map_err(|e| StorageError::io(&manifest_path, e))?;

        fs::rename(staging.path(), &self.dir).map_err(|e| StorageError::io(&self.dir, e))?;

        Ok(PersistOutcome::Written {
            count: chapters.len(),
        })
    }

    /// Reads the manifest, if one was written.
    ///
    /// An unparsable manifest is treated like a missing one.
    pub fn read_manifest(&self) -> Result<Option<ChapterManifest>, StorageError> {
        let path = self.dir.join(MANIFEST_FILENAME);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(serde_json::from_str(&content).ok()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::io(path, e)),
        }
    }
}

fn chapter_file_name(chapter: &Chapter) -> String {
    format!("{}.txt", chapter.label())
}

fn write_chapter_file(path: &Path, chapter: &Chapter) -> Result<(), StorageError> {
    let content = format!("# {}\n\n{}", chapter.label(), chapter.text);
    fs::write(path, content).map_err(|e| StorageError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segmenter::segment;
    use tempfile::TempDir;

    const SOURCE: &str = "第一行\n第二行\n第三行\n第四行";

    #[test]
    fn test_writes_chapter_files() {
        let temp = TempDir::new().unwrap();
        let store = ChapterStore::new(temp.path().join("chapters"));
        let chapters = segment(SOURCE, 4);
        let manifest = ChapterManifest::new(SOURCE, 4, chapters.len());

        let outcome = store.persist(&chapters, &manifest).unwrap();
        assert_eq!(outcome, PersistOutcome::Written { count: 2 });

        let first = fs::read_to_string(store.dir().join("Chapter 1.txt")).unwrap();
        assert_eq!(first, "# Chapter 1\n\n第一行\n第二行");
        assert!(store.dir().join("Chapter 2.txt").exists());
        assert_eq!(store.read_manifest().unwrap(), Some(manifest));
    }

    #[test]
    fn test_existing_directory_is_not_rewritten() {
        let temp = TempDir::new().unwrap();
        let store = ChapterStore::new(temp.path().join("chapters"));
        let chapters = segment(SOURCE, 4);
        let manifest = ChapterManifest::new(SOURCE, 4, chapters.len());
        store.persist(&chapters, &manifest).unwrap();

        let path = store.dir().join("Chapter 1.txt");
        fs::write(&path, "edited by hand").unwrap();

        let outcome = store.persist(&chapters, &manifest).unwrap();
        assert_eq!(outcome, PersistOutcome::AlreadyPresent);
        assert_eq!(fs::read_to_string(&path).unwrap(), "edited by hand");
    }

    #[test]
    fn test_changed_split_is_reported_stale() {
        let temp = TempDir::new().unwrap();
        let store = ChapterStore::new(temp.path().join("chapters"));
        let chapters = segment(SOURCE, 4);
        let original = ChapterManifest::new(SOURCE, 4, chapters.len());
        store.persist(&chapters, &original).unwrap();

        let resplit = segment(SOURCE, 100);
        let manifest = ChapterManifest::new(SOURCE, 100, resplit.len());
        let outcome = store.persist(&resplit, &manifest).unwrap();

        assert_eq!(
            outcome,
            PersistOutcome::Stale {
                stored: Some(original)
            }
        );
        // The old two-chapter split is still on disk.
        assert!(store.dir().join("Chapter 2.txt").exists());
    }

    #[test]
    fn test_directory_without_manifest_is_stale() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("chapters");
        fs::create_dir_all(&dir).unwrap();
        let store = ChapterStore::new(&dir);

        let chapters = segment(SOURCE, 4);
        let manifest = ChapterManifest::new(SOURCE, 4, chapters.len());
        let outcome = store.persist(&chapters, &manifest).unwrap();

        assert_eq!(outcome, PersistOutcome::Stale { stored: None });
        assert!(!dir.join("Chapter 1.txt").exists());
    }

    #[test]
    fn test_failed_write_leaves_no_partial_directory() {
        let temp = TempDir::new().unwrap();
        let store = ChapterStore::new(temp.path().join("chapters"));
        let chapters = segment(SOURCE, 4);
        let manifest = ChapterManifest::new(SOURCE, 4, chapters.len());

        // The first chapter is written, the second one fails.
        let result = store.persist_with(&chapters, &manifest, |path, chapter| {
            if chapter.id == 0 {
                write_chapter_file(path, chapter)
            } else {
                Err(StorageError::io(
                    path,
                    std::io::Error::new(std::io::ErrorKind::StorageFull, "disk full"),
                ))
            }
        });
        assert!(matches!(result, Err(StorageError::Io { .. })));
        assert!(!store.dir().exists());
        assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 0);

        let outcome = store.persist(&chapters, &manifest).unwrap();
        assert_eq!(outcome, PersistOutcome::Written { count: 2 });
        assert!(store.dir().join("Chapter 2.txt").exists());
    }

    #[test]
    fn test_creates_missing_parent() {
        let temp = TempDir::new().unwrap();
        let store = ChapterStore::new(temp.path().join("work").join("chapters"));
        let chapters = segment(SOURCE, 4);
        let manifest = ChapterManifest::new(SOURCE, 4, chapters.len());

        let outcome = store.persist(&chapters, &manifest).unwrap();
        assert_eq!(outcome, PersistOutcome::Written { count: 2 });
        assert_eq!(store.read_manifest().unwrap(), Some(manifest));
    }

    #[test]
    fn test_fingerprint_depends_on_max_chars() {
        assert_eq!(fingerprint(SOURCE, 4), fingerprint(SOURCE, 4));
        assert_ne!(fingerprint(SOURCE, 4), fingerprint(SOURCE, 5));
        assert_ne!(fingerprint(SOURCE, 4), fingerprint("other", 4));
        assert_eq!(fingerprint(SOURCE, 4).len(), 64);
    }
}
