//! # Snapshot File Storage
//!
//! Keeps the key space in memory and rewrites a single snapshot file on
//! every mutation. The file is written next to the target and renamed
//! into place, so readers only ever see a complete snapshot.

use super::PersistencePort;
use crate::PlaybookError;
use crate::formats::{snapshot_from_bytes, snapshot_to_bytes};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A persistence port backed by one snapshot file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the snapshot at `path`, or start empty if it does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlaybookError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let bytes = std::fs::read(&path).map_err(|e| {
                PlaybookError::IoError(format!("Cannot read '{}': {}", path.display(), e))
            })?;
            snapshot_from_bytes(&bytes)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, entries })
    }

    /// Path of the backing snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `entries` to disk, then adopt them as the live key space.
    ///
    /// On failure the in-memory state is left as it was.
    fn commit(&mut self, entries: BTreeMap<String, String>) -> Result<(), PlaybookError> {
        let bytes = snapshot_to_bytes(&entries)?;
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, &bytes).map_err(|e| {
            PlaybookError::IoError(format!("Cannot write '{}': {}", tmp.display(), e))
        })?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            PlaybookError::IoError(format!("Cannot replace '{}': {}", self.path.display(), e))
        })?;
        self.entries = entries;
        Ok(())
    }
}

impl PersistencePort for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, PlaybookError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PlaybookError> {
        let mut next = self.entries.clone();
        next.insert(key.to_string(), value.to_string());
        self.commit(next)
    }

    fn remove(&mut self, key: &str) -> Result<(), PlaybookError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }
        let mut next = self.entries.clone();
        next.remove(key);
        self.commit(next)
    }

    fn keys(&self) -> Result<Vec<String>, PlaybookError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn entries(&self) -> Result<BTreeMap<String, String>, PlaybookError> {
        Ok(self.entries.clone())
    }

    fn replace_all(&mut self, entries: &BTreeMap<String, String>) -> Result<(), PlaybookError> {
        self.commit(entries.clone())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_opens_empty() {
        let temp = tempdir().expect("temp dir");
        let store = FileStore::open(temp.path().join("state.p29")).expect("open");
        assert!(store.keys().expect("keys").is_empty());
    }

    #[test]
    fn saves_are_visible_after_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("state.p29");
        {
            let mut store = FileStore::open(&path).expect("open");
            store.save("p29-fiscal-year", "\"june\"").expect("save");
        }

        let store = FileStore::open(&path).expect("reopen");
        assert_eq!(
            store.load("p29-fiscal-year").expect("load").as_deref(),
            Some("\"june\"")
        );
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("state.p29");
        std::fs::write(&path, b"garbage bytes").expect("write");

        assert!(FileStore::open(&path).is_err());
    }

    #[test]
    fn failed_write_leaves_memory_untouched() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("state.p29");
        let mut store = FileStore::open(&path).expect("open");
        store.save("p29-demo-mode", "false").expect("save");

        // a directory where the temp file should go makes every write fail
        std::fs::create_dir(path.with_extension("tmp")).expect("block tmp");

        assert!(store.save("p29-demo-mode", "true").is_err());
        assert!(store.save("p29-fiscal-year", "\"june\"").is_err());
        assert!(store.remove("p29-demo-mode").is_err());
        let replacement = BTreeMap::from([("p29-other".to_string(), "1".to_string())]);
        assert!(store.replace_all(&replacement).is_err());

        assert_eq!(store.load("p29-demo-mode").expect("load").as_deref(), Some("false"));
        assert_eq!(store.load("p29-fiscal-year").expect("load"), None);
        assert_eq!(store.keys().expect("keys"), vec!["p29-demo-mode".to_string()]);

        let reopened = FileStore::open(&path).expect("reopen");
        assert_eq!(reopened.entries().expect("entries"), store.entries().expect("entries"));
    }
}
