//! # redb-backed State Storage
//!
//! A disk-backed persistence port using the redb embedded database.
//!
//! Each `save` is its own write transaction, so a crash never leaves a
//! half-written JSON document behind. `replace_all` swaps the whole key
//! space inside one transaction. Two processes writing the same key
//! still race at the read-modify-write level; redb only serializes the
//! individual commits.

use super::PersistencePort;
use crate::PlaybookError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::collections::BTreeMap;
use std::path::Path;

/// Table for state documents: storage key -> JSON text
const STATE: TableDefinition<&str, &str> = TableDefinition::new("state");

fn io_error(e: impl std::fmt::Display) -> PlaybookError {
    PlaybookError::IoError(e.to_string())
}

/// A persistence port backed by a redb database file.
pub struct RedbStore {
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a state database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PlaybookError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Initialize the table so read transactions never see it missing
        {
            let write_txn = db.begin_write().map_err(io_error)?;
            let _ = write_txn.open_table(STATE).map_err(io_error)?;
            write_txn.commit().map_err(io_error)?;
        }

        Ok(Self { db })
    }

    /// Compact the database file.
    pub fn compact(&mut self) -> Result<(), PlaybookError> {
        self.db.compact().map_err(io_error)?;
        Ok(())
    }
}

impl PersistencePort for RedbStore {
    fn load(&self, key: &str) -> Result<Option<String>, PlaybookError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(STATE).map_err(io_error)?;
        let value = table
            .get(key)
            .map_err(io_error)?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PlaybookError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(STATE).map_err(io_error)?;
            table.insert(key, value).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PlaybookError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(STATE).map_err(io_error)?;
            table.remove(key).map_err(io_error)?;
        }
        write_txn.commit().map_err(io_error)?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PlaybookError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(STATE).map_err(io_error)?;

        let mut keys = Vec::new();
        for entry in table.iter().map_err(io_error)? {
            let (key, _) = entry.map_err(io_error)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }

    fn replace_all(&mut self, entries: &BTreeMap<String, String>) -> Result<(), PlaybookError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        {
            let mut table = write_txn.open_table(STATE).map_err(io_error)?;
            let mut stale = Vec::new();
            for entry in table.iter().map_err(io_error)? {
                let (key, _) = entry.map_err(io_error)?;
                let key = key.value().to_string();
                if !entries.contains_key(&key) {
                    stale.push(key);
                }
            }
            for key in &stale {
                table.remove(key.as_str()).map_err(io_error)?;
            }
            for (key, value) in entries {
                table.insert(key.as_str(), value.as_str()).map_err(io_error)?;
            }
        }
        write_txn.commit().map_err(io_error)?;
        tracing::debug!(entries = entries.len(), "replaced state table");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("state.redb")).expect("open db");

        store.save("p29-progress", "{\"points\":5}").expect("save");

        assert_eq!(
            store.load("p29-progress").expect("load").as_deref(),
            Some("{\"points\":5}")
        );
        assert!(store.load("missing").expect("load").is_none());
    }

    #[test]
    fn values_survive_reopen() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("state.redb");
        {
            let mut store = RedbStore::open(&path).expect("open db");
            store.save("a", "1").expect("save");
            store.save("b", "2").expect("save");
        }

        let store = RedbStore::open(&path).expect("reopen db");
        assert_eq!(
            store.keys().expect("keys"),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let temp = tempdir().expect("temp dir");
        let mut store = RedbStore::open(temp.path().join("state.redb")).expect("open db");

        store.remove("never-written").expect("remove");
        store.save("k", "v").expect("save");
        store.remove("k").expect("remove");

        assert!(store.keys().expect("keys").is_empty());
    }

    #[test]
    fn replace_all_swaps_key_space() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("state.redb");
        {
            let mut store = RedbStore::open(&path).expect("open db");
            store.save("a", "1").expect("save");
            store.save("b", "2").expect("save");

            let incoming = BTreeMap::from([
                ("b".to_string(), "20".to_string()),
                ("c".to_string(), "30".to_string()),
            ]);
            store.replace_all(&incoming).expect("replace");
            assert_eq!(store.entries().expect("entries"), incoming);
        }

        let store = RedbStore::open(&path).expect("reopen db");
        assert!(store.load("a").expect("load").is_none());
        assert_eq!(store.load("c").expect("load").as_deref(), Some("30"));
    }
}
