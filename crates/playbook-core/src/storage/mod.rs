//! # Storage Module
//!
//! The persistence port and its adapters.
//!
//! Every piece of user state is one JSON document stored under a fixed
//! key (see [`crate::primitives::keys`]). The engine never talks to a
//! concrete store directly; it goes through [`PersistencePort`], so the
//! mechanism can be swapped without touching business logic:
//!
//! - [`MemoryStore`]: volatile map, used by tests and dry runs
//! - [`FileStore`]: a snapshot file rewritten on every save
//! - [`RedbStore`]: redb key/value table with ACID commits

mod file_store;
mod redb_store;

pub use file_store::FileStore;
pub use redb_store::RedbStore;

use crate::PlaybookError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

// =============================================================================
// PERSISTENCE PORT
// =============================================================================

/// Key/value persistence used by all state stores.
///
/// Values are opaque strings (JSON documents). Implementations must treat
/// `save` as an overwrite and `remove` of a missing key as a no-op.
pub trait PersistencePort: std::fmt::Debug {
    /// Load the raw value stored under `key`.
    fn load(&self, key: &str) -> Result<Option<String>, PlaybookError>;

    /// Store `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<(), PlaybookError>;

    /// Delete the value stored under `key`.
    fn remove(&mut self, key: &str) -> Result<(), PlaybookError>;

    /// All keys currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>, PlaybookError>;

    /// Copy every entry into an ordered map.
    fn entries(&self) -> Result<BTreeMap<String, String>, PlaybookError> {
        let mut map = BTreeMap::new();
        for key in self.keys()? {
            if let Some(value) = self.load(&key)? {
                map.insert(key, value);
            }
        }
        Ok(map)
    }

    /// Replace the whole key space with `entries`.
    fn replace_all(&mut self, entries: &BTreeMap<String, String>) -> Result<(), PlaybookError> {
        for key in self.keys()? {
            if !entries.contains_key(&key) {
                self.remove(&key)?;
            }
        }
        for (key, value) in entries {
            self.save(key, value)?;
        }
        Ok(())
    }
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// Volatile store backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    #[must_use]
    pub fn with_entries(entries: BTreeMap<String, String>) -> Self {
        Self { entries }
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PersistencePort for MemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PlaybookError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), PlaybookError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), PlaybookError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, PlaybookError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn entries(&self) -> Result<BTreeMap<String, String>, PlaybookError> {
        Ok(self.entries.clone())
    }
}

// =============================================================================
// TYPED STATE STORE
// =============================================================================

/// A typed view over one storage key.
///
/// Holds the decoded state in memory. Every `update` re-serializes the
/// whole object and saves it; there is no partial write and no cache
/// invalidation.
#[derive(Debug, Clone)]
pub struct StateStore<T> {
    key: &'static str,
    state: T,
}

impl<T> StateStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Load the state stored under `key`.
    ///
    /// Missing keys load as `T::default()`. Malformed JSON and storage
    /// errors are logged and also replaced by the default record.
    pub fn load(port: &dyn PersistencePort, key: &'static str) -> Self {
        let state = match port.load(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(state) => state,
                Err(e) => {
                    tracing::warn!(key, error = %e, "discarding malformed stored state");
                    T::default()
                }
            },
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed, using defaults");
                T::default()
            }
        };
        Self { key, state }
    }

    /// The storage key this store writes to.
    #[must_use]
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Read access to the current state.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.state
    }

    /// Mutate the state and persist the result.
    ///
    /// The in-memory state is only replaced once the write succeeded.
    pub fn update<R>(
        &mut self,
        port: &mut dyn PersistencePort,
        f: impl FnOnce(&mut T) -> Result<R, PlaybookError>,
    ) -> Result<R, PlaybookError>
    where
        T: Clone,
    {
        let mut next = self.state.clone();
        let result = f(&mut next)?;
        save_json(port, self.key, &next)?;
        self.state = next;
        Ok(result)
    }

    /// Replace the state wholesale and persist it.
    pub fn set(&mut self, port: &mut dyn PersistencePort, state: T) -> Result<(), PlaybookError> {
        save_json(port, self.key, &state)?;
        self.state = state;
        Ok(())
    }

    /// Clear the stored value and return to defaults.
    pub fn reset(&mut self, port: &mut dyn PersistencePort) -> Result<(), PlaybookError> {
        port.remove(self.key)?;
        self.state = T::default();
        Ok(())
    }
}

/// Serialize `value` as JSON and save it under `key`.
fn save_json<T: Serialize>(
    port: &mut dyn PersistencePort,
    key: &str,
    value: &T,
) -> Result<(), PlaybookError> {
    let raw =
        serde_json::to_string(value).map_err(|e| PlaybookError::SerializationError(e.to_string()))?;
    port.save(key, &raw)
}

// =============================================================================
// TESTS
// =============================================================================
