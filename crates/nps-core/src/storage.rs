//! Persistent key-value storage port
//!
//! The host store holds structured JSON values under string keys and enforces
//! no schema; `settings` validates shapes on read.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct StorageError(pub String);

/// Key-value persistence capability.
pub trait StorageBackend {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
    /// Whether the store holds no keys at all (first run).
    fn is_empty(&self) -> Result<bool, StorageError>;
}

// =============================================================================
// In-memory Store
// =============================================================================

/// A write the host still has to apply to its own store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum StorageChange {
    Set { key: String, value: Value },
    Remove { key: String },
}

/// In-memory store that journals every write.
///
/// The wasm host hydrates it from `storage.local`, runs an operation, then
/// drains the journal back into `storage.local`.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, Value>,
    journal: Vec<StorageChange>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hydrate from a JSON object snapshot of the host store.
    ///
    /// Anything other than an object is treated as an empty store.
    pub fn from_snapshot(snapshot: Value) -> Self {
        let entries = match snapshot {
            Value::Object(map) => map.into_iter().collect(),
            Value::Null => BTreeMap::new(),
            other => {
                log::warn!("(storage) ignoring non-object snapshot: {other}");
                BTreeMap::new()
            }
        };
        Self {
            entries,
            journal: Vec::new(),
        }
    }

    /// Take the writes made since the last drain.
    pub fn drain_changes(&mut self) -> Vec<StorageChange> {
        std::mem::take(&mut self.journal)
    }

    /// Current contents as a JSON object.
    pub fn snapshot(&self) -> Value {
        Value::Object(self.entries.clone().into_iter().collect())
    }
}

impl StorageBackend for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.clone());
        self.journal.push(StorageChange::Set {
            key: key.to_string(),
            value,
        });
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.entries.remove(key).is_some() {
            self.journal.push(StorageChange::Remove { key: key.to_string() });
        }
        Ok(())
    }

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.entries.is_empty())
    }
}
