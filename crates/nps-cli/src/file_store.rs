//! JSON file storage backend
//!
//! The whole store is one JSON object on disk. Every call re-reads the file so
//! separate invocations never work from a stale copy.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use nps_core::{StorageBackend, StorageError};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;

pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Map<String, Value>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(StorageError(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if text.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str(&text) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError(format!(
                "'{}' does not hold a JSON object",
                self.path.display()
            ))),
            Err(e) => Err(StorageError(format!(
                "Failed to parse '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn write(&self, map: Map<String, Value>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(&Value::Object(map))
            .map_err(|e| StorageError(format!("Failed to serialize store: {e}")))?;

        let write_err =
            |e: std::io::Error| StorageError(format!("Failed to write '{}': {}", self.path.display(), e));

        // Same directory as the target so the final rename stays on one filesystem
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(text.as_bytes()).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

impl StorageBackend for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        Ok(self.read()?.remove(key))
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        let mut map = self.read()?;
        map.insert(key.to_string(), value);
        self.write(map)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut map = self.read()?;
        if map.remove(key).is_some() {
            self.write(map)?;
        }
        Ok(())
    }

    fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.read()?.is_empty())
    }
}
