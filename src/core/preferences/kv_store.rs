//! Key-value persistence for small JSON documents.

use crate::error::PersistenceError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;

pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError>;
    fn delete(&mut self, key: &str) -> Result<bool, PersistenceError>;
}

// --- Memory Implementation ---

#[derive(Debug, Default)]
pub struct MemoryKvStore {
    data: HashMap<String, Value>,
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.data.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.data.insert(key.to_string(), value);
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, PersistenceError> {
        Ok(self.data.remove(key).is_some())
    }
}

// --- JSON File Implementation ---

/// All keys live in one JSON object on disk. Writes go through a sibling
/// temp file and a rename.
#[derive(Debug, Clone)]
pub struct JsonFileKvStore {
    path: PathBuf,
}

impl JsonFileKvStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_all(&self) -> Result<Map<String, Value>, PersistenceError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(error) => return Err(error.into()),
        };
        if contents.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&contents) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(PersistenceError::Load(format!(
                "{} does not contain a JSON object",
                self.path.display()
            ))),
            Err(error) => Err(PersistenceError::Load(format!(
                "{}: {error}",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, map: &Map<String, Value>) -> Result<(), PersistenceError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let body = serde_json::to_string_pretty(map)
            .map_err(|error| PersistenceError::Save(error.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, body)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Current document, or an empty one when the file is unreadable. Lets a
    /// write replace a corrupt file instead of failing forever.
    fn read_for_update(&self) -> Map<String, Value> {
        self.read_all().unwrap_or_else(|error| {
            tracing::warn!(path = %self.path.display(), error = %error, "discarding unreadable store");
            Map::new()
        })
    }
}

impl KvStore for JsonFileKvStore {
    fn get(&self, key: &str) -> Result<Option<Value>, PersistenceError> {
        Ok(self.read_all()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        let mut map = self.read_for_update();
        map.insert(key.to_string(), value);
        self.write_all(&map)
    }

    fn delete(&mut self, key: &str) -> Result<bool, PersistenceError> {
        let mut map = self.read_for_update();
        let removed = map.remove(key).is_some();
        if removed {
            self.write_all(&map)?;
        }
        Ok(removed)
    }
}
