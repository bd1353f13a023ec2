use super::kv_store::{JsonFileKvStore, KvStore};
use super::types::{ContextSelection, Preferences};
use crate::error::PersistenceError;
use std::path::Path;

pub const PREFERENCES_KEY: &str = "chainpilot.preferences";

/// In-memory preferences backed by a [`KvStore`]. Every mutation is written
/// through immediately; the in-memory value stays updated even when the
/// write fails.
pub struct PreferenceStore {
    kv: Box<dyn KvStore>,
    current: Preferences,
}

impl PreferenceStore {
    /// Load stored preferences. Missing or unreadable data yields defaults.
    pub fn load(kv: Box<dyn KvStore>) -> Self {
        let current = match kv.get(PREFERENCES_KEY) {
            Ok(Some(value)) => serde_json::from_value(value).unwrap_or_else(|error| {
                tracing::warn!(error = %error, "stored preferences are invalid, using defaults");
                Preferences::default()
            }),
            Ok(None) => Preferences::default(),
            Err(error) => {
                tracing::warn!(error = %error, "failed to read preferences, using defaults");
                Preferences::default()
            }
        };
        Self { kv, current }
    }

    pub fn open(path: &Path) -> Self {
        Self::load(Box::new(JsonFileKvStore::new(path)))
    }

    pub fn get(&self) -> &Preferences {
        &self.current
    }

    pub fn set_tracking_container(
        &mut self,
        selection: Option<ContextSelection>,
    ) -> Result<(), PersistenceError> {
        self.current.tracking_container.current_selection = selection;
        self.persist()
    }

    pub fn set_execution_scope(
        &mut self,
        selection: Option<ContextSelection>,
    ) -> Result<(), PersistenceError> {
        self.current.execution_scope.current_selection = selection;
        self.persist()
    }

    pub fn set_tracking_container_locked(&mut self, locked: bool) -> Result<(), PersistenceError> {
        self.current.tracking_container.locked = locked;
        self.persist()
    }

    pub fn set_execution_scope_locked(&mut self, locked: bool) -> Result<(), PersistenceError> {
        self.current.execution_scope.locked = locked;
        self.persist()
    }

    pub fn replace(&mut self, preferences: Preferences) -> Result<(), PersistenceError> {
        self.current = preferences;
        self.persist()
    }

    /// Forget everything stored and return to defaults.
    pub fn reset(&mut self) -> Result<(), PersistenceError> {
        self.current = Preferences::default();
        if self.kv.delete(PREFERENCES_KEY)? {
            tracing::info!("stored preferences removed");
        }
        Ok(())
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let value = serde_json::to_value(&self.current)
            .map_err(|error| PersistenceError::Save(error.to_string()))?;
        self.kv.set(PREFERENCES_KEY, value).inspect_err(|error| {
            tracing::error!(error = %error, "failed to save preferences");
        })
    }
}
