//! Settings persistence
//!
//! The scheduler only needs a synchronous key/value contract from the
//! settings store. [`SettingsStore`] provides it on top of a typed
//! load/save pair, with a durable JSON file backend and an in-memory
//! backend.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};

use super::paths::BackupPaths;
use super::settings::Settings;
use crate::error::{BackupError, BackupResult};

/// Key/value access to persisted settings
pub trait SettingsStore: Send + Sync {
    /// Read the whole settings record
    fn load(&self) -> BackupResult<Settings>;

    /// Replace the whole settings record
    fn save(&self, settings: &Settings) -> BackupResult<()>;

    /// Read a single key (`source`, `maxBackups`, ...)
    fn get(&self, key: &str) -> BackupResult<Option<Value>> {
        let value = serde_json::to_value(self.load()?)?;
        Ok(value.get(key).cloned().filter(|v| !v.is_null()))
    }

    /// Stored settings with the given keys merged in, validated but not saved
    ///
    /// Unknown keys and values that fail validation are rejected.
    fn merged(&self, values: Map<String, Value>) -> BackupResult<Settings> {
        let mut current = serde_json::to_value(self.load()?)?;
        let Some(fields) = current.as_object_mut() else {
            return Err(BackupError::Internal("settings did not serialize to an object".into()));
        };

        for (key, value) in values {
            if !fields.contains_key(&key) {
                return Err(BackupError::Validation(format!("unknown setting '{}'", key)));
            }
            fields.insert(key, value);
        }

        let merged: Settings = serde_json::from_value(current)
            .map_err(|e| BackupError::Validation(format!("invalid setting value: {}", e)))?;
        merged.validate()?;
        Ok(merged)
    }

    /// Merge the given keys into the stored settings and save them
    ///
    /// Nothing is written when [`merged`](Self::merged) rejects the keys.
    fn set(&self, values: Map<String, Value>) -> BackupResult<Settings> {
        let merged = self.merged(values)?;
        self.save(&merged)?;
        Ok(merged)
    }
}

/// Settings stored as pretty-printed JSON on disk
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    paths: BackupPaths,
}

impl JsonFileStore {
    pub fn new(paths: BackupPaths) -> Self {
        Self { paths }
    }

    /// Location of the settings file
    pub fn path(&self) -> PathBuf {
        self.paths.settings_file()
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> BackupResult<Settings> {
        let settings_path = self.paths.settings_file();

        if !settings_path.exists() {
            return Ok(Settings::default());
        }

        let contents = fs::read_to_string(&settings_path)
            .map_err(|e| BackupError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| BackupError::Config(format!("Failed to parse settings file: {}", e)))
    }

    fn save(&self, settings: &Settings) -> BackupResult<()> {
        self.paths.ensure_directories()?;

        let contents = serde_json::to_string_pretty(settings)
            .map_err(|e| BackupError::Config(format!("Failed to serialize settings: {}", e)))?;

        fs::write(self.paths.settings_file(), contents)
            .map_err(|e| BackupError::Io(format!("Failed to write settings file: {}", e)))
    }
}

/// Settings held in process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: Mutex<Settings>,
}

impl MemoryStore {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> BackupResult<Settings> {
        Ok(self
            .settings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, settings: &Settings) -> BackupResult<()> {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings.clone();
        Ok(())
    }
}
