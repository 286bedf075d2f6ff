//! Keyed settings store.

use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{ResultExt, RuntimeError, RuntimeResult};

/// Lookup of operator settings by key.
pub trait Settings {
    fn get(&self, key: &str) -> Option<i64>;

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).map(|value| value != 0)
    }
}

/// Operator settings, stored as a JSON object of integers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeSettings {
    values: BTreeMap<String, i64>,
}

impl RuntimeSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> RuntimeResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load settings from a JSON file. A missing file yields empty settings.
    pub fn load(path: &Path) -> RuntimeResult<Self> {
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[CONFIG] No settings file at {:?}, using defaults", path);
                return Ok(Self::default());
            },
            Err(e) => return Err(RuntimeError::Io(e)),
        };

        Self::from_json_str(&json).with_context(|| format!("invalid settings file {:?}", path))
    }

    pub fn set(&mut self, key: &str, value: i64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn set_bool(&mut self, key: &str, value: bool) {
        self.set(key, value as i64);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Settings for RuntimeSettings {
    fn get(&self, key: &str) -> Option<i64> {
        self.values.get(key).copied()
    }
}

lazy_static! {
    /// Process-wide settings store.
    pub static ref RUNTIME_SETTINGS: RwLock<RuntimeSettings> = RwLock::new(RuntimeSettings::default());
}

/// Handle reading the process-wide store on every lookup.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalSettings;

impl Settings for GlobalSettings {
    fn get(&self, key: &str) -> Option<i64> {
        RUNTIME_SETTINGS.read().get(key)
    }
}

/// Replace the process-wide store.
pub fn install(settings: RuntimeSettings) {
    log::debug!("[CONFIG] Installing {} setting(s)", settings.len());
    *RUNTIME_SETTINGS.write() = settings;
}
