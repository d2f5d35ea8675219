// Durable key/value storage for the theme preference.
use crate::error::SiteError;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const THEME_KEY: &str = "portfolio-theme";

pub trait PreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, SiteError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SiteError>;
    fn remove(&self, key: &str) -> Result<(), SiteError>;
}

/// Preferences kept as a flat JSON object in one file.
#[derive(Debug, Clone)]
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<config dir>/portfolio-site/preferences.json`, if the platform has a config dir.
    pub fn default_location() -> Option<Self> {
        dirs::config_dir().map(|dir| Self::new(dir.join("portfolio-site").join("preferences.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, SiteError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let raw = fs::read_to_string(&self.path)?;
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), SiteError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, SiteError> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SiteError> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), SiteError> {
        let mut entries = self.read_all()?;
        if entries.remove(key).is_some() {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

/// In-memory store for headless runs and tests.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Result<Option<String>, SiteError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SiteError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SiteError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

/// Write, read back and remove a scratch entry. Any failure means the store is unusable.
pub fn probe_storage(store: &dyn PreferenceStore) -> bool {
    const PROBE_KEY: &str = "__storage_probe__";
    let outcome = store
        .set(PROBE_KEY, "1")
        .and_then(|_| store.get(PROBE_KEY))
        .and_then(|value| store.remove(PROBE_KEY).map(|_| value));
    match outcome {
        Ok(Some(value)) => value == "1",
        Ok(None) => false,
        Err(e) => {
            tracing::warn!(error = %e, "Preference storage probe failed");
            false
        }
    }
}
