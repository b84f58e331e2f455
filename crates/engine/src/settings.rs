use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Persisted user preference for the enable toggle.
pub trait SettingsStore: Send {
    /// `None` when nothing was stored yet.
    fn load_enabled(&self) -> Option<bool>;

    fn store_enabled(&mut self, enabled: bool) -> Result<()>;
}

/// Enabled unless a store explicitly says otherwise.
pub fn resolve_enabled(store: Option<&dyn SettingsStore>) -> bool {
    store.and_then(|s| s.load_enabled()).unwrap_or(true)
}

#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    enabled: Option<bool>,
}

impl MemorySettings {
    pub fn new(enabled: Option<bool>) -> Self {
        Self { enabled }
    }
}

impl SettingsStore for MemorySettings {
    fn load_enabled(&self) -> Option<bool> {
        self.enabled
    }

    fn store_enabled(&mut self, enabled: bool) -> Result<()> {
        self.enabled = Some(enabled);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    enabled: Option<bool>,
}

/// JSON settings file. A missing or unreadable file reads as "nothing stored".
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Option<StoredSettings> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(err) => {
                log::warn!("Ignoring malformed settings {}: {err}", self.path.display());
                None
            }
        }
    }
}

impl SettingsStore for FileSettings {
    fn load_enabled(&self) -> Option<bool> {
        self.read()?.enabled
    }

    fn store_enabled(&mut self, enabled: bool) -> Result<()> {
        let mut settings = self.read().unwrap_or_default();
        settings.enabled = Some(enabled);
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&settings)?)?;
        Ok(())
    }
}
