use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to access settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Key/value store that survives restarts. Empty values read back as absent.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError>;
}

/// JSON-file backed settings: a flat object of string values.
pub struct FileSettings {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileSettings {
    /// Open the settings file at `path`; a missing file starts out empty.
    pub fn open(path: &Path) -> Result<Self, SettingsError> {
        let values = match std::fs::read_to_string(path) {
            Ok(data) => {
                let values: BTreeMap<String, String> = serde_json::from_str(&data)?;
                tracing::debug!("loaded {} settings from {}", values.len(), path.display());
                values
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_owned(),
            values: Mutex::new(values),
        })
    }

    /// `~/.config/ifttt-remote/state.json`, or None when there is no config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ifttt-remote").join("state.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // Write to a sibling temp file, then rename over the original.
    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(values)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SettingsStore for FileSettings {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().expect("settings lock poisoned");
        values.get(key).filter(|v| !v.is_empty()).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut values = self.values.lock().expect("settings lock poisoned");
        let previous = values.insert(key.to_owned(), value.to_owned());
        if let Err(e) = self.persist(&values) {
            // keep memory consistent with what is on disk
            match previous {
                Some(old) => values.insert(key.to_owned(), old),
                None => values.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}
