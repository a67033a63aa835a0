// SideMarks Settings Engine
// Reads and writes `settings.json`: storage key, watcher timings, marker look, shortcuts.
// Every change is written through immediately.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::paths;
use crate::types::errors::SettingsError;
use crate::types::settings::SideMarksSettings;

pub const SETTINGS_FILE: &str = "settings.json";

pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<SideMarksSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &SideMarksSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

pub struct SettingsEngine {
    config_path: PathBuf,
    settings: SideMarksSettings,
}

impl SettingsEngine {
    /// `path_override` replaces `<config dir>/settings.json`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        Self {
            config_path: path_override
                .unwrap_or_else(|| paths::get_config_dir().join(SETTINGS_FILE)),
            settings: SideMarksSettings::default(),
        }
    }
}

/// Sections whose keys are open-ended rather than fixed by the schema.
const OPEN_SECTIONS: [&str; 1] = ["shortcuts"];

/// Writes `value` at the dot-separated `key` of `doc`. Only keys that already
/// exist may be replaced, except directly inside an open section.
fn assign(doc: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
    let not_found = || SettingsError::InvalidKey(format!("Key '{}' not found in settings", key));
    let mut parts: Vec<&str> = key.split('.').collect();
    let last = parts.pop().filter(|p| !p.is_empty()).ok_or_else(not_found)?;

    let mut section = doc;
    for part in &parts {
        section = section.get_mut(*part).ok_or_else(not_found)?;
    }
    let Value::Object(fields) = section else {
        return Err(SettingsError::InvalidKey(format!("'{}' is not a section", parts.join("."))));
    };

    let open = parts.len() == 1 && OPEN_SECTIONS.contains(&parts[0]);
    if !open && !fields.contains_key(last) {
        return Err(not_found());
    }
    fields.insert(last.to_string(), value);
    Ok(())
}

fn to_document(settings: &SideMarksSettings) -> Result<Value, SettingsError> {
    serde_json::to_value(settings).map_err(|e| SettingsError::SerializationError(e.to_string()))
}

impl SettingsEngineTrait for SettingsEngine {
    /// Defaults when the file does not exist yet; a malformed file is an error.
    fn load(&mut self) -> Result<SideMarksSettings, SettingsError> {
        self.settings = match fs::read_to_string(&self.config_path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                SettingsError::SerializationError(format!(
                    "{}: {}",
                    self.config_path.display(),
                    e
                ))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.config_path.display(), "no settings file, using defaults");
                SideMarksSettings::default()
            }
            Err(e) => return Err(SettingsError::IoError(e.to_string())),
        };
        Ok(self.settings.clone())
    }

    /// Written to a sibling temp file, then renamed over the old one.
    fn save(&self) -> Result<(), SettingsError> {
        if let Some(dir) = self.config_path.parent() {
            fs::create_dir_all(dir).map_err(|e| SettingsError::IoError(e.to_string()))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::SerializationError(e.to_string()))?;

        let staging = self.config_path.with_extension("json.tmp");
        fs::write(&staging, json)
            .and_then(|_| fs::rename(&staging, &self.config_path))
            .map_err(|e| SettingsError::IoError(e.to_string()))
    }

    fn get_settings(&self) -> &SideMarksSettings {
        &self.settings
    }

    /// Sets one value by dot path (`"timing.sweep_interval_ms"`,
    /// `"shortcuts.toggle-bookmark"`, or a whole section such as `"timing"`)
    /// and saves. Values of the wrong shape are rejected and nothing changes.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        let mut doc = to_document(&self.settings)?;
        assign(&mut doc, key, value)?;
        self.settings = serde_json::from_value(doc)
            .map_err(|e| SettingsError::InvalidValue(format!("{}: {}", key, e)))?;
        info!(key, "setting changed");
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = SideMarksSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}

