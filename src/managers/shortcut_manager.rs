//! Shortcut Manager for SideMarks.
//!
//! Keeps the keyboard command bindings the extension registers with the
//! browser, with conflict detection and macOS modifier adaptation.

use std::collections::HashMap;

use crate::types::errors::ShortcutError;
use crate::types::settings::SideMarksSettings;

/// Command that toggles the bookmark on the current conversation.
pub const TOGGLE_BOOKMARK_COMMAND: &str = "toggle-bookmark";

/// Trait defining shortcut management operations.
pub trait ShortcutManagerTrait {
    fn register_shortcut(&mut self, command: &str, keys: &str) -> Result<(), ShortcutError>;
    fn unregister_shortcut(&mut self, command: &str) -> Result<(), ShortcutError>;
    fn get_shortcut(&self, command: &str) -> Option<&str>;
    fn list_shortcuts(&self) -> &HashMap<String, String>;
    fn reset_to_defaults(&mut self);
    fn has_conflict(&self, keys: &str, exclude_command: Option<&str>) -> Option<String>;
    /// Command bound to `keys`, if any.
    fn command_for_keys(&self, keys: &str) -> Option<&str>;
}

pub struct ShortcutManager {
    shortcuts: HashMap<String, String>,
}

impl ShortcutManager {
    pub fn new() -> Self {
        Self {
            shortcuts: Self::default_shortcuts(),
        }
    }

    /// Builds a manager from persisted bindings. Bindings are adapted to the
    /// current platform the same way registration does.
    pub fn from_settings(settings: &SideMarksSettings) -> Self {
        Self {
            shortcuts: settings
                .shortcuts
                .iter()
                .map(|(c, k)| (c.clone(), Self::adapt_for_platform(k)))
                .collect(),
        }
    }

    pub fn default_shortcuts() -> HashMap<String, String> {
        SideMarksSettings::default_shortcuts()
            .into_iter()
            .map(|(c, k)| (c, Self::adapt_for_platform(&k)))
            .collect()
    }

    /// Adapts modifier keys for the current platform.
    fn adapt_for_platform(keys: &str) -> String {
        if cfg!(target_os = "macos") {
            keys.replace("Ctrl+", "Cmd+")
        } else {
            keys.to_string()
        }
    }
}

impl Default for ShortcutManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ShortcutManagerTrait for ShortcutManager {
    fn register_shortcut(&mut self, command: &str, keys: &str) -> Result<(), ShortcutError> {
        if keys.trim().is_empty() {
            return Err(ShortcutError::InvalidKeys("Keys cannot be empty".to_string()));
        }
        if keys.split('+').any(|part| part.trim().is_empty()) {
            return Err(ShortcutError::InvalidKeys(keys.to_string()));
        }

        if let Some(conflicting) = self.has_conflict(keys, Some(command)) {
            return Err(ShortcutError::Conflict(format!(
                "'{}' is already bound to '{}'",
                keys, conflicting
            )));
        }

        self.shortcuts
            .insert(command.to_string(), Self::adapt_for_platform(keys));
        Ok(())
    }

    fn unregister_shortcut(&mut self, command: &str) -> Result<(), ShortcutError> {
        self.shortcuts
            .remove(command)
            .map(|_| ())
            .ok_or_else(|| ShortcutError::NotFound(command.to_string()))
    }

    fn get_shortcut(&self, command: &str) -> Option<&str> {
        self.shortcuts.get(command).map(|s| s.as_str())
    }

    fn list_shortcuts(&self) -> &HashMap<String, String> {
        &self.shortcuts
    }

    fn reset_to_defaults(&mut self) {
        self.shortcuts = Self::default_shortcuts();
    }

    fn has_conflict(&self, keys: &str, exclude_command: Option<&str>) -> Option<String> {
        let adapted = Self::adapt_for_platform(keys);
        self.shortcuts
            .iter()
            .find(|(command, bound)| {
                **bound == adapted && exclude_command != Some(command.as_str())
            })
            .map(|(command, _)| command.clone())
    }

    fn command_for_keys(&self, keys: &str) -> Option<&str> {
        let adapted = Self::adapt_for_platform(keys);
        self.shortcuts
            .iter()
            .find(|(_, bound)| **bound == adapted)
            .map(|(command, _)| command.as_str())
    }
}
