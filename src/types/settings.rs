use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::bookmark::DEFAULT_COLOR;

/// Storage key the original extension wrote its mapping under.
pub const DEFAULT_STORAGE_KEY: &str = "chatgpt-bookmarked-conversations";

/// Top-level SideMarks settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SideMarksSettings {
    pub storage: StorageSettings,
    pub timing: TimingSettings,
    pub appearance: AppearanceSettings,
    pub shortcuts: HashMap<String, String>,
}

impl Default for SideMarksSettings {
    fn default() -> Self {
        Self {
            storage: StorageSettings::default(),
            timing: TimingSettings::default(),
            appearance: AppearanceSettings::default(),
            shortcuts: Self::default_shortcuts(),
        }
    }
}

impl SideMarksSettings {
    /// Returns the default keyboard shortcuts.
    pub fn default_shortcuts() -> HashMap<String, String> {
        let mut shortcuts = HashMap::new();
        shortcuts.insert("toggle-bookmark".to_string(), "Ctrl+Shift+B".to_string());
        shortcuts
    }
}

/// Where the bookmark mapping is persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    pub key: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

/// Delays driving the reconcile watchers, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingSettings {
    /// Reconciles scheduled after the location changes.
    pub navigation_burst_ms: Vec<u64>,
    /// Reconciles scheduled after conversation links appear in the DOM.
    pub mutation_burst_ms: Vec<u64>,
    /// Reconciles scheduled at startup on platforms with late sidebars.
    pub startup_burst_ms: Vec<u64>,
    pub sweep_interval_ms: u64,
    pub feedback_visible_ms: u64,
    pub feedback_fade_ms: u64,
    /// Wait between re-injecting page logic and retrying a message.
    pub injection_retry_delay_ms: u64,
    /// Readiness probes sent after an injection before giving up on the reply.
    #[serde(default = "default_readiness_polls")]
    pub readiness_polls: u32,
}

fn default_readiness_polls() -> u32 {
    3
}

impl Default for TimingSettings {
    fn default() -> Self {
        Self {
            navigation_burst_ms: vec![100, 500, 1000],
            mutation_burst_ms: vec![100, 500],
            startup_burst_ms: vec![100, 500, 1000, 2000],
            sweep_interval_ms: 5000,
            feedback_visible_ms: 3000,
            feedback_fade_ms: 300,
            injection_retry_delay_ms: 100,
            readiness_polls: default_readiness_polls(),
        }
    }
}

/// Marker look.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppearanceSettings {
    pub marker_size_px: u32,
    pub default_color: String,
}

impl Default for AppearanceSettings {
    fn default() -> Self {
        Self {
            marker_size_px: 12,
            default_color: DEFAULT_COLOR.to_string(),
        }
    }
}
