// SideMarks platform paths
// Where the native binaries keep their settings file and bookmark database.
//
// Uses `cfg(target_os)` to pick the platform implementation at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Overrides the data directory, for the host and for tests.
pub const DATA_DIR_ENV: &str = "SIDEMARKS_DATA_DIR";

/// File name of the bookmark database inside the data directory.
pub const DATABASE_FILE: &str = "sidemarks.db";

/// Returns the configuration directory for SideMarks.
///
/// - **Linux**: `~/.config/sidemarks` (or `$XDG_CONFIG_HOME/sidemarks`)
/// - **macOS**: `~/Library/Application Support/SideMarks`
/// - **Windows**: `%APPDATA%/SideMarks`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory for SideMarks, honouring `SIDEMARKS_DATA_DIR`.
///
/// - **Linux**: `~/.local/share/sidemarks` (or `$XDG_DATA_HOME/sidemarks`)
/// - **macOS**: `~/Library/Application Support/SideMarks`
/// - **Windows**: `%APPDATA%/SideMarks`
pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Path of the bookmark database.
pub fn database_path() -> PathBuf {
    get_data_dir().join(DATABASE_FILE)
}
