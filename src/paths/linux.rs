// SideMarks platform paths for Linux
// Config: ~/.config/sidemarks
// Data:   ~/.local/share/sidemarks

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "sidemarks";

fn home() -> String {
    env::var("HOME").unwrap_or_else(|_| String::from("/tmp"))
}

/// `$XDG_<kind>_HOME/sidemarks`, or `~/<fallback>/sidemarks`.
fn xdg_dir(xdg: Option<String>, home: &str, fallback: &[&str]) -> PathBuf {
    match xdg.filter(|v| !v.is_empty()) {
        Some(base) => PathBuf::from(base).join(APP_DIR),
        None => fallback
            .iter()
            .fold(PathBuf::from(home), |path, part| path.join(part))
            .join(APP_DIR),
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_dir(env::var("XDG_CONFIG_HOME").ok(), &home(), &[".config"])
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir(env::var("XDG_DATA_HOME").ok(), &home(), &[".local", "share"])
}
