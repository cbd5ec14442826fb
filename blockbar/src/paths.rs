//! Default file locations

use std::path::PathBuf;

const CONFIG_FILE: &str = "blockbar/config.yaml";

/// Get the default configuration path
///
/// Priority order:
/// 1. $XDG_CONFIG_HOME/blockbar/config.yaml (or the platform config dir)
/// 2. ~/.config/blockbar/config.yaml
/// 3. ./blockbar.yaml
pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs_next::config_dir() {
        config_dir.join(CONFIG_FILE)
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".config").join(CONFIG_FILE)
    } else {
        PathBuf::from("blockbar.yaml")
    }
}
