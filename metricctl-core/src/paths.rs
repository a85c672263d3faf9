//! Centralized path configuration for metricctl.

use std::path::PathBuf;

/// Get the metricctl configuration directory.
///
/// Resolution order:
/// 1. `METRICCTL_CONFIG_DIR` environment variable
/// 2. `<platform config dir>/metricctl` (e.g. `~/.config/metricctl`)
/// 3. `./.metricctl` when no home directory can be determined
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("METRICCTL_CONFIG_DIR") {
        return PathBuf::from(dir);
    }

    dirs::config_dir()
        .map(|d| d.join("metricctl"))
        .unwrap_or_else(|| PathBuf::from(".metricctl"))
}

/// Get the default configuration file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.json")
}
