//! Default file locations.

use std::path::PathBuf;

use directories::ProjectDirs;

/// Default config file: `<platform config dir>/gpt-backup/config.toml`,
/// or `.gpt-backup/config.toml` when no home directory is known.
pub fn default_config_path() -> PathBuf {
    ProjectDirs::from("", "", "gpt-backup")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".gpt-backup"))
        .join("config.toml")
}
