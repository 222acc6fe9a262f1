//! Path resolution for Quill configuration files.
//!
//! ```text
//! ~/.config/quill/         # Config directory (XDG on Linux, platform default elsewhere)
//! └── config.toml          # Instance, cache and feature settings
//! ```

use std::path::PathBuf;

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// No per-user config directory on this platform.
    ConfigDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::ConfigDirNotFound => write!(f, "Cannot find user config directory"),
        }
    }
}

impl std::error::Error for PathError {}

pub struct QuillPaths;

impl QuillPaths {
    const APP_DIR: &'static str = "quill";

    /// Returns the Quill configuration directory (e.g. `~/.config/quill/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(Self::APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }
}
