//! Per-user file locations for portable and installed modes.
//!
//! - **Portable mode**: a `.portable` marker next to the executable keeps
//!   `config.yaml`, the key map and `logs/` in the executable's directory.
//! - **Installed mode** (default): files live under the per-user config
//!   directory (`%APPDATA%\vigem-keypad`, `~/.config/vigem-keypad`, ...).

use crate::keymap::KEYMAP_FILENAME;
use anyhow::Context;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory name used under the per-user config directory
const APP_NAME: &str = "vigem-keypad";

/// Marker file that switches to portable mode
const PORTABLE_MARKER: &str = ".portable";

/// Resolved locations of the application's files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    /// Path to `config.yaml`
    pub config: PathBuf,
    /// Default key-map file
    pub keymap: PathBuf,
    pub logs_dir: PathBuf,
    /// Whether files sit next to the executable
    pub is_portable: bool,
}

impl AppPaths {
    /// Detect paths for the running executable.
    ///
    /// Called before logging is initialised, hence no tracing output here.
    pub fn detect() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));

        Self::resolve(&exe_dir, dirs::config_dir())
    }

    /// Resolve paths given the executable directory and the per-user config
    /// root; falls back to the executable directory when there is no root.
    pub fn resolve(exe_dir: &Path, config_root: Option<PathBuf>) -> Self {
        if exe_dir.join(PORTABLE_MARKER).exists() {
            return Self::in_dir(exe_dir, true);
        }
        let base = config_root
            .unwrap_or_else(|| exe_dir.to_path_buf())
            .join(APP_NAME);
        Self::in_dir(&base, false)
    }

    fn in_dir(base: &Path, is_portable: bool) -> Self {
        Self {
            config: base.join("config.yaml"),
            keymap: base.join(KEYMAP_FILENAME),
            logs_dir: base.join("logs"),
            is_portable,
        }
    }

    /// Directory holding the config file
    pub fn base_dir(&self) -> PathBuf {
        self.config
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Create the config and logs directories if missing
    pub fn ensure_directories(&self) -> anyhow::Result<()> {
        for dir in [self.base_dir(), self.logs_dir.clone()] {
            if !dir.exists() {
                debug!("Creating directory: {}", dir.display());
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installed_mode_uses_config_root() {
        let exe = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();

        let paths = AppPaths::resolve(exe.path(), Some(root.path().to_path_buf()));
        let base = root.path().join(APP_NAME);
        assert!(!paths.is_portable);
        assert_eq!(paths.config, base.join("config.yaml"));
        assert_eq!(paths.keymap, base.join("vigem_keys.json"));
        assert_eq!(paths.base_dir(), base);
    }

    #[test]
    fn test_portable_marker_keeps_files_next_to_exe() {
        let exe = tempfile::tempdir().unwrap();
        std::fs::write(exe.path().join(PORTABLE_MARKER), "").unwrap();

        let paths = AppPaths::resolve(exe.path(), Some(PathBuf::from("/unused")));
        assert!(paths.is_portable);
        assert_eq!(paths.keymap, exe.path().join(KEYMAP_FILENAME));
        assert_eq!(paths.logs_dir, exe.path().join("logs"));
    }

    #[test]
    fn test_ensure_directories_creates_tree() {
        let root = tempfile::tempdir().unwrap();
        let paths = AppPaths::resolve(Path::new("/nonexistent-exe"), Some(root.path().into()));

        paths.ensure_directories().unwrap();
        assert!(paths.base_dir().is_dir());
        assert!(paths.logs_dir.is_dir());
    }
}
