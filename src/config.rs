//! Configuration management for vigem-keypad
//!
//! Handles loading, validating and saving the YAML configuration file.

use crate::driver::{library::DEFAULT_LIBRARY, TargetProfile};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub driver: DriverConfig,
    #[serde(default)]
    pub keymap: KeymapConfig,
}

/// Driver module and controller profile
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DriverConfig {
    /// Path or name of the driver module
    #[serde(default = "default_library")]
    pub library: String,
    /// `x360` or `ds4`
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Start the virtual controller as soon as the driver is loaded
    #[serde(default)]
    pub autostart: bool,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            library: default_library(),
            profile: default_profile(),
            autostart: false,
        }
    }
}

/// Key-map file handling
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct KeymapConfig {
    /// Overrides the per-user key-map location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub save_on_exit: bool,
}

impl Default for KeymapConfig {
    fn default() -> Self {
        Self {
            path: None,
            save_on_exit: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, or defaults when the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let config = Self::load(path)?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).context("Failed to serialize config to YAML")?;

        std::fs::write(path, yaml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration for correctness
    pub fn validate(&self) -> Result<()> {
        if self.driver.library.trim().is_empty() {
            anyhow::bail!("driver.library cannot be empty");
        }
        self.profile()?;
        Ok(())
    }

    /// Parsed `driver.profile`
    pub fn profile(&self) -> Result<TargetProfile> {
        TargetProfile::parse(&self.driver.profile).context("Invalid driver.profile")
    }
}

fn default_library() -> String {
    DEFAULT_LIBRARY.to_string()
}
fn default_profile() -> String {
    TargetProfile::default().as_str().to_string()
}
fn default_true() -> bool {
    true
}
