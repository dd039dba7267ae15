//! Configuration management for the application.
//!
//! This module handles loading, validating, and saving application settings
//! in TOML format with platform-specific directory resolution. These are the
//! tool's own settings; keyboard configurations live in JSON snapshots
//! handled by [`crate::store`].

use crate::constants::APP_NAME;
use crate::models::HardwareProfile;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Path configuration for file system locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Where generated `code.py` / `boot.py` are written
    pub output_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        // Use config directory for output by default
        let output_dir = Config::config_dir()
            .map(|dir| dir.join("output"))
            .unwrap_or_else(|_| PathBuf::from("output"));

        Self { output_dir }
    }
}

/// Target hardware selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HardwareConfig {
    /// TOML hardware profile; the Chronos Pad when unset
    pub profile: Option<PathBuf>,
}

/// Generation preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateConfig {
    /// Also write `boot.py` when the configuration enables it
    #[serde(default = "default_boot_py")]
    pub boot_py: bool,
}

const fn default_boot_py() -> bool {
    true
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            boot_py: default_boot_py(),
        }
    }
}

/// Application configuration.
///
/// Stored at the platform config directory (see [`Config::config_dir`]).
///
/// Validation rules:
/// - the hardware profile file, when set, must exist and parse
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    /// File system paths
    #[serde(default)]
    pub paths: PathConfig,
    /// Target hardware
    #[serde(default)]
    pub hardware: HardwareConfig,
    /// Generation preferences
    #[serde(default)]
    pub generate: GenerateConfig,
}

impl Config {
    /// Creates a new Config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if the config file exists on disk.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path()
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    /// Gets the platform-specific config directory path.
    ///
    /// - Linux: `~/.config/KmkPad/`
    /// - macOS: `~/Library/Application Support/KmkPad/`
    /// - Windows: `%APPDATA%\KmkPad\`
    pub fn config_dir() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to determine config directory")?
            .join(APP_NAME);

        Ok(config_dir)
    }

    /// Gets the full path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Loads configuration from the config file.
    ///
    /// If the file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads configuration from an explicit path, defaulting when absent.
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            tracing::debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::new());
        }

        let content = fs::read_to_string(config_path).context(format!(
            "Failed to read config file: {}",
            config_path.display()
        ))?;

        let config: Self = toml::from_str(&content).context(format!(
            "Failed to parse config file: {}",
            config_path.display()
        ))?;

        config.validate()?;
        Ok(config)
    }

    /// Saves configuration to the config file (atomic write).
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    /// Saves configuration to an explicit path via temp file + rename.
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir).context(format!(
                "Failed to create config directory: {}",
                config_dir.display()
            ))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        let temp_path = config_path.with_extension("toml.tmp");

        fs::write(&temp_path, content).context(format!(
            "Failed to write temp config file: {}",
            temp_path.display()
        ))?;

        // Atomic rename
        fs::rename(&temp_path, config_path).context(format!(
            "Failed to rename temp config file to: {}",
            config_path.display()
        ))?;

        Ok(())
    }

    /// Validates configuration values.
    pub fn validate(&self) -> Result<()> {
        if let Some(profile) = &self.hardware.profile {
            if !profile.exists() {
                anyhow::bail!("Hardware profile does not exist: {}", profile.display());
            }
        }
        Ok(())
    }

    /// The configured hardware profile, or the Chronos Pad.
    pub fn hardware_profile(&self) -> Result<HardwareProfile> {
        match &self.hardware.profile {
            Some(path) => HardwareProfile::from_toml_file(path),
            None => Ok(HardwareProfile::chronos_pad()),
        }
    }
}
