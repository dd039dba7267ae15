//! Shared types for CLI commands: errors, exit codes, JSON responses.

use crate::config::Config;
use crate::error::CoreError;
use crate::models::{Configuration, HardwareProfile};
use crate::store::{ConfigStore, LoadedConfiguration};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Input was rejected (validation, parse, unsupported version)
    Validation = 1,
    /// Filesystem or environment failure
    Io = 2,
}

impl ExitCode {
    /// Numeric process exit code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by a CLI command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Exit code category
    pub kind: ExitCode,
    /// Message printed to stderr
    pub message: String,
}

impl CliError {
    /// Input was rejected.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::Validation,
            message: message.into(),
        }
    }

    /// Filesystem or environment failure.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: ExitCode::Io,
            message: message.into(),
        }
    }

    /// Wraps a core error, choosing the exit code by variant.
    pub fn from_core(context: &str, error: &CoreError) -> Self {
        let message = format!("{context}: {error}");
        match error {
            CoreError::Io(_) => Self::io(message),
            _ => Self::validation(message),
        }
    }

    /// Numeric process exit code.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        self.kind.code()
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI commands.
pub type CliResult<T> = std::result::Result<T, CliError>;

/// Loads a snapshot, reporting any migration it needed.
pub fn load_snapshot(path: &Path) -> CliResult<LoadedConfiguration> {
    let loaded = ConfigStore::load(path)
        .map_err(|e| CliError::from_core(&format!("Failed to load {}", path.display()), &e))?;
    if !loaded.migration.is_noop() {
        tracing::warn!(
            "{} uses schema {}; migrated in memory to {}",
            path.display(),
            loaded.migration.from_version,
            loaded.migration.to_version
        );
    }
    Ok(loaded)
}

/// Resolves the target board: an explicit profile file, else the settings.
pub fn resolve_profile(explicit: Option<&PathBuf>, settings: &Config) -> CliResult<HardwareProfile> {
    match explicit {
        Some(path) => HardwareProfile::from_toml_file(path)
            .map_err(|e| CliError::io(format!("Failed to load hardware profile: {e:#}"))),
        None => settings
            .hardware_profile()
            .map_err(|e| CliError::io(format!("Failed to load hardware profile: {e:#}"))),
    }
}

/// Loads application settings from an explicit file or the default location.
pub fn load_settings(explicit: Option<&PathBuf>) -> CliResult<Config> {
    let result = match explicit {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    result.map_err(|e| CliError::io(format!("Failed to load settings: {e:#}")))
}

/// Snapshot plus the board it targets.
pub struct Workspace {
    /// Loaded (and migrated) snapshot
    pub config: Configuration,
    /// Target board
    pub profile: HardwareProfile,
    /// Application settings
    pub settings: Config,
}

impl Workspace {
    /// Loads settings, profile and snapshot for a command.
    pub fn open(
        snapshot: &Path,
        profile: Option<&PathBuf>,
        settings: Option<&PathBuf>,
    ) -> CliResult<Self> {
        let settings = load_settings(settings)?;
        let profile = resolve_profile(profile, &settings)?;
        let loaded = load_snapshot(snapshot)?;
        Ok(Self {
            config: loaded.config,
            profile,
            settings,
        })
    }
}

/// Location of a validation message.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationLocation {
    /// Layer index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layer: Option<usize>,
    /// Flattened key index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<usize>,
}

/// One validation finding.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationMessage {
    /// "error" or "warning"
    pub severity: String,
    /// Error kind, for errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Human-readable message
    pub message: String,
    /// Fix hint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Where the problem is
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<ValidationLocation>,
}

/// JSON output of `validate`.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationResponse {
    /// True when no errors were found
    pub valid: bool,
    /// Errors first, then warnings
    pub messages: Vec<ValidationMessage>,
}
