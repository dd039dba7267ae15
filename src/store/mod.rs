//! Persistent JSON snapshots of a [`Configuration`].
//!
//! Loading runs the migration chain on the raw JSON tree before
//! deserializing, so any supported older snapshot loads into the current
//! model. Saving always stamps the current schema version.

pub mod migration;

pub use migration::MigrationReport;

use crate::constants::CURRENT_SCHEMA_VERSION;
use crate::error::{CoreError, Result};
use crate::models::Configuration;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Writes a finished snapshot to durable storage.
///
/// Implementations must either replace the target completely or leave it
/// untouched.
pub trait SnapshotWriter {
    /// Atomically replaces `path` with `bytes`.
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()>;
}

/// Writes a sibling temp file and renames it over the target.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSnapshotWriter;

impl FsSnapshotWriter {
    fn temp_path(path: &Path) -> PathBuf {
        let mut name = path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        path.with_file_name(name)
    }
}

impl SnapshotWriter for FsSnapshotWriter {
    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = Self::temp_path(path);
        if let Err(e) = fs::write(&temp_path, bytes) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, path) {
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        Ok(())
    }
}

/// A configuration read from a snapshot, with what migration did to it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfiguration {
    /// The configuration at the current schema
    pub config: Configuration,
    /// Steps applied while loading
    pub migration: MigrationReport,
}

/// Reads and writes configuration snapshots.
pub struct ConfigStore {
    writer: Box<dyn SnapshotWriter>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Creates a store writing through the filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::with_writer(FsSnapshotWriter)
    }

    /// Creates a store with a custom write primitive.
    pub fn with_writer(writer: impl SnapshotWriter + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }

    /// Serializes a configuration as pretty JSON at the current schema version.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for a key whose token would not load back, or
    /// `Parse` if serialization fails (non-string map keys in unknown
    /// fields, for instance).
    pub fn to_bytes(config: &Configuration) -> Result<Vec<u8>> {
        config.check_tokens()?;
        let mut stamped = config.clone();
        CURRENT_SCHEMA_VERSION.clone_into(&mut stamped.version);

        let mut bytes = serde_json::to_vec_pretty(&stamped).map_err(|e| CoreError::Parse {
            message: format!("Failed to serialize configuration: {e}"),
            offset: None,
        })?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    /// Parses a snapshot, migrating it to the current schema.
    ///
    /// # Errors
    ///
    /// - `Parse` for malformed JSON (with byte offset) or fields that do not
    ///   fit the model
    /// - `UnsupportedVersion` for unknown or newer versions
    /// - `InvariantViolation` for a snapshot without layers
    pub fn from_bytes(bytes: &[u8]) -> Result<LoadedConfiguration> {
        let mut doc: Value = serde_json::from_slice(bytes).map_err(|e| CoreError::Parse {
            offset: byte_offset(bytes, e.line(), e.column()),
            message: e.to_string(),
        })?;

        let migration = migration::migrate(&mut doc)?;
        let config: Configuration = serde_json::from_value(doc).map_err(|e| CoreError::Parse {
            message: e.to_string(),
            offset: None,
        })?;

        if config.layer_count() == 0 {
            return Err(CoreError::InvariantViolation(
                "keymap_data must contain at least one layer".to_string(),
            ));
        }

        tracing::debug!(
            "Loaded configuration v{} with {} layers and {} macros",
            migration.to_version,
            config.layer_count(),
            config.macros.len()
        );
        Ok(LoadedConfiguration { config, migration })
    }

    /// Loads and migrates a snapshot file.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, otherwise as [`Self::from_bytes`].
    pub fn load(path: &Path) -> Result<LoadedConfiguration> {
        let bytes = fs::read(path)?;
        let loaded = Self::from_bytes(&bytes)?;
        tracing::info!("Loaded {}", path.display());
        Ok(loaded)
    }

    /// Saves a snapshot through the store's writer.
    ///
    /// # Errors
    ///
    /// Serialization or write failures.
    pub fn save(&self, config: &Configuration, path: &Path) -> Result<()> {
        let bytes = Self::to_bytes(config)?;
        self.writer.write_atomic(path, &bytes)?;
        tracing::info!("Saved {}", path.display());
        Ok(())
    }
}

/// Converts serde_json's 1-based line/column into a byte offset.
fn byte_offset(bytes: &[u8], line: usize, column: usize) -> Option<usize> {
    if line == 0 {
        return None;
    }
    let mut start = 0;
    for _ in 1..line {
        let newline = bytes[start..].iter().position(|&b| b == b'\n')?;
        start += newline + 1;
    }
    Some((start + column.saturating_sub(1)).min(bytes.len()))
}
