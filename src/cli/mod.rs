//! CLI command handlers for KmkPad.
//!
//! This module provides headless, scriptable access to the synthesis core
//! for automation, testing, and CI integration.

pub mod colors;
pub mod common;
pub mod generate;
pub mod keycodes;
pub mod migrate;
pub mod new;
pub mod validate;

// Re-export types used by main.rs and tests
pub use colors::ColorsArgs;
pub use common::{CliError, CliResult, ExitCode};
pub use generate::GenerateArgs;
pub use keycodes::KeycodesArgs;
pub use migrate::MigrateArgs;
pub use new::NewArgs;
pub use validate::ValidateArgs;
