//! Firmware synthesis: `code.py` and `boot.py` generation.
//!
//! [`FirmwareGenerator`] is the entry point. It resolves colors, encodes
//! macros and runs the enabled extension emitters; [`FirmwareValidator`]
//! reports every problem of a configuration without generating anything.

pub mod boot;
pub mod colors;
pub mod emitters;
pub mod generator;
pub mod macros;
pub mod python;
pub mod validator;

// Re-export firmware types
pub use colors::{ColorResolver, LayerColors};
pub use generator::{FirmwareGenerator, GeneratedFiles};
pub use macros::MacroEncoder;
pub use validator::{FirmwareValidator, ValidationReport};
