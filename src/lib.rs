//! KmkPad Library
//!
//! This library provides the synthesis core behind the `kmkpad` binary:
//! the layer and key model, macro encoding, color resolution, extension
//! emitters, and the versioned configuration store that together turn a
//! macropad configuration into KMK `code.py` / `boot.py` sources.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod firmware;
pub mod keycode_db;
pub mod models;
pub mod services;
pub mod store;

pub use error::{CoreError, Result, ValidationError, ValidationErrorKind};
