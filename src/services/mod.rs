//! Queries over a configuration that never fail.
//!
//! Generation and validation use these to surface problems as warnings.

pub mod references;

pub use references::{dangling_macro_references, MacroRef};
