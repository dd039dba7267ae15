//! Error types for the synthesis core.
//!
//! Every failure the core can raise is a [`CoreError`]. Validation problems
//! carry a [`ValidationError`] with the layer/key context that produced them so
//! the host can point the user at the offending position.

use std::fmt;
use thiserror::Error;

/// Primary error type for model mutation, synthesis and persistence.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Malformed color, out-of-range index, invalid delay, bad profile data.
    #[error("{0}")]
    Validation(ValidationError),

    /// A macro action references a keycode the catalog does not know.
    #[error("Invalid action in macro '{macro_name}' (step {step}): unrecognized keycode '{keycode}'")]
    InvalidAction {
        /// Macro containing the action
        macro_name: String,
        /// Zero-based position of the action in the macro
        step: usize,
        /// The rejected keycode token
        keycode: String,
    },

    /// A mutation was rejected because it would break a model invariant.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The snapshot is not valid JSON or does not match the schema.
    #[error("Parse error{}: {message}", offset.map(|o| format!(" at byte {o}")).unwrap_or_default())]
    Parse {
        /// Parser message
        message: String,
        /// Byte offset into the input, when known
        offset: Option<usize>,
    },

    /// The snapshot was written by a newer (or unknown) schema version.
    #[error("Unsupported configuration version '{found}' (newest supported is '{supported}')")]
    UnsupportedVersion {
        /// Version found in the document
        found: String,
        /// Current schema version
        supported: String,
    },

    /// Filesystem failure while persisting a snapshot.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns the validation details if this is a validation error.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for CoreError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

/// Convenience type alias for core results.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Validation error with context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Type of validation error
    pub kind: ValidationErrorKind,
    /// Layer index where the error occurred
    pub layer: Option<usize>,
    /// Flattened key index where the error occurred
    pub key: Option<usize>,
    /// Human-readable error message
    pub message: String,
    /// Optional suggestion for fixing the error
    pub suggestion: Option<String>,
}

impl ValidationError {
    /// Creates a new validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            layer: None,
            key: None,
            message: message.into(),
            suggestion: None,
        }
    }

    /// Sets the layer context.
    #[must_use]
    pub const fn with_layer(mut self, layer: usize) -> Self {
        self.layer = Some(layer);
        self
    }

    /// Sets the key context.
    #[must_use]
    pub const fn with_key(mut self, key: usize) -> Self {
        self.key = Some(key);
        self
    }

    /// Sets a suggestion for fixing the error.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.layer, self.key) {
            (Some(layer), Some(key)) => {
                write!(f, "[Layer {layer}, key {key}] {}: {}", self.kind, self.message)?;
            }
            (Some(layer), None) => write!(f, "[Layer {layer}] {}: {}", self.kind, self.message)?,
            (None, Some(key)) => write!(f, "[Key {key}] {}: {}", self.kind, self.message)?,
            (None, None) => write!(f, "{}: {}", self.kind, self.message)?,
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n    → {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Types of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Color string is not `#RRGGBB`
    MalformedColor,
    /// Key index or position outside the layer grid
    KeyIndexOutOfRange,
    /// Layer index outside the layer sequence
    LayerOutOfRange,
    /// Macro delay is zero
    InvalidDelay,
    /// Keycode token not recognized by the catalog
    InvalidKeycode,
    /// Layer grid shape differs from the hardware profile
    DimensionMismatch,
    /// LED ordering table is not a bijection over the key indices
    InvalidPermutation,
    /// Numeric setting outside its allowed range
    OutOfRangeSetting,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedColor => write!(f, "Malformed Color"),
            Self::KeyIndexOutOfRange => write!(f, "Key Index Out of Range"),
            Self::LayerOutOfRange => write!(f, "Layer Out of Range"),
            Self::InvalidDelay => write!(f, "Invalid Delay"),
            Self::InvalidKeycode => write!(f, "Invalid Keycode"),
            Self::DimensionMismatch => write!(f, "Dimension Mismatch"),
            Self::InvalidPermutation => write!(f, "Invalid LED Permutation"),
            Self::OutOfRangeSetting => write!(f, "Setting Out of Range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_with_context() {
        let err = ValidationError::new(ValidationErrorKind::MalformedColor, "'#GG0000' is not hex")
            .with_layer(2)
            .with_key(7);
        assert_eq!(
            err.to_string(),
            "[Layer 2, key 7] Malformed Color: '#GG0000' is not hex"
        );
    }

    #[test]
    fn test_validation_error_display_with_suggestion() {
        let err = ValidationError::new(ValidationErrorKind::InvalidDelay, "delay must be > 0")
            .with_suggestion("Use at least 1 ms");
        let text = err.to_string();
        assert!(text.starts_with("Invalid Delay: delay must be > 0"));
        assert!(text.contains("→ Use at least 1 ms"));
    }

    #[test]
    fn test_parse_error_mentions_offset() {
        let err = CoreError::Parse {
            message: "expected value".to_string(),
            offset: Some(12),
        };
        assert_eq!(err.to_string(), "Parse error at byte 12: expected value");

        let err = CoreError::Parse {
            message: "expected value".to_string(),
            offset: None,
        };
        assert_eq!(err.to_string(), "Parse error: expected value");
    }

    #[test]
    fn test_as_validation() {
        let err: CoreError = ValidationError::new(ValidationErrorKind::InvalidKeycode, "x").into();
        assert!(err.as_validation().is_some());
        assert!(CoreError::InvariantViolation("x".into()).as_validation().is_none());
    }
}
