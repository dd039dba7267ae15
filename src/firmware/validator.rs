//! Firmware validation before generation.
//!
//! Generation stops at the first problem. The validator instead walks the
//! whole configuration and collects every error and warning so an editor
//! can show them all at once.

// Allow format! appended to String - more readable for building messages
#![allow(clippy::format_push_string)]

use crate::error::{CoreError, ValidationError, ValidationErrorKind};
use crate::firmware::colors::ColorResolver;
use crate::firmware::emitters::{self, EmitContext, ExtensionKind};
use crate::firmware::macros::MacroEncoder;
use crate::keycode_db::KeycodeDb;
use crate::models::{Configuration, EncoderButton, HardwareProfile};
use crate::services::references;

/// Validation result with specific errors and warnings.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Problems that prevent firmware generation
    pub errors: Vec<ValidationError>,
    /// Non-blocking findings
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    /// Creates a new empty validation report.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Returns true if there are no errors (warnings are allowed).
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Adds an error to the report.
    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    /// Adds a warning to the report.
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Formats the report as a user-friendly message.
    #[must_use]
    pub fn format_message(&self) -> String {
        let mut message = String::new();

        if !self.errors.is_empty() {
            message.push_str(&format!("❌ {} validation errors:\n", self.errors.len()));
            for (idx, error) in self.errors.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, error));
            }
        }

        if !self.warnings.is_empty() {
            message.push_str(&format!("\n⚠️  {} warnings:\n", self.warnings.len()));
            for (idx, warning) in self.warnings.iter().enumerate() {
                message.push_str(&format!("  {}. {}\n", idx + 1, warning));
            }
        }

        message
    }
}

/// Validation warning (non-blocking).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// Warning message
    pub message: String,
}

impl ValidationWarning {
    /// Creates a new validation warning
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Firmware validator.
pub struct FirmwareValidator<'a> {
    config: &'a Configuration,
    profile: &'a HardwareProfile,
    keycode_db: &'a KeycodeDb,
}

impl<'a> FirmwareValidator<'a> {
    /// Creates a new firmware validator.
    #[must_use]
    pub const fn new(
        config: &'a Configuration,
        profile: &'a HardwareProfile,
        keycode_db: &'a KeycodeDb,
    ) -> Self {
        Self {
            config,
            profile,
            keycode_db,
        }
    }

    /// Validates the configuration for firmware generation.
    ///
    /// Checks:
    /// - the hardware profile is consistent
    /// - every layer matches the board's grid
    /// - all keycodes are known to the catalog
    /// - macros encode (positive delays, known keys)
    /// - with RGB enabled, colors parse and their indices are in range
    /// - enabled extensions have renderable settings
    ///
    /// Dangling layer and macro references, unused macros and toggle
    /// targets past the last layer are reported as warnings.
    #[must_use]
    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::new();

        if let Err(e) = self.profile.validate() {
            report.add_error(e);
            return report;
        }

        let grid_ok = self.validate_layers(&mut report);
        self.validate_macros(&mut report);
        if grid_ok {
            let colors_ok = self.validate_colors(&mut report);
            self.validate_extensions(&mut report, colors_ok);
        }
        self.collect_warnings(&mut report);

        tracing::debug!(
            "Validation finished: {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        );
        report
    }

    /// Validates grid shape and keycodes. Returns false on a shape mismatch.
    fn validate_layers(&self, report: &mut ValidationReport) -> bool {
        let expected = (self.profile.rows, self.profile.cols);
        let mut grid_ok = true;

        for (layer_idx, layer) in self.config.layers().iter().enumerate() {
            if (layer.rows(), layer.cols()) != expected {
                grid_ok = false;
                report.add_error(
                    ValidationError::new(
                        ValidationErrorKind::DimensionMismatch,
                        format!(
                            "Layer is {}x{}, expected {}x{} for {}",
                            layer.rows(),
                            layer.cols(),
                            expected.0,
                            expected.1,
                            self.profile.name
                        ),
                    )
                    .with_layer(layer_idx)
                    .with_suggestion("Add or remove keys to match the board"),
                );
            }

            for (key_idx, key) in layer.keys().iter().enumerate() {
                if !key.is_primitive() {
                    continue;
                }
                let token = key.to_string();
                if !self.keycode_db.is_valid(&token) {
                    report.add_error(
                        ValidationError::new(
                            ValidationErrorKind::InvalidKeycode,
                            format!("Invalid keycode '{token}'"),
                        )
                        .with_layer(layer_idx)
                        .with_key(key_idx)
                        .with_suggestion(self.suggest(&token)),
                    );
                }
            }
        }

        grid_ok
    }

    fn suggest(&self, keycode: &str) -> String {
        let suggestions = self.keycode_db.search(keycode);
        if suggestions.is_empty() {
            "Check the keycode database for valid codes".to_string()
        } else {
            let similar: Vec<&str> = suggestions
                .iter()
                .take(3)
                .map(|k| k.code.as_str())
                .collect();
            format!("Did you mean one of: {}", similar.join(", "))
        }
    }

    fn validate_macros(&self, report: &mut ValidationReport) {
        let encoder = MacroEncoder::new(self.keycode_db);
        for (name, actions) in &self.config.macros {
            if let Err(e) = encoder.encode(name, actions) {
                report.add_error(into_validation(e));
            }
        }
    }

    /// Returns false if any color problem was reported. Colors are only
    /// checked when the RGB matrix is emitted.
    fn validate_colors(&self, report: &mut ValidationReport) -> bool {
        if !self.config.extensions.rgb.enabled {
            return true;
        }
        let before = report.errors.len();
        if let Err(e) = self.config.rgb.check_brightness() {
            report.add_error(e);
        }
        let led_order = self.profile.led_order();
        let resolver = ColorResolver::new(self.config, &led_order);
        let problems = resolver.problems();
        if problems.is_empty() {
            if let Err(e) = resolver.resolve() {
                report.add_error(into_validation(e));
            }
        } else {
            for problem in problems {
                report.add_error(problem);
            }
        }
        report.errors.len() == before
    }

    fn validate_extensions(&self, report: &mut ValidationReport, colors_ok: bool) {
        let ctx = EmitContext {
            config: self.config,
            profile: self.profile,
            catalog: self.keycode_db,
        };
        for emitter in emitters::emitters() {
            // the RGB emitter would repeat the color errors
            if !colors_ok && emitter.kind() == ExtensionKind::Rgb {
                continue;
            }
            if let Err(e) = emitter.emit(&ctx) {
                let mut error = into_validation(e);
                if error.suggestion.is_none() {
                    error = error.with_suggestion(format!("Check the {} settings", emitter.kind()));
                }
                report.add_error(error);
            }
        }
    }

    fn collect_warnings(&self, report: &mut ValidationReport) {
        let layer_count = self.config.layer_count();

        for layer_ref in references::dangling_layer_references(self.config) {
            report.add_warning(ValidationWarning::new(format!(
                "Layer {} key ({}, {}): {} targets layer {}, which does not exist",
                layer_ref.from_layer,
                layer_ref.position.row,
                layer_ref.position.col,
                layer_ref.keycode,
                layer_ref.to_layer
            )));
        }

        let held = references::build_layer_ref_index(self.config);
        for (layer_idx, layer) in self.config.layers().iter().enumerate() {
            for (key_idx, key) in layer.keys().iter().enumerate() {
                let Some(position) = layer.position_of(key_idx) else {
                    continue;
                };
                if let Some(message) =
                    references::check_transparency_conflict(layer_idx, position, key, &held)
                {
                    report.add_warning(ValidationWarning::new(format!(
                        "Layer {layer_idx} key {key_idx}: {message}"
                    )));
                }
            }
        }

        for dangling in references::dangling_macro_references(self.config) {
            report.add_warning(ValidationWarning::new(format!(
                "Layer {} key {}: macro '{}' is not defined; the key will do nothing",
                dangling.layer, dangling.key, dangling.name
            )));
        }

        for name in references::unused_macros(self.config) {
            report.add_warning(ValidationWarning::new(format!(
                "Macro '{name}' is defined but not assigned to any key"
            )));
        }

        let encoder = &self.config.extensions.encoder;
        if let EncoderButton::ToggleLayer { layer } = encoder.button {
            if encoder.enabled && layer >= layer_count {
                report.add_warning(ValidationWarning::new(format!(
                    "Encoder button toggles layer {layer}, which does not exist"
                )));
            }
        }
    }
}

/// Flattens any core error into a reportable validation error.
fn into_validation(error: CoreError) -> ValidationError {
    match error {
        CoreError::Validation(e) => e,
        CoreError::InvalidAction {
            macro_name,
            step,
            keycode,
        } => ValidationError::new(
            ValidationErrorKind::InvalidKeycode,
            format!("Macro '{macro_name}' step {step} uses unrecognized keycode '{keycode}'"),
        ),
        other => ValidationError::new(ValidationErrorKind::OutOfRangeSetting, other.to_string()),
    }
}
