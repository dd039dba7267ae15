//! `code.py` synthesis.
//!
//! Sections are written in a fixed order:
//!
//! 1. header, imports, keyboard object and matrix pins
//! 2. the keymap literal
//! 3. macro definitions and their slot bindings
//! 4. enabled extension fragments (encoder, analog input, display, RGB)
//! 5. user custom code
//! 6. `keyboard.go()`
//!
//! Nothing here depends on time, environment or hash ordering, so a model
//! always produces the same bytes.

use crate::constants::APP_NAME;
use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::firmware::boot::generate_boot;
use crate::firmware::emitters::{self, EmitContext, SourceFragment};
use crate::firmware::macros::MacroEncoder;
use crate::firmware::python;
use crate::keycode_db::KeycodeCatalog;
use crate::models::{Configuration, HardwareProfile, KeyAssignment};
use std::fmt::Write as _;

/// Imports every generated `code.py` starts with.
const BASE_IMPORTS: &[&str] = &[
    "import board",
    "from kmk.kmk_keyboard import KMKKeyboard",
    "from kmk.keys import KC",
    "from kmk.scanners import DiodeOrientation",
    "from kmk.modules.layers import Layers",
    "from kmk.extensions.media_keys import MediaKeys",
];

const MACRO_IMPORT: &str = "from kmk.modules.macros import Macros, Tap, Press, Release, Delay";

/// Files produced for one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFiles {
    /// Main firmware program
    pub code_py: String,
    /// USB boot configuration, when enabled
    pub boot_py: Option<String>,
}

/// Generates CircuitPython sources for a configuration.
pub struct FirmwareGenerator<'a> {
    config: &'a Configuration,
    profile: &'a HardwareProfile,
    catalog: &'a dyn KeycodeCatalog,
}

impl<'a> FirmwareGenerator<'a> {
    /// Creates a new firmware generator.
    #[must_use]
    pub fn new(
        config: &'a Configuration,
        profile: &'a HardwareProfile,
        catalog: &'a dyn KeycodeCatalog,
    ) -> Self {
        Self {
            config,
            profile,
            catalog,
        }
    }

    /// Generates `code.py` and, when enabled, `boot.py`.
    ///
    /// # Errors
    ///
    /// Same as [`FirmwareGenerator::generate`] and [`generate_boot`].
    pub fn generate_all(&self) -> Result<GeneratedFiles> {
        Ok(GeneratedFiles {
            code_py: self.generate()?,
            boot_py: self.generate_boot()?,
        })
    }

    /// Generates `boot.py`, or `None` when boot configuration is disabled.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the boot key lies outside the matrix.
    pub fn generate_boot(&self) -> Result<Option<String>> {
        generate_boot(&self.config.boot, self.profile)
    }

    /// Generates `code.py`.
    ///
    /// # Errors
    ///
    /// - `DimensionMismatch` if a layer's grid differs from the board or the
    ///   profile itself is inconsistent
    /// - `InvalidKeycode` for a key the catalog does not recognize
    /// - macro encoding errors (`InvalidDelay`, `InvalidAction`)
    /// - color and extension setting errors from the emitters
    pub fn generate(&self) -> Result<String> {
        self.profile.validate()?;
        self.check_layers()?;

        let keymap = self.keymap_section()?;
        let macros = self.macro_section()?;

        let ctx = EmitContext {
            config: self.config,
            profile: self.profile,
            catalog: self.catalog,
        };
        let mut fragments: Vec<SourceFragment> = Vec::new();
        for emitter in emitters::emitters() {
            if let Some(fragment) = emitter.emit(&ctx)? {
                tracing::debug!("Emitting {} extension", fragment.kind);
                fragments.push(fragment);
            }
        }

        let mut sections = vec![
            self.header_section(&fragments),
            self.keyboard_section(),
            self.hardware_section(),
            keymap,
        ];
        sections.extend(macros);
        for fragment in &fragments {
            let mut section = format!("# --- {} ---\n", fragment.kind);
            section.push_str(&fragment.code);
            if let Some(sync) = &fragment.sync_module {
                section.push_str("\n\n");
                section.push_str(sync);
            }
            sections.push(section);
        }
        if !self.config.custom_code.trim().is_empty() {
            sections.push(format!(
                "# --- Custom Code ---\n{}\n",
                self.config.custom_code.trim_end()
            ));
        }
        sections.push("if __name__ == '__main__':\n    keyboard.go()\n".to_string());

        tracing::info!(
            "Generated code.py: {} layers, {} macros, {} extensions",
            self.config.layer_count(),
            self.config.macros.len(),
            fragments.len()
        );
        Ok(sections.join("\n"))
    }

    fn check_layers(&self) -> Result<()> {
        let expected = (self.profile.rows, self.profile.cols);
        for (index, layer) in self.config.layers().iter().enumerate() {
            if (layer.rows(), layer.cols()) != expected {
                return Err(ValidationError::new(
                    ValidationErrorKind::DimensionMismatch,
                    format!(
                        "Layer is {}x{}, {} is {}x{}",
                        layer.rows(),
                        layer.cols(),
                        self.profile.name,
                        expected.0,
                        expected.1
                    ),
                )
                .with_layer(index)
                .with_suggestion("Conform the configuration to the hardware profile")
                .into());
            }
        }
        Ok(())
    }

    fn header_section(&self, fragments: &[SourceFragment]) -> String {
        let mut imports: Vec<&str> = BASE_IMPORTS.to_vec();
        if !self.config.macros.is_empty() {
            imports.push(MACRO_IMPORT);
        }
        for line in fragments.iter().flat_map(|f| f.imports.iter()) {
            if !imports.contains(&line.as_str()) {
                imports.push(line);
            }
        }

        let mut out = String::new();
        let _ = writeln!(out, "# Generated by {APP_NAME} for {}", self.profile.name);
        out.push_str("# Changes made here are overwritten on the next generation.\n");
        for line in imports {
            let _ = writeln!(out, "{line}");
        }
        out
    }

    fn keyboard_section(&self) -> String {
        let mut out = String::from("keyboard = KMKKeyboard()\n");
        out.push_str("keyboard.extensions.append(MediaKeys())\n");
        out.push_str("keyboard.modules.append(Layers())\n");
        if !self.config.macros.is_empty() {
            out.push_str("keyboard.modules.append(Macros())\n");
        }
        out
    }

    fn hardware_section(&self) -> String {
        let pins = |list: &[String]| format!("({},)", list.join(", "));
        let mut out = String::from("# --- Hardware Settings ---\n");
        let _ = writeln!(
            out,
            "keyboard.diode_orientation = DiodeOrientation.{}",
            self.profile.diode_orientation.as_kmk()
        );
        let _ = writeln!(out, "keyboard.col_pins = {}", pins(&self.profile.col_pins));
        let _ = writeln!(out, "keyboard.row_pins = {}", pins(&self.profile.row_pins));
        out
    }

    fn keymap_section(&self) -> Result<String> {
        let mut out = String::from("# --- Keymap ---\nkeyboard.keymap = [\n");
        for (layer_idx, layer) in self.config.layers().iter().enumerate() {
            let _ = writeln!(out, "    # Layer {layer_idx}");
            out.push_str("    [\n");
            for (row_idx, row) in layer.rows_iter().enumerate() {
                let mut tokens = Vec::with_capacity(row.len());
                for (col_idx, key) in row.iter().enumerate() {
                    let key_idx = row_idx * layer.cols() + col_idx;
                    tokens.push(self.keymap_token(layer_idx, key_idx, key)?);
                }
                let _ = writeln!(out, "        {},", tokens.join(", "));
            }
            out.push_str("    ],\n");
        }
        out.push_str("]\n");
        Ok(out)
    }

    fn keymap_token(&self, layer: usize, key: usize, assignment: &KeyAssignment) -> Result<String> {
        if assignment.macro_name().is_some() {
            // bound in the macro section
            return Ok("KC.NO".to_string());
        }
        let token = assignment.to_string();
        if assignment.is_primitive() && !self.catalog.is_valid(&token) {
            let suggestion = "Pick a keycode from the catalog (kmkpad keycodes --query ...)";
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidKeycode,
                format!("Unrecognized keycode '{token}'"),
            )
            .with_layer(layer)
            .with_key(key)
            .with_suggestion(suggestion)
            .into());
        }
        Ok(token)
    }

    fn macro_section(&self) -> Result<Option<String>> {
        let slots: Vec<(usize, usize, &str)> = self
            .config
            .keys()
            .filter_map(|(layer, key, assignment)| {
                assignment.macro_name().map(|name| (layer, key, name))
            })
            .collect();
        if self.config.macros.is_empty() && slots.is_empty() {
            return Ok(None);
        }

        let encoder = MacroEncoder::new(self.catalog);
        let mut out = String::from("# --- Macros ---\nmacros = {\n");
        for (name, actions) in &self.config.macros {
            let _ = writeln!(
                out,
                "    {}: {},",
                python::string_literal(name),
                encoder.render(name, actions)?
            );
        }
        out.push_str("}\n");

        out.push_str("macro_slots = [\n");
        for (layer, key, name) in &slots {
            let _ = writeln!(out, "    ({layer}, {key}, {}),", python::string_literal(name));
        }
        out.push_str("]\n");
        out.push_str("for layer_index, key_index, macro_name in macro_slots:\n");
        out.push_str("    keyboard.keymap[layer_index][key_index] = macros.get(macro_name, KC.NO)\n");
        Ok(Some(out))
    }
}
