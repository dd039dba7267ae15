//! Optional hardware extensions rendered as `code.py` fragments.
//!
//! Each emitter looks at its own settings in the configuration and returns
//! `None` when disabled. The orchestrator runs them in [`emitters`] order and
//! is the only place fragments are concatenated.

pub mod analog;
pub mod display;
pub mod encoder;
pub mod rgb;

use crate::error::Result;
use crate::keycode_db::KeycodeCatalog;
use crate::models::{Configuration, HardwareProfile};
use std::fmt;
use std::fmt::Write as _;

/// Name of the redraw function the display fragment defines.
pub const DISPLAY_UPDATE_HOOK: &str = "update_display_for_layer";

/// KMK module hook points every generated sync module implements.
const MODULE_HOOKS: &[&str] = &[
    "during_bootup",
    "before_matrix_scan",
    "after_matrix_scan",
    "before_hid_send",
    "after_hid_send",
    "on_powersave_enable",
    "on_powersave_disable",
];

/// Hooks where a sync module checks the active layer.
const LAYER_CHECK_HOOKS: &[&str] = &["during_bootup", "after_matrix_scan", "after_hid_send"];

/// Extension subsystem a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtensionKind {
    /// Rotary encoder
    Encoder,
    /// Analog slider
    AnalogInput,
    /// OLED display
    Display,
    /// Per-key RGB
    Rgb,
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Encoder => "Encoder",
            Self::AnalogInput => "Analog Input",
            Self::Display => "Display",
            Self::Rgb => "RGB",
        })
    }
}

/// Inputs shared by all emitters.
#[derive(Clone, Copy)]
pub struct EmitContext<'a> {
    /// The model being synthesized
    pub config: &'a Configuration,
    /// Target board
    pub profile: &'a HardwareProfile,
    /// Keycode validity check for user-supplied tokens
    pub catalog: &'a dyn KeycodeCatalog,
}

impl EmitContext<'_> {
    /// Whether the display fragment will define [`DISPLAY_UPDATE_HOOK`].
    #[must_use]
    pub const fn display_enabled(&self) -> bool {
        self.config.extensions.display.enabled
    }
}

/// Source produced by one emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFragment {
    /// Producing subsystem
    pub kind: ExtensionKind,
    /// Import lines, hoisted into the file header
    pub imports: Vec<String>,
    /// Setup code
    pub code: String,
    /// Runtime module keeping the extension in step with the active layer
    pub sync_module: Option<String>,
}

/// One optional subsystem of the generated firmware.
pub trait ExtensionEmitter {
    /// Subsystem this emitter renders.
    fn kind(&self) -> ExtensionKind;

    /// Renders the fragment, or `None` when the extension is disabled.
    ///
    /// # Errors
    ///
    /// Returns a validation error for settings that cannot be rendered.
    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Option<SourceFragment>>;
}

/// All emitters in output order.
#[must_use]
pub fn emitters() -> Vec<Box<dyn ExtensionEmitter>> {
    vec![
        Box::new(encoder::EncoderEmitter),
        Box::new(analog::AnalogEmitter),
        Box::new(display::DisplayEmitter),
        Box::new(rgb::RgbEmitter),
    ]
}

/// Renders a KMK module class that calls `callback(layer)` whenever the
/// active layer differs from the last one it saw, then registers it.
pub(crate) fn layer_sync_module(class_name: &str, instance: &str, callback: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "class {class_name}:");
    out.push_str("    def __init__(self):\n");
    out.push_str("        self.last_layer = None\n\n");
    out.push_str("    def refresh(self, keyboard):\n");
    out.push_str("        layers = getattr(keyboard, 'active_layers', None)\n");
    out.push_str("        current = layers[0] if layers else 0\n");
    out.push_str("        if current != self.last_layer:\n");
    out.push_str("            self.last_layer = current\n");
    let _ = writeln!(out, "            {callback}(current)");

    for hook in MODULE_HOOKS {
        let _ = writeln!(out, "\n    def {hook}(self, keyboard):");
        if LAYER_CHECK_HOOKS.contains(hook) {
            out.push_str("        self.refresh(keyboard)\n");
        } else {
            out.push_str("        return\n");
        }
    }

    let _ = write!(
        out,
        "\n\n{instance} = {class_name}()\nkeyboard.modules.append({instance})\n"
    );
    out
}

/// Renders a Python list of rows, one row per line, at `indent`.
pub(crate) fn python_rows<I, S>(rows: I, indent: &str) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for row in rows {
        let _ = writeln!(out, "{indent}{},", row.as_ref());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emitter_order_is_fixed() {
        let kinds: Vec<ExtensionKind> = emitters().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ExtensionKind::Encoder,
                ExtensionKind::AnalogInput,
                ExtensionKind::Display,
                ExtensionKind::Rgb
            ]
        );
    }

    #[test]
    fn test_sync_module_checks_layer_on_scan_and_send() {
        let module = layer_sync_module("LayerRgbSync", "layer_rgb_sync", "apply_layer_colors");
        assert!(module.starts_with("class LayerRgbSync:\n"));
        assert!(module.contains("    def after_matrix_scan(self, keyboard):\n        self.refresh(keyboard)\n"));
        assert!(module.contains("    def after_hid_send(self, keyboard):\n        self.refresh(keyboard)\n"));
        assert!(module.contains("    def before_hid_send(self, keyboard):\n        return\n"));
        assert!(module.contains("            apply_layer_colors(current)\n"));
        assert!(module.ends_with("keyboard.modules.append(layer_rgb_sync)\n"));
    }
}
