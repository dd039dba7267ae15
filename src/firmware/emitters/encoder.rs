//! Rotary encoder fragment.

use super::{EmitContext, ExtensionEmitter, ExtensionKind, SourceFragment, DISPLAY_UPDATE_HOOK};
use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::firmware::python;
use crate::models::{EncoderButton, EncoderRotation};
use std::fmt::Write as _;

/// Keys created by the layer cycler.
const LAYER_NEXT: &str = "KC.LAYER_NEXT";
const LAYER_PREV: &str = "KC.LAYER_PREV";
const LAYER_RESET: &str = "KC.LAYER_RESET";

/// Renders `EncoderHandler` setup and, for layer cycling, the `LayerCycler`.
pub struct EncoderEmitter;

impl ExtensionEmitter for EncoderEmitter {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Encoder
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Option<SourceFragment>> {
        let settings = &ctx.config.extensions.encoder;
        if !settings.enabled {
            return Ok(None);
        }
        if settings.divisor == 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::OutOfRangeSetting,
                "Encoder divisor must be at least 1",
            )
            .into());
        }

        let cycles = settings.rotation == EncoderRotation::CycleLayers;
        let (ccw, cw) = settings.rotation.keycodes();
        let press = button_keycode(&settings.button, cycles);
        for token in [ccw, cw, press.as_str()] {
            if !is_cycler_key(token) && !ctx.catalog.is_valid(token) {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidKeycode,
                    format!("Encoder action '{token}' is not a recognized keycode"),
                )
                .into());
            }
        }

        let mut imports = vec!["from kmk.modules.encoder import EncoderHandler".to_string()];
        let mut code = String::new();
        if cycles {
            imports.push("from kmk.keys import make_key".to_string());
            code.push_str(&layer_cycler(ctx.display_enabled()));
            code.push('\n');
        }

        let pins = &ctx.profile.encoder_pins;
        code.push_str("encoder_handler = EncoderHandler()\n");
        let _ = writeln!(
            code,
            "encoder_handler.pins = (({}, {}, {}, {}),)",
            pins.a,
            pins.b,
            pins.button,
            python::bool_literal(settings.invert)
        );
        let _ = writeln!(code, "encoder_handler.divisor = {}", settings.divisor);
        code.push_str("encoder_handler.map = [\n");
        for layer in 0..ctx.config.layer_count() {
            let _ = writeln!(code, "    (({ccw}, {cw}, {press}),),  # Layer {layer}");
        }
        code.push_str("]\n");
        code.push_str("keyboard.modules.append(encoder_handler)\n");

        Ok(Some(SourceFragment {
            kind: self.kind(),
            imports,
            code,
            sync_module: None,
        }))
    }
}

fn is_cycler_key(token: &str) -> bool {
    [LAYER_NEXT, LAYER_PREV, LAYER_RESET].contains(&token)
}

fn button_keycode(button: &EncoderButton, cycles: bool) -> String {
    match button {
        EncoderButton::ResetLayer if cycles => LAYER_RESET.to_string(),
        EncoderButton::ResetLayer => "KC.TO(0)".to_string(),
        EncoderButton::ToggleLayer { layer } => format!("KC.TG({layer})"),
        EncoderButton::Mute => "KC.MUTE".to_string(),
        EncoderButton::PlayPause => "KC.MPLY".to_string(),
        EncoderButton::Custom { key } => key.clone(),
    }
}

fn layer_cycler(notify_display: bool) -> String {
    let mut out = String::new();
    out.push_str("class LayerCycler:\n");
    out.push_str("    def __init__(self, keyboard, num_layers):\n");
    out.push_str("        self.keyboard = keyboard\n");
    out.push_str("        self.num_layers = num_layers\n");
    out.push_str("        self.current_layer = 0\n\n");
    out.push_str("    def apply(self):\n");
    out.push_str("        self.keyboard.active_layers[0] = self.current_layer\n");
    if notify_display {
        let _ = writeln!(out, "        {DISPLAY_UPDATE_HOOK}(self.current_layer)");
    }
    out.push('\n');
    out.push_str("    def next_layer(self):\n");
    out.push_str("        self.current_layer = (self.current_layer + 1) % self.num_layers\n");
    out.push_str("        self.apply()\n\n");
    out.push_str("    def prev_layer(self):\n");
    out.push_str("        self.current_layer = (self.current_layer - 1) % self.num_layers\n");
    out.push_str("        self.apply()\n\n");
    out.push_str("    def reset_layer(self):\n");
    out.push_str("        self.current_layer = 0\n");
    out.push_str("        self.apply()\n\n\n");
    out.push_str("layer_cycler = LayerCycler(keyboard, len(keyboard.keymap))\n");
    out.push_str("make_key(names=('LAYER_NEXT',), on_press=lambda *args: layer_cycler.next_layer())\n");
    out.push_str("make_key(names=('LAYER_PREV',), on_press=lambda *args: layer_cycler.prev_layer())\n");
    out.push_str("make_key(names=('LAYER_RESET',), on_press=lambda *args: layer_cycler.reset_layer())\n");
    out
}
