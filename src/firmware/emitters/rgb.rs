//! Per-key RGB fragment driven by the resolved layer color tables.

use super::{layer_sync_module, python_rows, EmitContext, ExtensionEmitter, ExtensionKind, SourceFragment};
use crate::error::Result;
use crate::firmware::colors::ColorResolver;
use crate::firmware::python;
use crate::models::RgbColor;
use std::fmt::Write as _;

/// Colors written per line of a layer table.
const COLORS_PER_LINE: usize = 8;

/// Renders `rgb_layer_colors`, the `Rgb_matrix` setup and `LayerRgbSync`.
pub struct RgbEmitter;

impl ExtensionEmitter for RgbEmitter {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Rgb
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Option<SourceFragment>> {
        if !ctx.config.extensions.rgb.enabled {
            return Ok(None);
        }
        let rgb = &ctx.config.rgb;
        rgb.check_brightness()?;

        let led_order = ctx.profile.led_order();
        let layers = ColorResolver::new(ctx.config, &led_order).resolve()?;
        let num_pixels = layers.first().map_or(0, |layer| layer.leds.len());

        let mut code = String::from("rgb_layer_colors = [\n");
        for layer in &layers {
            let _ = writeln!(code, "    # Layer {}", layer.layer);
            code.push_str("    [\n");
            code.push_str(&python_rows(color_lines(&layer.leds), "        "));
            code.push_str("    ],\n");
        }
        code.push_str("]\n\n");

        let pixel_pin = rgb.pixel_pin.as_deref().unwrap_or(&ctx.profile.pixel_pin);
        let (r, g, b) = rgb.rgb_order.channels();
        let _ = writeln!(code, "keyboard.rgb_pixel_pin = {pixel_pin}");
        let _ = writeln!(code, "keyboard.num_pixels = {num_pixels}");
        let _ = writeln!(code, "keyboard.brightness_limit = {}", python::float_literal(rgb.brightness));
        let _ = writeln!(code, "keyboard.led_key_pos = list(range({num_pixels}))");
        code.push_str("rgb = Rgb_matrix(\n");
        code.push_str("    ledDisplay=rgb_layer_colors[0],\n");
        let _ = writeln!(code, "    rgb_order=({r}, {g}, {b}),");
        let _ = writeln!(
            code,
            "    disable_auto_write={},",
            python::bool_literal(rgb.disable_auto_write)
        );
        code.push_str(")\n");
        code.push_str("keyboard.extensions.append(rgb)\n\n\n");

        code.push_str("def apply_layer_colors(layer_index):\n");
        code.push_str("    if layer_index >= len(rgb_layer_colors):\n");
        code.push_str("        layer_index = 0\n");
        code.push_str("    rgb.ledDisplay = rgb_layer_colors[layer_index]\n");
        code.push_str("    rgb.setBasedOffDisplay()\n");
        code.push_str("    rgb.neopixel.show()\n");

        Ok(Some(SourceFragment {
            kind: self.kind(),
            imports: vec!["from kmk.extensions.peg_rgb_matrix import Rgb_matrix".to_string()],
            code,
            sync_module: Some(layer_sync_module(
                "LayerRgbSync",
                "layer_rgb_sync",
                "apply_layer_colors",
            )),
        }))
    }
}

fn color_lines(leds: &[RgbColor]) -> Vec<String> {
    leds.chunks(COLORS_PER_LINE)
        .map(|chunk| {
            chunk
                .iter()
                .map(RgbColor::to_python)
                .collect::<Vec<_>>()
                .join(", ")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationErrorKind;
    use crate::keycode_db::KeycodeDb;
    use crate::models::{Configuration, HardwareProfile, KeyAssignment, LedPermutation};

    fn emit_with(config: &Configuration, profile: &HardwareProfile) -> Result<Option<SourceFragment>> {
        let db = KeycodeDb::load().unwrap();
        RgbEmitter.emit(&EmitContext {
            config,
            profile,
            catalog: &db,
        })
    }

    fn enabled() -> Configuration {
        let mut cfg = Configuration::new(&HardwareProfile::chronos_pad());
        cfg.extensions.rgb.enabled = true;
        cfg
    }

    #[test]
    fn test_disabled_emits_nothing() {
        let cfg = Configuration::new(&HardwareProfile::chronos_pad());
        assert!(emit_with(&cfg, &HardwareProfile::chronos_pad()).unwrap().is_none());
    }

    #[test]
    fn test_setup_uses_order_brightness_and_count() {
        let mut cfg = enabled();
        cfg.rgb.underglow_colors = vec!["#000000".into(), "#000000".into()];
        let fragment = emit_with(&cfg, &HardwareProfile::chronos_pad()).unwrap().unwrap();
        assert!(fragment.code.contains("keyboard.rgb_pixel_pin = board.GP9\n"));
        assert!(fragment.code.contains("keyboard.num_pixels = 22\n"));
        assert!(fragment.code.contains("keyboard.brightness_limit = 0.5\n"));
        assert!(fragment.code.contains("    rgb_order=(1, 0, 2),\n"));
        assert!(fragment.code.contains("keyboard.led_key_pos = list(range(22))"));
    }

    #[test]
    fn test_tables_are_physical() {
        let mut cfg = enabled();
        cfg.set_key_at_index(0, 0, KeyAssignment::Letter('A')).unwrap();
        cfg.set_layer_key_color(0, 0, "#FF0000").unwrap();
        let mut profile = HardwareProfile::chronos_pad();
        let mut order: Vec<usize> = (0..20).collect();
        order.swap(0, 1);
        profile.led_order = Some(LedPermutation::new(order).unwrap());
        let fragment = emit_with(&cfg, &profile).unwrap().unwrap();
        assert!(fragment
            .code
            .contains("        [0, 0, 0], [255, 0, 0], [0, 0, 0],"));
    }

    #[test]
    fn test_brightness_out_of_range_is_rejected() {
        let mut cfg = enabled();
        cfg.rgb.brightness = 1.5;
        let err = emit_with(&cfg, &HardwareProfile::chronos_pad()).unwrap_err();
        assert_eq!(err.as_validation().unwrap().kind, ValidationErrorKind::OutOfRangeSetting);
    }

    #[test]
    fn test_sync_module_flushes_new_layer() {
        let fragment = emit_with(&enabled(), &HardwareProfile::chronos_pad()).unwrap().unwrap();
        assert!(fragment.code.contains("    rgb.neopixel.show()\n"));
        assert!(fragment.sync_module.unwrap().contains("apply_layer_colors(current)"));
    }
}
