//! SH1106 OLED fragment showing the active layer's key labels.

use super::{
    layer_sync_module, python_rows, EmitContext, ExtensionEmitter, ExtensionKind, SourceFragment,
    DISPLAY_UPDATE_HOOK,
};
use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::firmware::python;
use crate::keycode_db::display::key_label;
use crate::models::Layer;
use std::fmt::Write as _;

/// Pixel rows reserved for the "Layer N" header.
const HEADER_HEIGHT: u16 = 12;

/// Renders display setup, the label table and the redraw function.
pub struct DisplayEmitter;

impl ExtensionEmitter for DisplayEmitter {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::Display
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Option<SourceFragment>> {
        let settings = &ctx.config.extensions.display;
        if !settings.enabled {
            return Ok(None);
        }
        if !matches!(settings.rotation, 0 | 90 | 180 | 270) {
            return Err(ValidationError::new(
                ValidationErrorKind::OutOfRangeSetting,
                format!("Display rotation must be 0, 90, 180 or 270, got {}", settings.rotation),
            )
            .into());
        }

        let hw = &ctx.profile.display;
        let mut code = String::new();
        code.push_str("displayio.release_displays()\n");
        let _ = writeln!(code, "i2c = busio.I2C(scl={}, sda={})", hw.scl, hw.sda);
        let _ = writeln!(
            code,
            "display_bus = I2CDisplayBus(i2c, device_address={:#04X})",
            hw.address
        );
        let _ = writeln!(
            code,
            "display = adafruit_displayio_sh1106.SH1106(display_bus, width={}, height={}, rotation={}, colstart={})",
            hw.width, hw.height, settings.rotation, hw.colstart
        );
        code.push_str("splash = displayio.Group()\n");
        code.push_str("display.root_group = splash\n\n");

        code.push_str("all_layer_labels = [\n");
        for (index, layer) in ctx.config.layers().iter().enumerate() {
            let _ = writeln!(code, "    # Layer {index}");
            code.push_str("    [\n");
            code.push_str(&python_rows(label_rows(layer), "        "));
            code.push_str("    ],\n");
        }
        code.push_str("]\n\n\n");

        let cols = u16::try_from(ctx.profile.cols.max(1)).unwrap_or(u16::MAX);
        let rows = u16::try_from(ctx.profile.rows.max(1)).unwrap_or(u16::MAX);
        let top = if settings.layer_indicator { HEADER_HEIGHT } else { 2 };
        let col_spacing = hw.width / cols;
        let row_spacing = hw.height.saturating_sub(top) / rows;

        let _ = writeln!(code, "def {DISPLAY_UPDATE_HOOK}(layer_index):");
        code.push_str("    while len(splash) > 0:\n");
        code.push_str("        splash.pop()\n");
        code.push_str("    if layer_index >= len(all_layer_labels):\n");
        code.push_str("        layer_index = 0\n");
        if settings.layer_indicator {
            code.push_str(
                "    splash.append(label.Label(terminalio.FONT, text='Layer ' + str(layer_index), color=0xFFFFFF, x=2, y=4))\n",
            );
        }
        code.push_str("    for row_index, row in enumerate(all_layer_labels[layer_index]):\n");
        code.push_str("        for col_index, text in enumerate(row):\n");
        let _ = writeln!(
            code,
            "            splash.append(label.Label(terminalio.FONT, text=text, color=0xFFFFFF, x=({} - col_index) * {col_spacing} + 1, y=row_index * {row_spacing} + {}))",
            cols - 1,
            top + row_spacing / 2
        );
        let _ = write!(code, "\n\n{DISPLAY_UPDATE_HOOK}(0)\n");

        let sync_module = settings
            .auto_update
            .then(|| layer_sync_module("LayerDisplaySync", "layer_display_sync", DISPLAY_UPDATE_HOOK));

        Ok(Some(SourceFragment {
            kind: self.kind(),
            imports: vec![
                "import busio".to_string(),
                "import displayio".to_string(),
                "import terminalio".to_string(),
                "import adafruit_displayio_sh1106".to_string(),
                "from adafruit_display_text import label".to_string(),
                "from i2cdisplaybus import I2CDisplayBus".to_string(),
            ],
            code,
            sync_module,
        }))
    }
}

/// Python list literals of one layer's labels, one per matrix row.
///
/// The pad is mounted rotated 180 degrees, so the bottom matrix row comes
/// first and the redraw mirrors columns.
fn label_rows(layer: &Layer) -> Vec<String> {
    let rows: Vec<&[_]> = layer.rows_iter().collect();
    rows.into_iter()
        .rev()
        .map(|row| {
            let labels: Vec<String> = row
                .iter()
                .map(|key| python::string_literal(&key_label(key)))
                .collect();
            format!("[{}]", labels.join(", "))
        })
        .collect()
}
