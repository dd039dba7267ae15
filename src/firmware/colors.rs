//! Per-layer LED color resolution.
//!
//! For every layer and key the effective color is:
//!
//! 1. off, if the key is `KC.NO` (overrides are ignored);
//! 2. the layer's override for that key, if one exists;
//! 3. for `KC.TRNS`, the resolved color of the nearest lower layer that is
//!    not transparent at that key, or the palette when there is none;
//! 4. otherwise the global palette entry, falling back to
//!    `default_key_color`.
//!
//! Key colors are then placed at their physical LED index and underglow
//! colors are appended in strip order.

use crate::error::{CoreError, Result, ValidationError, ValidationErrorKind};
use crate::models::{Configuration, LedPermutation, RgbColor};

/// Resolved colors of one layer, in physical LED order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerColors {
    /// Layer index
    pub layer: usize,
    /// Key LEDs in physical order, then underglow LEDs
    pub leds: Vec<RgbColor>,
}

/// Resolves the LED colors of every layer.
pub struct ColorResolver<'a> {
    config: &'a Configuration,
    led_order: &'a LedPermutation,
}

impl<'a> ColorResolver<'a> {
    /// Creates a resolver for a configuration and the board's LED order.
    #[must_use]
    pub fn new(config: &'a Configuration, led_order: &'a LedPermutation) -> Self {
        Self { config, led_order }
    }

    /// Effective color per layer, indexed by logical key index.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the layer/key for malformed
    /// colors, out-of-range indices, or a layer whose size does not match
    /// the LED order.
    pub fn resolve_logical(&self) -> Result<Vec<Vec<RgbColor>>> {
        let key_count = self.led_order.len();
        self.check_indices(key_count)?;
        let palette = self.palette(key_count)?;
        let layers = self.config.layers();

        let mut resolved: Vec<Vec<RgbColor>> = Vec::with_capacity(layers.len());
        for (layer_idx, layer) in layers.iter().enumerate() {
            if layer.len() != key_count {
                return Err(ValidationError::new(
                    ValidationErrorKind::DimensionMismatch,
                    format!("Layer has {} keys but the board has {key_count} LEDs", layer.len()),
                )
                .with_layer(layer_idx)
                .into());
            }

            let mut colors = Vec::with_capacity(key_count);
            for (key_idx, key) in layer.keys().iter().enumerate() {
                let color = if key.is_no_op() {
                    RgbColor::OFF
                } else if let Some(hex) = self.config.rgb.layer_override(layer_idx, key_idx) {
                    RgbColor::from_hex(hex).map_err(|e| e.with_layer(layer_idx).with_key(key_idx))?
                } else if key.is_transparent() {
                    (0..layer_idx)
                        .rev()
                        .find(|&lower| {
                            layers[lower]
                                .get(key_idx)
                                .is_some_and(|k| !k.is_transparent())
                        })
                        .map_or(palette[key_idx], |lower| resolved[lower][key_idx])
                } else {
                    palette[key_idx]
                };
                colors.push(color);
            }
            resolved.push(colors);
        }

        Ok(resolved)
    }

    /// Effective colors per layer in physical LED order, underglow appended.
    ///
    /// # Errors
    ///
    /// Same as [`ColorResolver::resolve_logical`], plus malformed underglow
    /// colors.
    pub fn resolve(&self) -> Result<Vec<LayerColors>> {
        let underglow = self.underglow()?;
        let logical = self.resolve_logical()?;

        logical
            .into_iter()
            .enumerate()
            .map(|(layer, colors)| -> Result<LayerColors> {
                let mut leds = vec![RgbColor::OFF; colors.len()];
                for (key, color) in colors.into_iter().enumerate() {
                    let led = self.led_order.physical(key).ok_or_else(|| {
                        ValidationError::new(
                            ValidationErrorKind::InvalidPermutation,
                            format!("No LED for key {key}"),
                        )
                        .with_layer(layer)
                        .with_key(key)
                    })?;
                    leds[led] = color;
                }
                leds.extend_from_slice(&underglow);
                Ok(LayerColors { layer, leds })
            })
            .collect()
    }

    /// Underglow colors in strip order.
    ///
    /// # Errors
    ///
    /// Returns `MalformedColor` naming the underglow slot.
    pub fn underglow(&self) -> Result<Vec<RgbColor>> {
        self.config
            .rgb
            .underglow_colors
            .iter()
            .enumerate()
            .map(|(slot, hex)| {
                RgbColor::from_hex(hex).map_err(|e| {
                    CoreError::from(ValidationError {
                        message: format!("Underglow LED {slot}: {}", e.message),
                        ..e
                    })
                })
            })
            .collect()
    }

    fn palette(&self, key_count: usize) -> Result<Vec<RgbColor>> {
        let rgb = &self.config.rgb;
        let fallback = RgbColor::from_hex(&rgb.default_key_color).map_err(|e| ValidationError {
            message: format!("default_key_color: {}", e.message),
            ..e
        })?;

        (0..key_count)
            .map(|key| {
                rgb.key_colors.get(&key).map_or(Ok(fallback), |hex| {
                    RgbColor::from_hex(hex).map_err(|e| CoreError::from(e.with_key(key)))
                })
            })
            .collect()
    }

    fn check_indices(&self, key_count: usize) -> Result<()> {
        let rgb = &self.config.rgb;
        let layer_count = self.config.layer_count();

        if let Some(&key) = rgb.key_colors.keys().find(|&&k| k >= key_count) {
            return Err(palette_out_of_range(key, key_count).into());
        }

        for (&layer, keys) in &rgb.layer_key_colors {
            if layer >= layer_count {
                return Err(overrides_out_of_range(layer, layer_count).into());
            }
            if let Some(&key) = keys.keys().find(|&&k| k >= key_count) {
                return Err(override_out_of_range(layer, key, key_count).into());
            }
        }

        Ok(())
    }

    /// Every color problem at once: bad indices and malformed colors in
    /// the palette, the layer overrides and the underglow.
    ///
    /// Overrides on `KC.NO` keys are skipped, since resolution never reads
    /// them.
    #[must_use]
    pub fn problems(&self) -> Vec<ValidationError> {
        let rgb = &self.config.rgb;
        let key_count = self.led_order.len();
        let layers = self.config.layers();
        let mut problems = Vec::new();

        if let Err(e) = RgbColor::from_hex(&rgb.default_key_color) {
            problems.push(ValidationError {
                message: format!("default_key_color: {}", e.message),
                ..e
            });
        }

        for (&key, hex) in &rgb.key_colors {
            if key >= key_count {
                problems.push(palette_out_of_range(key, key_count));
            } else if let Err(e) = RgbColor::from_hex(hex) {
                problems.push(e.with_key(key));
            }
        }

        for (&layer, keys) in &rgb.layer_key_colors {
            let Some(grid) = layers.get(layer) else {
                problems.push(overrides_out_of_range(layer, layers.len()));
                continue;
            };
            for (&key, hex) in keys {
                if key >= key_count {
                    problems.push(override_out_of_range(layer, key, key_count));
                } else if grid.get(key).is_some_and(|k| !k.is_no_op()) {
                    if let Err(e) = RgbColor::from_hex(hex) {
                        problems.push(e.with_layer(layer).with_key(key));
                    }
                }
            }
        }

        for (slot, hex) in rgb.underglow_colors.iter().enumerate() {
            if let Err(e) = RgbColor::from_hex(hex) {
                problems.push(ValidationError {
                    message: format!("Underglow LED {slot}: {}", e.message),
                    ..e
                });
            }
        }

        problems
    }
}

fn palette_out_of_range(key: usize, key_count: usize) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::KeyIndexOutOfRange,
        format!("Palette color for key {key}, board has {key_count} keys"),
    )
    .with_key(key)
}

fn overrides_out_of_range(layer: usize, layer_count: usize) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::LayerOutOfRange,
        format!("Color overrides for layer {layer}, configuration has {layer_count} layers"),
    )
    .with_layer(layer)
}

fn override_out_of_range(layer: usize, key: usize, key_count: usize) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::KeyIndexOutOfRange,
        format!("Color override for key {key}, board has {key_count} keys"),
    )
    .with_layer(layer)
    .with_key(key)
}
