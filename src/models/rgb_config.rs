//! Per-key RGB matrix settings (`rgb_matrix_config`).

use crate::error::{ValidationError, ValidationErrorKind};
use crate::models::index_map;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Default brightness written into new configurations.
pub const DEFAULT_BRIGHTNESS: f64 = 0.5;

/// Default palette color for keys without an entry.
pub const DEFAULT_KEY_COLOR: &str = "#FFFFFF";

/// Byte order of the LED strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RgbOrder {
    /// Red, green, blue
    Rgb,
    /// Red, blue, green
    Rbg,
    /// Green, red, blue (SK6812 default)
    #[default]
    Grb,
    /// Green, blue, red
    Gbr,
    /// Blue, red, green
    Brg,
    /// Blue, green, red
    Bgr,
}

impl RgbOrder {
    /// Channel index tuple expected by the Peg RGB matrix driver.
    #[must_use]
    pub const fn channels(self) -> (u8, u8, u8) {
        match self {
            Self::Rgb => (0, 1, 2),
            Self::Rbg => (0, 2, 1),
            Self::Grb => (1, 0, 2),
            Self::Gbr => (1, 2, 0),
            Self::Brg => (2, 0, 1),
            Self::Bgr => (2, 1, 0),
        }
    }
}

impl fmt::Display for RgbOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Rgb => "RGB",
            Self::Rbg => "RBG",
            Self::Grb => "GRB",
            Self::Gbr => "GBR",
            Self::Brg => "BRG",
            Self::Bgr => "BGR",
        };
        f.write_str(name)
    }
}

/// RGB matrix configuration.
///
/// Colors stay as the raw strings the editor wrote; they are parsed when
/// colors are resolved so a bad entry can be reported with its layer and
/// key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RgbConfig {
    /// Pixel data pin override (profile pin when absent)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pixel_pin: Option<String>,
    /// Brightness limit in `[0, 1]`
    pub brightness: f64,
    /// LED byte order
    pub rgb_order: RgbOrder,
    /// Only flush the strip on explicit `show()`
    pub disable_auto_write: bool,
    /// Palette fallback for keys without a `key_colors` entry
    pub default_key_color: String,
    /// Global palette: key index → hex color
    #[serde(with = "index_map")]
    pub key_colors: BTreeMap<usize, String>,
    /// Per-layer overrides: layer index → key index → hex color
    #[serde(with = "index_map::nested")]
    pub layer_key_colors: BTreeMap<usize, BTreeMap<usize, String>>,
    /// Underglow LEDs after the key LEDs, in strip order
    pub underglow_colors: Vec<String>,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for RgbConfig {
    fn default() -> Self {
        Self {
            pixel_pin: None,
            brightness: DEFAULT_BRIGHTNESS,
            rgb_order: RgbOrder::default(),
            disable_auto_write: true,
            default_key_color: DEFAULT_KEY_COLOR.to_string(),
            key_colors: BTreeMap::new(),
            layer_key_colors: BTreeMap::new(),
            underglow_colors: Vec::new(),
            extra: BTreeMap::new(),
        }
    }
}

impl RgbConfig {
    /// Returns the override color for a key on a layer, if any.
    #[must_use]
    pub fn layer_override(&self, layer: usize, key: usize) -> Option<&str> {
        self.layer_key_colors
            .get(&layer)
            .and_then(|keys| keys.get(&key))
            .map(String::as_str)
    }

    /// Sets (or replaces) a per-layer override.
    pub fn set_layer_override(&mut self, layer: usize, key: usize, color: impl Into<String>) {
        self.layer_key_colors
            .entry(layer)
            .or_default()
            .insert(key, color.into());
    }

    /// Checks that brightness lies in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns `OutOfRangeSetting` for NaN or out-of-range values.
    pub fn check_brightness(&self) -> Result<(), ValidationError> {
        if (0.0..=1.0).contains(&self.brightness) {
            Ok(())
        } else {
            Err(ValidationError::new(
                ValidationErrorKind::OutOfRangeSetting,
                format!("Brightness {} is outside [0, 1]", self.brightness),
            ))
        }
    }

    /// Drops the overrides of `layer` and shifts higher layers down by one.
    pub(crate) fn remove_layer_overrides(&mut self, layer: usize) {
        let old = std::mem::take(&mut self.layer_key_colors);
        self.layer_key_colors = old
            .into_iter()
            .filter(|(index, _)| *index != layer)
            .map(|(index, keys)| if index > layer { (index - 1, keys) } else { (index, keys) })
            .collect();
    }
}
