//! Structured settings for the optional hardware extensions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// What turning the encoder does.
///
/// Tagged by `type`. Unknown fields next to the tag are not kept, so a
/// snapshot saved by this version drops them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncoderRotation {
    /// Step through layers with wraparound
    #[default]
    CycleLayers,
    /// Volume down / up
    Volume,
    /// Screen brightness down / up
    Brightness,
    /// Previous / next track
    Media,
    /// Arbitrary keycodes
    Custom {
        /// Counter-clockwise keycode
        ccw: String,
        /// Clockwise keycode
        cw: String,
    },
}

impl EncoderRotation {
    /// `(ccw, cw)` keycodes before inversion.
    #[must_use]
    pub fn keycodes(&self) -> (&str, &str) {
        match self {
            Self::CycleLayers => ("KC.LAYER_PREV", "KC.LAYER_NEXT"),
            Self::Volume => ("KC.VOLD", "KC.VOLU"),
            Self::Brightness => ("KC.BRID", "KC.BRIU"),
            Self::Media => ("KC.MPRV", "KC.MNXT"),
            Self::Custom { ccw, cw } => (ccw, cw),
        }
    }
}

/// What pressing the encoder does.
///
/// Tagged by `type`. Unknown fields next to the tag are not kept, so a
/// snapshot saved by this version drops them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EncoderButton {
    /// Return to layer 0
    #[default]
    ResetLayer,
    /// Toggle a layer
    ToggleLayer {
        /// Layer to toggle
        layer: usize,
    },
    /// Mute
    Mute,
    /// Play / pause
    PlayPause,
    /// Arbitrary keycode
    Custom {
        /// Keycode token
        key: String,
    },
}

const fn default_divisor() -> u8 {
    4
}

/// Rotary encoder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    /// Whether the encoder is emitted at all
    pub enabled: bool,
    /// Rotation behavior
    pub rotation: EncoderRotation,
    /// Button behavior
    pub button: EncoderButton,
    /// Detent pulses per action
    pub divisor: u8,
    /// Swap the rotation direction
    pub invert: bool,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rotation: EncoderRotation::default(),
            button: EncoderButton::default(),
            divisor: default_divisor(),
            invert: false,
            extra: BTreeMap::new(),
        }
    }
}

/// One absolute-range entry for the analog input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalogRange {
    /// Inclusive lower bound of the raw sample (0-65535)
    pub min: u16,
    /// Inclusive upper bound of the raw sample
    pub max: u16,
    /// Keycode tapped when the sample enters this range
    pub action: String,
}

const fn default_step_size() -> u8 {
    1
}

const fn default_idle_timeout() -> f64 {
    2.0
}

const fn default_brightness_max() -> f64 {
    0.3
}

fn default_increase() -> String {
    "KC.VOLU".to_string()
}

fn default_decrease() -> String {
    "KC.VOLD".to_string()
}

/// How analog samples turn into actions.
///
/// Tagged by `type`. Unknown fields next to the tag are not kept, so a
/// snapshot saved by this version drops them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnalogMode {
    /// Tap `increase` / `decrease` as the slider moves
    Direction {
        /// Keycode for upward movement
        #[serde(default = "default_increase")]
        increase: String,
        /// Keycode for downward movement
        #[serde(default = "default_decrease")]
        decrease: String,
        /// Taps per detected movement
        #[serde(default = "default_step_size")]
        step_size: u8,
        /// Seconds of stillness after which the next movement only re-syncs
        #[serde(default = "default_idle_timeout")]
        idle_timeout: f64,
    },
    /// Drive RGB brightness from the slider position
    Brightness {
        /// Brightness at full travel
        #[serde(default = "default_brightness_max")]
        max: f64,
    },
    /// Tap an action when the slider enters a range
    Ranges {
        /// Range table, checked in order
        #[serde(default)]
        ranges: Vec<AnalogRange>,
    },
}

impl Default for AnalogMode {
    fn default() -> Self {
        Self::Direction {
            increase: default_increase(),
            decrease: default_decrease(),
            step_size: default_step_size(),
            idle_timeout: default_idle_timeout(),
        }
    }
}

/// Analog input (slider) settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalogConfig {
    /// Whether the analog input is emitted at all
    pub enabled: bool,
    /// Mapping mode
    pub mode: AnalogMode,
    /// Changes at or below this raw delta are noise
    pub threshold: u16,
    /// Seconds between samples
    pub poll_interval: f64,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for AnalogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            mode: AnalogMode::default(),
            threshold: 2000,
            poll_interval: 0.05,
            extra: BTreeMap::new(),
        }
    }
}

/// OLED display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Whether the display is emitted at all
    pub enabled: bool,
    /// Draw a "Layer N" header above the key grid
    pub layer_indicator: bool,
    /// Redraw automatically when the active layer changes
    pub auto_update: bool,
    /// Panel rotation in degrees
    pub rotation: u16,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            layer_indicator: true,
            auto_update: true,
            rotation: 180,
            extra: BTreeMap::new(),
        }
    }
}

/// RGB extension toggle; colors live in `rgb_matrix_config`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RgbExtensionConfig {
    /// Whether the RGB matrix is emitted at all
    pub enabled: bool,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// All extension settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionConfig {
    /// Rotary encoder
    pub encoder: EncoderConfig,
    /// Analog slider
    pub analogin: AnalogConfig,
    /// OLED display
    pub display: DisplayConfig,
    /// Per-key RGB
    pub rgb: RgbExtensionConfig,
    /// Extensions this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}
