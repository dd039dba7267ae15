//! Hardware profiles: matrix size, pins and the physical LED order.

use crate::error::{ValidationError, ValidationErrorKind};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Diode direction of the key matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiodeOrientation {
    /// Current flows from column to row
    #[default]
    #[serde(rename = "COL2ROW")]
    Col2Row,
    /// Current flows from row to column
    #[serde(rename = "ROW2COL")]
    Row2Col,
}

impl DiodeOrientation {
    /// Name used by `kmk.scanners.DiodeOrientation`.
    #[must_use]
    pub const fn as_kmk(self) -> &'static str {
        match self {
            Self::Col2Row => "COL2ROW",
            Self::Row2Col => "ROW2COL",
        }
    }
}

/// Rotary encoder wiring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderPins {
    /// Channel A pin
    pub a: String,
    /// Channel B pin
    pub b: String,
    /// Push button pin
    pub button: String,
}

/// I2C OLED wiring and geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayHardware {
    /// I2C data pin
    pub sda: String,
    /// I2C clock pin
    pub scl: String,
    /// I2C device address
    pub address: u8,
    /// Panel width in pixels
    pub width: u16,
    /// Panel height in pixels
    pub height: u16,
    /// Column offset of the SH1106 controller
    #[serde(default = "default_colstart")]
    pub colstart: u8,
}

const fn default_colstart() -> u8 {
    2
}

/// Mapping from logical key index to physical LED index.
///
/// Always a bijection over `0..len`; construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<usize>", into = "Vec<usize>")]
pub struct LedPermutation(Vec<usize>);

impl LedPermutation {
    /// Validates and wraps an LED order table.
    ///
    /// `order[k]` is the physical LED of key `k`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPermutation` if an index repeats or is out of range.
    pub fn new(order: Vec<usize>) -> Result<Self, ValidationError> {
        let mut seen = vec![false; order.len()];
        for (key, &led) in order.iter().enumerate() {
            let Some(slot) = seen.get_mut(led) else {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidPermutation,
                    format!("LED index {led} is outside 0..{}", order.len()),
                )
                .with_key(key));
            };
            if *slot {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidPermutation,
                    format!("LED index {led} is assigned to more than one key"),
                )
                .with_key(key));
            }
            *slot = true;
        }
        Ok(Self(order))
    }

    /// Key `k` drives LED `k`.
    #[must_use]
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    /// Physical LED of a key.
    #[must_use]
    pub fn physical(&self, key: usize) -> Option<usize> {
        self.0.get(key).copied()
    }

    /// Number of keys covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no keys are covered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw table.
    #[must_use]
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }
}

impl TryFrom<Vec<usize>> for LedPermutation {
    type Error = ValidationError;

    fn try_from(order: Vec<usize>) -> Result<Self, Self::Error> {
        Self::new(order)
    }
}

impl From<LedPermutation> for Vec<usize> {
    fn from(permutation: LedPermutation) -> Self {
        permutation.0
    }
}

/// Everything the generator needs to know about the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    /// Display name
    pub name: String,
    /// Matrix rows
    pub rows: usize,
    /// Matrix columns
    pub cols: usize,
    /// Row pins, top row first
    pub row_pins: Vec<String>,
    /// Column pins, left column first
    pub col_pins: Vec<String>,
    /// Diode direction
    #[serde(default)]
    pub diode_orientation: DiodeOrientation,
    /// Physical LED order (identity when omitted)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub led_order: Option<LedPermutation>,
    /// NeoPixel data pin
    pub pixel_pin: String,
    /// Encoder wiring
    pub encoder_pins: EncoderPins,
    /// Slider pin
    pub analog_pin: String,
    /// OLED wiring
    pub display: DisplayHardware,
}

impl HardwareProfile {
    /// The Chronos Pad: a 5×4 RP2040 macropad.
    #[must_use]
    pub fn chronos_pad() -> Self {
        let pins = |names: &[&str]| names.iter().map(|p| format!("board.{p}")).collect();
        Self {
            name: "Chronos Pad".to_string(),
            rows: 5,
            cols: 4,
            row_pins: pins(&["GP8", "GP7", "GP6", "GP5", "GP4"]),
            col_pins: pins(&["GP0", "GP1", "GP2", "GP3"]),
            diode_orientation: DiodeOrientation::Col2Row,
            led_order: Some(LedPermutation::identity(20)),
            pixel_pin: "board.GP9".to_string(),
            encoder_pins: EncoderPins {
                a: "board.GP10".to_string(),
                b: "board.GP11".to_string(),
                button: "board.GP14".to_string(),
            },
            analog_pin: "board.GP28".to_string(),
            display: DisplayHardware {
                sda: "board.GP20".to_string(),
                scl: "board.GP21".to_string(),
                address: 0x3C,
                width: 128,
                height: 64,
                colstart: default_colstart(),
            },
        }
    }

    /// Number of key positions.
    #[must_use]
    pub const fn key_count(&self) -> usize {
        self.rows * self.cols
    }

    /// The LED order, identity when the profile does not specify one.
    #[must_use]
    pub fn led_order(&self) -> LedPermutation {
        self.led_order
            .clone()
            .unwrap_or_else(|| LedPermutation::identity(self.key_count()))
    }

    /// Checks that pin lists and LED order agree with the matrix size.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` or `InvalidPermutation` describing the
    /// first inconsistency.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!("Matrix must have at least one row and column, got {}x{}", self.rows, self.cols),
            ));
        }
        if self.row_pins.len() != self.rows {
            return Err(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!("{} row pins for {} rows", self.row_pins.len(), self.rows),
            ));
        }
        if self.col_pins.len() != self.cols {
            return Err(ValidationError::new(
                ValidationErrorKind::DimensionMismatch,
                format!("{} column pins for {} columns", self.col_pins.len(), self.cols),
            ));
        }
        if let Some(order) = &self.led_order {
            if order.len() != self.key_count() {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidPermutation,
                    format!(
                        "LED order covers {} keys, matrix has {}",
                        order.len(),
                        self.key_count()
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Parses and validates a profile from TOML.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let profile: Self = toml::from_str(content).context("Failed to parse hardware profile")?;
        profile
            .validate()
            .with_context(|| format!("Invalid hardware profile '{}'", profile.name))?;
        Ok(profile)
    }

    /// Loads a profile from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read hardware profile: {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to load hardware profile: {}", path.display()))
    }
}

impl Default for HardwareProfile {
    fn default() -> Self {
        Self::chronos_pad()
    }
}
