//! Data models for the keyboard configuration.
//!
//! Models are plain data with invariant-checking mutators. They never touch
//! the filesystem and never generate code.

pub mod boot;
pub mod configuration;
pub mod extensions;
pub mod hardware;
pub mod index_map;
pub mod key;
pub mod layer;
pub mod macros;
pub mod rgb;
pub mod rgb_config;

pub use boot::{BootConfig, UsbId};
pub use configuration::Configuration;
pub use extensions::{
    AnalogConfig, AnalogMode, AnalogRange, DisplayConfig, EncoderButton, EncoderConfig,
    EncoderRotation, ExtensionConfig, RgbExtensionConfig,
};
pub use hardware::{DiodeOrientation, DisplayHardware, EncoderPins, HardwareProfile, LedPermutation};
pub use key::{KeyAssignment, LayerMode, LayerSwitch, Modifier};
pub use layer::{Layer, Position};
pub use macros::MacroAction;
pub use rgb::RgbColor;
pub use rgb_config::{RgbConfig, RgbOrder};
