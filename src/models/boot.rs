//! `boot.py` settings (`boot_config`).

use crate::models::Position;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// USB identity reported by the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsbId {
    /// Manufacturer string
    pub manufacturer: String,
    /// Product string
    pub product: String,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl UsbId {
    /// Creates a USB identity.
    pub fn new(manufacturer: impl Into<String>, product: impl Into<String>) -> Self {
        Self {
            manufacturer: manufacturer.into(),
            product: product.into(),
            extra: BTreeMap::new(),
        }
    }
}

/// Boot-time USB configuration.
///
/// Disabled by default, in which case no `boot.py` is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootConfig {
    /// Generate `boot.py`
    pub enabled: bool,
    /// Keep the CIRCUITPY drive visible
    pub storage: bool,
    /// Keep the serial console
    pub cdc_console: bool,
    /// Expose a MIDI device
    pub midi: bool,
    /// Use an n-key-rollover HID report
    pub nkro: bool,
    /// USB manufacturer / product override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usb_id: Option<UsbId>,
    /// Key held at plug-in that keeps storage and console enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_key: Option<Position>,
    /// Fields this version does not know about
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            storage: true,
            cdc_console: true,
            midi: false,
            nkro: false,
            usb_id: None,
            boot_key: None,
            extra: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_usb_id_fields_survive() {
        let json = r#"{"enabled": true, "usb_id": {"manufacturer": "Acme", "product": "Pad", "serial": "0042"}}"#;
        let boot: BootConfig = serde_json::from_str(json).unwrap();
        assert_eq!(boot.usb_id.as_ref().map(|id| id.product.as_str()), Some("Pad"));
        let back = serde_json::to_value(&boot).unwrap();
        assert_eq!(back["usb_id"]["serial"], "0042");
    }
}
