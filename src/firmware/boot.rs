//! `boot.py` generation from `boot_config`.
//!
//! The boot key is wired like any matrix key, so the sense/source pins for
//! `bootcfg` come from its row and column: with `COL2ROW` diodes the column
//! pin drives and the row pin senses, `ROW2COL` is the reverse.

use crate::constants::APP_NAME;
use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::firmware::python;
use crate::models::{BootConfig, DiodeOrientation, HardwareProfile};
use std::fmt::Write as _;

/// Renders `boot.py`, or `None` when boot configuration is disabled.
///
/// # Errors
///
/// Returns `KeyIndexOutOfRange` if the boot key lies outside the matrix.
pub fn generate_boot(boot: &BootConfig, profile: &HardwareProfile) -> Result<Option<String>> {
    if !boot.enabled {
        return Ok(None);
    }

    let mut args: Vec<String> = Vec::new();
    if let Some(position) = boot.boot_key {
        let (Some(row_pin), Some(col_pin)) = (
            profile.row_pins.get(position.row),
            profile.col_pins.get(position.col),
        ) else {
            return Err(ValidationError::new(
                ValidationErrorKind::KeyIndexOutOfRange,
                format!(
                    "Boot key ({}, {}) is outside the {}x{} matrix",
                    position.row, position.col, profile.rows, profile.cols
                ),
            )
            .into());
        };
        let (sense, source) = match profile.diode_orientation {
            DiodeOrientation::Col2Row => (row_pin, col_pin),
            DiodeOrientation::Row2Col => (col_pin, row_pin),
        };
        args.push(format!("sense={sense}"));
        args.push(format!("source={source}"));
    }
    args.push(format!("cdc_console={}", python::bool_literal(boot.cdc_console)));
    args.push(format!("midi={}", python::bool_literal(boot.midi)));
    args.push(format!("nkro={}", python::bool_literal(boot.nkro)));
    args.push(format!("storage={}", python::bool_literal(boot.storage)));
    if let Some(usb_id) = &boot.usb_id {
        args.push(format!(
            "usb_id=({}, {})",
            python::string_literal(&usb_id.manufacturer),
            python::string_literal(&usb_id.product)
        ));
    }

    let mut out = String::new();
    let _ = writeln!(out, "# Generated by {APP_NAME} for {}", profile.name);
    out.push_str("import board\n\n");
    out.push_str("from kmk.bootcfg import bootcfg\n\n");
    out.push_str("bootcfg(\n");
    for arg in args {
        let _ = writeln!(out, "    {arg},");
    }
    out.push_str(")\n");

    tracing::debug!("Generated boot.py for {}", profile.name);
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Position, UsbId};

    fn enabled() -> BootConfig {
        BootConfig {
            enabled: true,
            ..BootConfig::default()
        }
    }

    #[test]
    fn test_disabled_generates_nothing() {
        let out = generate_boot(&BootConfig::default(), &HardwareProfile::chronos_pad()).unwrap();
        assert!(out.is_none());
    }

    #[test]
    fn test_boot_key_pins_follow_diode_orientation() {
        let mut boot = enabled();
        boot.boot_key = Some(Position::new(0, 0));
        let mut profile = HardwareProfile::chronos_pad();
        let out = generate_boot(&boot, &profile).unwrap().unwrap();
        assert!(out.contains("    sense=board.GP8,\n    source=board.GP0,\n"));

        profile.diode_orientation = DiodeOrientation::Row2Col;
        let out = generate_boot(&boot, &profile).unwrap().unwrap();
        assert!(out.contains("    sense=board.GP0,\n    source=board.GP8,\n"));
    }

    #[test]
    fn test_flags_and_usb_id() {
        let mut boot = enabled();
        boot.storage = false;
        boot.usb_id = Some(UsbId::new("Chronos", "Pad \"v2\""));
        let out = generate_boot(&boot, &HardwareProfile::chronos_pad()).unwrap().unwrap();
        assert!(out.starts_with("# Generated by KmkPad for Chronos Pad\n"));
        assert!(out.contains("from kmk.bootcfg import bootcfg\n"));
        assert!(out.contains("    storage=False,\n"));
        assert!(out.contains("    usb_id=(\"Chronos\", \"Pad \\\"v2\\\"\"),\n"));
        assert!(!out.contains("sense="));
    }

    #[test]
    fn test_boot_key_outside_matrix() {
        let mut boot = enabled();
        boot.boot_key = Some(Position::new(5, 0));
        let err = generate_boot(&boot, &HardwareProfile::chronos_pad()).unwrap_err();
        assert_eq!(err.as_validation().unwrap().kind, ValidationErrorKind::KeyIndexOutOfRange);
    }
}
