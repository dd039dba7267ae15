//! Analog slider fragment.
//!
//! The generated module polls the ADC every `poll_interval` seconds and
//! ignores any change of at most `threshold` raw units. What a larger change
//! does depends on the mode.

use super::{EmitContext, ExtensionEmitter, ExtensionKind, SourceFragment};
use crate::error::{Result, ValidationError, ValidationErrorKind};
use crate::firmware::python;
use crate::models::{AnalogMode, AnalogRange};
use std::fmt::Write as _;

/// Renders the `AnalogSlider` polling module.
pub struct AnalogEmitter;

impl ExtensionEmitter for AnalogEmitter {
    fn kind(&self) -> ExtensionKind {
        ExtensionKind::AnalogInput
    }

    fn emit(&self, ctx: &EmitContext<'_>) -> Result<Option<SourceFragment>> {
        let settings = &ctx.config.extensions.analogin;
        if !settings.enabled {
            return Ok(None);
        }
        if settings.poll_interval.is_nan() || settings.poll_interval <= 0.0 {
            return Err(out_of_range(format!(
                "Analog poll interval must be positive, got {}",
                settings.poll_interval
            )));
        }
        check_mode(ctx, &settings.mode)?;

        let mut code = String::new();
        if let AnalogMode::Ranges { ranges } = &settings.mode {
            code.push_str(&range_table(ranges));
            code.push('\n');
        }

        code.push_str("class AnalogSlider:\n");
        code.push_str("    def __init__(self, pin, threshold, poll_interval):\n");
        code.push_str("        self.analog = AnalogIn(pin)\n");
        code.push_str("        self.threshold = threshold\n");
        code.push_str("        self.poll_interval = poll_interval\n");
        code.push_str("        self.last_poll = 0\n");
        code.push_str("        self.last_value = self.analog.value\n");
        match &settings.mode {
            AnalogMode::Direction { .. } => {
                code.push_str("        self.last_movement = 0\n");
                code.push_str("        self.synced = False\n");
            }
            AnalogMode::Brightness { .. } => {}
            AnalogMode::Ranges { .. } => code.push_str("        self.active_range = None\n"),
        }
        code.push_str("\n    def during_bootup(self, keyboard):\n");
        code.push_str("        self.last_value = self.analog.value\n");
        code.push_str("\n    def before_matrix_scan(self, keyboard):\n");
        code.push_str("        return\n");
        code.push_str("\n    def after_matrix_scan(self, keyboard):\n");
        code.push_str("        now = time.monotonic()\n");
        code.push_str("        if now - self.last_poll < self.poll_interval:\n");
        code.push_str("            return\n");
        code.push_str("        self.last_poll = now\n");
        code.push_str("        value = self.analog.value\n");
        code.push_str("        delta = value - self.last_value\n");
        code.push_str("        if abs(delta) <= self.threshold:\n");
        code.push_str("            return\n");
        code.push_str("        self.last_value = value\n");
        code.push_str("        self.on_change(keyboard, value, delta, now)\n");
        for hook in [
            "before_hid_send",
            "after_hid_send",
            "on_powersave_enable",
            "on_powersave_disable",
        ] {
            let _ = writeln!(code, "\n    def {hook}(self, keyboard):\n        return");
        }
        code.push_str("\n    def on_change(self, keyboard, value, delta, now):\n");
        code.push_str(&on_change_body(&settings.mode));

        let _ = write!(
            code,
            "\n\nanalog_slider = AnalogSlider({}, threshold={}, poll_interval={})\n",
            ctx.profile.analog_pin,
            settings.threshold,
            python::float_literal(settings.poll_interval)
        );
        code.push_str("keyboard.modules.append(analog_slider)\n");

        Ok(Some(SourceFragment {
            kind: self.kind(),
            imports: vec![
                "import time".to_string(),
                "from analogio import AnalogIn".to_string(),
            ],
            code,
            sync_module: None,
        }))
    }
}

fn out_of_range(message: String) -> crate::error::CoreError {
    ValidationError::new(ValidationErrorKind::OutOfRangeSetting, message).into()
}

fn check_key(ctx: &EmitContext<'_>, token: &str) -> Result<()> {
    if ctx.catalog.is_valid(token) {
        Ok(())
    } else {
        Err(ValidationError::new(
            ValidationErrorKind::InvalidKeycode,
            format!("Analog action '{token}' is not a recognized keycode"),
        )
        .into())
    }
}

fn check_mode(ctx: &EmitContext<'_>, mode: &AnalogMode) -> Result<()> {
    match mode {
        AnalogMode::Direction {
            increase,
            decrease,
            step_size,
            idle_timeout,
        } => {
            check_key(ctx, increase)?;
            check_key(ctx, decrease)?;
            if *step_size == 0 {
                return Err(out_of_range("Analog step size must be at least 1".to_string()));
            }
            if idle_timeout.is_nan() || *idle_timeout < 0.0 {
                return Err(out_of_range(format!(
                    "Analog idle timeout must not be negative, got {idle_timeout}"
                )));
            }
        }
        AnalogMode::Brightness { max } => {
            if !(0.0..=1.0).contains(max) {
                return Err(out_of_range(format!(
                    "Analog brightness maximum must be within 0.0..=1.0, got {max}"
                )));
            }
        }
        AnalogMode::Ranges { ranges } => {
            if ranges.is_empty() {
                return Err(out_of_range("Analog range table is empty".to_string()));
            }
            for range in ranges {
                if range.min > range.max {
                    return Err(out_of_range(format!(
                        "Analog range {}..{} is inverted",
                        range.min, range.max
                    )));
                }
                check_key(ctx, &range.action)?;
            }
        }
    }
    Ok(())
}

fn range_table(ranges: &[AnalogRange]) -> String {
    let mut out = String::from("analog_ranges = [\n");
    for range in ranges {
        let _ = writeln!(out, "    ({}, {}, {}),", range.min, range.max, range.action);
    }
    out.push_str("]\n");
    out
}

fn on_change_body(mode: &AnalogMode) -> String {
    let mut out = String::new();
    match mode {
        AnalogMode::Direction {
            increase,
            decrease,
            step_size,
            idle_timeout,
        } => {
            let _ = writeln!(
                out,
                "        if now - self.last_movement > {}:",
                python::float_literal(*idle_timeout)
            );
            out.push_str("            self.synced = False\n");
            out.push_str("        self.last_movement = now\n");
            out.push_str("        if not self.synced:\n");
            out.push_str("            self.synced = True\n");
            out.push_str("            return\n");
            let _ = writeln!(out, "        key = {increase} if delta > 0 else {decrease}");
            let _ = writeln!(out, "        for _ in range({step_size}):");
            out.push_str("            keyboard.tap_key(key)\n");
        }
        AnalogMode::Brightness { max } => {
            let _ = writeln!(
                out,
                "        level = value / 65535 * {}",
                python::float_literal(*max)
            );
            out.push_str("        for extension in keyboard.extensions:\n");
            out.push_str("            pixels = getattr(extension, 'neopixel', None)\n");
            out.push_str("            if pixels is not None:\n");
            out.push_str("                pixels.brightness = level\n");
            out.push_str("                pixels.show()\n");
        }
        AnalogMode::Ranges { .. } => {
            out.push_str("        for index, (low, high, key) in enumerate(analog_ranges):\n");
            out.push_str("            if low <= value <= high:\n");
            out.push_str("                if index != self.active_range:\n");
            out.push_str("                    self.active_range = index\n");
            out.push_str("                    keyboard.tap_key(key)\n");
            out.push_str("                return\n");
            out.push_str("        self.active_range = None\n");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode_db::KeycodeDb;
    use crate::models::{Configuration, HardwareProfile};

    fn emit(config: &Configuration) -> Result<Option<SourceFragment>> {
        let profile = HardwareProfile::chronos_pad();
        let db = KeycodeDb::load().unwrap();
        AnalogEmitter.emit(&EmitContext {
            config,
            profile: &profile,
            catalog: &db,
        })
    }

    fn enabled(mode: AnalogMode) -> Configuration {
        let mut cfg = Configuration::new(&HardwareProfile::chronos_pad());
        cfg.extensions.analogin.enabled = true;
        cfg.extensions.analogin.mode = mode;
        cfg
    }

    #[test]
    fn test_disabled_emits_nothing() {
        let cfg = Configuration::new(&HardwareProfile::chronos_pad());
        assert!(emit(&cfg).unwrap().is_none());
    }

    #[test]
    fn test_direction_mode_taps_volume() {
        let cfg = enabled(AnalogMode::default());
        let fragment = emit(&cfg).unwrap().unwrap();
        assert!(fragment.code.contains("        if abs(delta) <= self.threshold:\n"));
        assert!(fragment.code.contains("key = KC.VOLU if delta > 0 else KC.VOLD"));
        assert!(fragment
            .code
            .contains("AnalogSlider(board.GP28, threshold=2000, poll_interval=0.05)"));
        assert_eq!(fragment.imports, vec!["import time", "from analogio import AnalogIn"]);
    }

    #[test]
    fn test_brightness_mode_scales_to_max() {
        let cfg = enabled(AnalogMode::Brightness { max: 0.3 });
        let fragment = emit(&cfg).unwrap().unwrap();
        assert!(fragment.code.contains("level = value / 65535 * 0.3"));
        assert!(!fragment.code.contains("tap_key"));
    }

    #[test]
    fn test_range_table_is_emitted_in_order() {
        let cfg = enabled(AnalogMode::Ranges {
            ranges: vec![
                AnalogRange { min: 0, max: 30000, action: "KC.A".into() },
                AnalogRange { min: 30001, max: 65535, action: "KC.B".into() },
            ],
        });
        let fragment = emit(&cfg).unwrap().unwrap();
        assert!(fragment
            .code
            .starts_with("analog_ranges = [\n    (0, 30000, KC.A),\n    (30001, 65535, KC.B),\n]\n"));
    }

    #[test]
    fn test_inverted_range_is_rejected() {
        let cfg = enabled(AnalogMode::Ranges {
            ranges: vec![AnalogRange { min: 10, max: 5, action: "KC.A".into() }],
        });
        let err = emit(&cfg).unwrap_err();
        assert_eq!(err.as_validation().unwrap().kind, ValidationErrorKind::OutOfRangeSetting);
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let cfg = enabled(AnalogMode::Direction {
            increase: "KC.LOUDER".into(),
            decrease: "KC.VOLD".into(),
            step_size: 1,
            idle_timeout: 2.0,
        });
        let err = emit(&cfg).unwrap_err();
        assert_eq!(err.as_validation().unwrap().kind, ValidationErrorKind::InvalidKeycode);
    }
}
