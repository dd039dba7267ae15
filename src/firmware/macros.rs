//! Macro encoding: typed actions to KMK `KC.MACRO(...)` expressions.

use crate::error::{CoreError, Result, ValidationError, ValidationErrorKind};
use crate::firmware::python;
use crate::keycode_db::KeycodeCatalog;
use crate::models::MacroAction;
use std::fmt;

/// Kind of an encoded macro step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    /// Press and release
    Tap,
    /// Press and hold
    Press,
    /// Release
    Release,
    /// Wait
    Delay,
    /// Type a string
    Text,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tap => "tap",
            Self::Press => "press",
            Self::Release => "release",
            Self::Delay => "delay",
            Self::Text => "text",
        })
    }
}

/// One validated macro step, ready to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedAction {
    /// Step kind
    pub kind: ActionKind,
    /// Keycode token, delay in milliseconds, or the raw text
    pub value: String,
}

impl EncodedAction {
    /// KMK argument form of this step.
    #[must_use]
    pub fn to_python(&self) -> String {
        match self.kind {
            ActionKind::Tap => format!("Tap({})", self.value),
            ActionKind::Press => format!("Press({})", self.value),
            ActionKind::Release => format!("Release({})", self.value),
            ActionKind::Delay => format!("Delay({})", self.value),
            ActionKind::Text => python::string_literal(&self.value),
        }
    }
}

/// Validates and encodes macro action sequences.
pub struct MacroEncoder<'a> {
    catalog: &'a dyn KeycodeCatalog,
}

impl<'a> MacroEncoder<'a> {
    /// Creates an encoder that checks key actions against `catalog`.
    #[must_use]
    pub fn new(catalog: &'a dyn KeycodeCatalog) -> Self {
        Self { catalog }
    }

    /// Encodes one macro, preserving action order exactly.
    ///
    /// # Errors
    ///
    /// - `InvalidDelay` validation error for a zero delay
    /// - `InvalidAction` for a key the catalog does not recognize
    pub fn encode(&self, name: &str, actions: &[MacroAction]) -> Result<Vec<EncodedAction>> {
        actions
            .iter()
            .enumerate()
            .map(|(step, action)| self.encode_action(name, step, action))
            .collect()
    }

    fn encode_action(&self, name: &str, step: usize, action: &MacroAction) -> Result<EncodedAction> {
        let key = |kind: ActionKind, key: &str| {
            if self.catalog.is_valid(key) {
                Ok(EncodedAction {
                    kind,
                    value: key.to_string(),
                })
            } else {
                Err(CoreError::InvalidAction {
                    macro_name: name.to_string(),
                    step,
                    keycode: key.to_string(),
                })
            }
        };

        match action {
            MacroAction::Tap(k) => key(ActionKind::Tap, k),
            MacroAction::Press(k) => key(ActionKind::Press, k),
            MacroAction::Release(k) => key(ActionKind::Release, k),
            MacroAction::Delay(0) => Err(ValidationError::new(
                ValidationErrorKind::InvalidDelay,
                format!("Macro '{name}' step {step}: delay must be a positive number of milliseconds"),
            )
            .with_suggestion("Use a delay of at least 1 ms or remove the step")
            .into()),
            MacroAction::Delay(ms) => Ok(EncodedAction {
                kind: ActionKind::Delay,
                value: ms.to_string(),
            }),
            MacroAction::Text(text) => Ok(EncodedAction {
                kind: ActionKind::Text,
                value: text.clone(),
            }),
        }
    }

    /// Encodes a macro and renders it as `KC.MACRO(...)`.
    ///
    /// # Errors
    ///
    /// Same as [`MacroEncoder::encode`].
    pub fn render(&self, name: &str, actions: &[MacroAction]) -> Result<String> {
        let encoded = self.encode(name, actions)?;
        Ok(render_expression(&encoded))
    }
}

/// Renders encoded steps as a KMK macro expression.
#[must_use]
pub fn render_expression(actions: &[EncodedAction]) -> String {
    let args: Vec<String> = actions.iter().map(EncodedAction::to_python).collect();
    format!("KC.MACRO({})", args.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode_db::KeycodeDb;

    #[test]
    fn test_greet_macro_keeps_order() {
        let db = KeycodeDb::load().unwrap();
        let encoder = MacroEncoder::new(&db);
        let actions = vec![
            MacroAction::Tap("KC.A".into()),
            MacroAction::Delay(100),
            MacroAction::Text("hi".into()),
        ];
        let encoded = encoder.encode("GREET", &actions).unwrap();
        assert_eq!(
            encoded,
            vec![
                EncodedAction { kind: ActionKind::Tap, value: "KC.A".into() },
                EncodedAction { kind: ActionKind::Delay, value: "100".into() },
                EncodedAction { kind: ActionKind::Text, value: "hi".into() },
            ]
        );
        assert_eq!(
            render_expression(&encoded),
            "KC.MACRO(Tap(KC.A), Delay(100), \"hi\")"
        );
    }

    #[test]
    fn test_no_dedup_or_reorder() {
        let db = KeycodeDb::load().unwrap();
        let encoder = MacroEncoder::new(&db);
        let actions = vec![
            MacroAction::Press("KC.LSFT".into()),
            MacroAction::Tap("KC.A".into()),
            MacroAction::Tap("KC.A".into()),
            MacroAction::Release("KC.LSFT".into()),
        ];
        let rendered = encoder.render("SHOUT", &actions).unwrap();
        assert_eq!(
            rendered,
            "KC.MACRO(Press(KC.LSFT), Tap(KC.A), Tap(KC.A), Release(KC.LSFT))"
        );
    }

    #[test]
    fn test_zero_delay_is_rejected() {
        let db = KeycodeDb::load().unwrap();
        let err = MacroEncoder::new(&db)
            .encode("WAIT", &[MacroAction::Delay(0)])
            .unwrap_err();
        let validation = err.as_validation().unwrap();
        assert_eq!(validation.kind, ValidationErrorKind::InvalidDelay);
    }

    #[test]
    fn test_unknown_key_is_invalid_action() {
        let db = KeycodeDb::load().unwrap();
        let err = MacroEncoder::new(&db)
            .encode("BAD", &[MacroAction::Text("ok".into()), MacroAction::Tap("KC.NOPE".into())])
            .unwrap_err();
        match err {
            CoreError::InvalidAction { macro_name, step, keycode } => {
                assert_eq!(macro_name, "BAD");
                assert_eq!(step, 1);
                assert_eq!(keycode, "KC.NOPE");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_text_is_escaped() {
        let db = KeycodeDb::load().unwrap();
        let rendered = MacroEncoder::new(&db)
            .render("Q", &[MacroAction::Text("a \"b\"\n".into())])
            .unwrap();
        assert_eq!(rendered, r#"KC.MACRO("a \"b\"\n")"#);
    }
}
