//! Key assignments and their KMK token form.

use crate::error::{ValidationError, ValidationErrorKind};
use crate::keycode_db::KeycodeCatalog;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A standard modifier key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// Left control
    LeftCtrl,
    /// Left shift
    LeftShift,
    /// Left alt
    LeftAlt,
    /// Left GUI
    LeftGui,
    /// Right control
    RightCtrl,
    /// Right shift
    RightShift,
    /// Right alt
    RightAlt,
    /// Right GUI
    RightGui,
}

impl Modifier {
    /// All modifiers in catalog order.
    pub const ALL: [Self; 8] = [
        Self::LeftCtrl,
        Self::LeftShift,
        Self::LeftAlt,
        Self::LeftGui,
        Self::RightCtrl,
        Self::RightShift,
        Self::RightAlt,
        Self::RightGui,
    ];

    /// The KMK token for this modifier.
    #[must_use]
    pub const fn token(self) -> &'static str {
        match self {
            Self::LeftCtrl => "KC.LCTL",
            Self::LeftShift => "KC.LSFT",
            Self::LeftAlt => "KC.LALT",
            Self::LeftGui => "KC.LGUI",
            Self::RightCtrl => "KC.RCTL",
            Self::RightShift => "KC.RSFT",
            Self::RightAlt => "KC.RALT",
            Self::RightGui => "KC.RGUI",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.token() == token)
    }
}

/// How a layer-switch key activates its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerMode {
    /// Active while held (`KC.MO`)
    Momentary,
    /// Toggled on and off (`KC.TG`)
    Toggle,
    /// Active for the next key only (`KC.OS(KC.MO(n))`)
    OneShot,
    /// Becomes the only active layer (`KC.TO`)
    To,
    /// Sets the default layer (`KC.DF`)
    Default,
    /// Momentary on hold, toggle on tap (`KC.TT`)
    TapToggle,
}

impl LayerMode {
    /// True when the target layer is only active while the key is held,
    /// so the same position on the target layer is reached by the held key.
    #[must_use]
    pub const fn is_hold_like(self) -> bool {
        matches!(self, Self::Momentary | Self::TapToggle)
    }

    /// Human-readable name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Momentary => "Momentary (MO)",
            Self::Toggle => "Toggle (TG)",
            Self::OneShot => "One-Shot (OS)",
            Self::To => "Switch (TO)",
            Self::Default => "Default Set (DF)",
            Self::TapToggle => "Tap-Toggle (TT)",
        }
    }

    const fn function(self) -> &'static str {
        match self {
            Self::Momentary | Self::OneShot => "MO",
            Self::Toggle => "TG",
            Self::To => "TO",
            Self::Default => "DF",
            Self::TapToggle => "TT",
        }
    }
}

/// A layer-switch directive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LayerSwitch {
    /// Target layer index
    pub target: usize,
    /// Activation mode
    pub mode: LayerMode,
}

/// What a key does.
///
/// The string form is the KMK token (`KC.A`, `KC.MO(1)`, `MACRO(GREET)`),
/// which is also how assignments are stored in snapshots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum KeyAssignment {
    /// No action, LED off (`KC.NO`)
    #[default]
    NoOp,
    /// Defers to the next lower layer (`KC.TRNS`)
    Transparent,
    /// Letter key `KC.A`..`KC.Z`
    Letter(char),
    /// Number row key `KC.N0`..`KC.N9`
    Number(u8),
    /// Bare modifier key
    Modifier(Modifier),
    /// Any other catalog token, including modifier combos like `KC.LCTL(KC.C)`
    Key(String),
    /// Layer switching
    Layer(LayerSwitch),
    /// Reference to a named macro
    Macro(String),
}

impl KeyAssignment {
    /// Creates a macro reference.
    pub fn macro_ref(name: impl Into<String>) -> Self {
        Self::Macro(name.into())
    }

    /// Creates a layer switch.
    #[must_use]
    pub const fn layer(target: usize, mode: LayerMode) -> Self {
        Self::Layer(LayerSwitch { target, mode })
    }

    /// Parses a token and checks primitive keycodes against `catalog`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidKeycode` validation error if the token is
    /// structurally invalid or unknown to the catalog.
    pub fn parse(token: &str, catalog: &dyn KeycodeCatalog) -> Result<Self, ValidationError> {
        let assignment: Self = token.parse()?;
        if assignment.is_primitive() && !catalog.is_valid(token) {
            return Err(ValidationError::new(
                ValidationErrorKind::InvalidKeycode,
                format!("Unrecognized keycode '{token}'"),
            ));
        }
        Ok(assignment)
    }

    /// Checks that the token form of this assignment parses back to it.
    ///
    /// Snapshots store tokens, so an assignment failing this check could
    /// be saved but never loaded again.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeycode` for a malformed token or macro name.
    pub fn check_token(&self) -> Result<(), ValidationError> {
        let token = self.to_string();
        match token.parse::<Self>() {
            Ok(parsed) if parsed == *self => Ok(()),
            Ok(parsed) => Err(ValidationError::new(
                ValidationErrorKind::InvalidKeycode,
                format!("Keycode '{token}' would be stored as {parsed:?}"),
            )),
            Err(e) => Err(e),
        }
    }

    /// True for keycodes that live in the catalog (not macros or sentinels).
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        matches!(
            self,
            Self::Letter(_) | Self::Number(_) | Self::Modifier(_) | Self::Key(_)
        )
    }

    /// Checks if this key is transparent.
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        matches!(self, Self::Transparent)
    }

    /// Checks if this key is a no-op.
    #[must_use]
    pub const fn is_no_op(&self) -> bool {
        matches!(self, Self::NoOp)
    }

    /// Returns the referenced macro name, if any.
    #[must_use]
    pub fn macro_name(&self) -> Option<&str> {
        match self {
            Self::Macro(name) => Some(name),
            _ => None,
        }
    }

    /// Returns the layer switch, if any.
    #[must_use]
    pub const fn layer_switch(&self) -> Option<LayerSwitch> {
        match self {
            Self::Layer(switch) => Some(*switch),
            _ => None,
        }
    }
}

impl fmt::Display for KeyAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoOp => f.write_str("KC.NO"),
            Self::Transparent => f.write_str("KC.TRNS"),
            Self::Letter(c) => write!(f, "KC.{c}"),
            Self::Number(n) => write!(f, "KC.N{n}"),
            Self::Modifier(m) => f.write_str(m.token()),
            Self::Key(token) => f.write_str(token),
            Self::Layer(LayerSwitch { target, mode }) => match mode {
                LayerMode::OneShot => write!(f, "KC.OS(KC.MO({target}))"),
                _ => write!(f, "KC.{}({target})", mode.function()),
            },
            Self::Macro(name) => write!(f, "MACRO({name})"),
        }
    }
}

fn invalid(token: &str) -> ValidationError {
    ValidationError::new(
        ValidationErrorKind::InvalidKeycode,
        format!("Unrecognized keycode '{token}'"),
    )
    .with_suggestion("Keycodes look like KC.A, KC.MO(1) or MACRO(name)")
}

fn parse_layer(body: &str) -> Option<LayerSwitch> {
    if let Some(inner) = body
        .strip_prefix("OS(KC.MO(")
        .and_then(|rest| rest.strip_suffix("))"))
    {
        let target = inner.parse().ok()?;
        return Some(LayerSwitch {
            target,
            mode: LayerMode::OneShot,
        });
    }

    let (function, rest) = body.split_once('(')?;
    let target = rest.strip_suffix(')')?.parse().ok()?;
    let mode = match function {
        "MO" => LayerMode::Momentary,
        "TG" => LayerMode::Toggle,
        "TO" => LayerMode::To,
        "DF" => LayerMode::Default,
        "TT" => LayerMode::TapToggle,
        _ => return None,
    };
    Some(LayerSwitch { target, mode })
}

pub(crate) fn is_macro_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

impl FromStr for KeyAssignment {
    type Err = ValidationError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        let token = token.trim();

        if let Some(name) = token
            .strip_prefix("MACRO(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            if !is_macro_name(name) {
                return Err(invalid(token));
            }
            return Ok(Self::Macro(name.to_string()));
        }

        let Some(body) = token.strip_prefix("KC.") else {
            return Err(invalid(token));
        };
        if body.is_empty() {
            return Err(invalid(token));
        }

        match body {
            "NO" => return Ok(Self::NoOp),
            "TRNS" | "TRANSPARENT" => return Ok(Self::Transparent),
            _ => {}
        }

        let mut chars = body.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                return Ok(Self::Letter(c));
            }
        }

        if let Some(digit) = body.strip_prefix('N') {
            if digit.len() == 1 {
                if let Ok(n) = digit.parse::<u8>() {
                    return Ok(Self::Number(n));
                }
            }
        }

        if let Some(modifier) = Modifier::from_token(token) {
            return Ok(Self::Modifier(modifier));
        }

        if let Some(switch) = parse_layer(body) {
            return Ok(Self::Layer(switch));
        }

        let balanced = body.matches('(').count() == body.matches(')').count();
        if !balanced || body.chars().any(char::is_whitespace) {
            return Err(invalid(token));
        }

        Ok(Self::Key(token.to_string()))
    }
}

impl Serialize for KeyAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyAssignment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let token = String::deserialize(deserializer)?;
        token.parse().map_err(serde::de::Error::custom)
    }
}
