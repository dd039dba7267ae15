//! Macro action sequences.

use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One step of a macro.
///
/// Serialized as a `[kind, value]` pair, e.g. `["tap", "KC.A"]` or
/// `["delay", 100]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MacroAction {
    /// Press and release a key
    Tap(String),
    /// Press and hold a key
    Press(String),
    /// Release a held key
    Release(String),
    /// Wait for the given number of milliseconds
    Delay(u64),
    /// Type a string
    Text(String),
}

impl MacroAction {
    /// The action kind as written in snapshots.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Tap(_) => "tap",
            Self::Press(_) => "press",
            Self::Release(_) => "release",
            Self::Delay(_) => "delay",
            Self::Text(_) => "text",
        }
    }

    /// The keycode token this action references, if it is a key action.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Tap(key) | Self::Press(key) | Self::Release(key) => Some(key),
            Self::Delay(_) | Self::Text(_) => None,
        }
    }
}

impl Serialize for MacroAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pair = serializer.serialize_tuple(2)?;
        pair.serialize_element(self.kind())?;
        match self {
            Self::Tap(value) | Self::Press(value) | Self::Release(value) | Self::Text(value) => {
                pair.serialize_element(value)?;
            }
            Self::Delay(ms) => pair.serialize_element(ms)?,
        }
        pair.end()
    }
}

/// Delay values written by older editors may be numeric strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawValue {
    Number(u64),
    Text(String),
}

struct ActionVisitor;

impl<'de> Visitor<'de> for ActionVisitor {
    type Value = MacroAction;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a [kind, value] pair")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<MacroAction, A::Error> {
        let kind: String = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let value: RawValue = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(3, &self));
        }

        let text = |value: RawValue| match value {
            RawValue::Text(s) => Ok(s),
            RawValue::Number(n) => Ok(n.to_string()),
        };

        match kind.as_str() {
            "tap" => Ok(MacroAction::Tap(text(value)?)),
            "press" => Ok(MacroAction::Press(text(value)?)),
            "release" => Ok(MacroAction::Release(text(value)?)),
            "text" => Ok(MacroAction::Text(text(value)?)),
            "delay" => match value {
                RawValue::Number(ms) => Ok(MacroAction::Delay(ms)),
                RawValue::Text(s) => s
                    .trim()
                    .parse()
                    .map(MacroAction::Delay)
                    .map_err(|_| de::Error::custom(format!("invalid delay '{s}'"))),
            },
            other => Err(de::Error::unknown_variant(
                other,
                &["tap", "press", "release", "delay", "text"],
            )),
        }
    }
}

impl<'de> Deserialize<'de> for MacroAction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(ActionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_pairs() {
        let actions = vec![
            MacroAction::Tap("KC.A".into()),
            MacroAction::Delay(100),
            MacroAction::Text("hi".into()),
        ];
        let json = serde_json::to_string(&actions).unwrap();
        assert_eq!(json, r#"[["tap","KC.A"],["delay",100],["text","hi"]]"#);
    }

    #[test]
    fn test_deserialize_string_delay() {
        let action: MacroAction = serde_json::from_str(r#"["delay", "250"]"#).unwrap();
        assert_eq!(action, MacroAction::Delay(250));
    }

    #[test]
    fn test_deserialize_rejects_unknown_kind() {
        assert!(serde_json::from_str::<MacroAction>(r#"["hold", "KC.A"]"#).is_err());
        assert!(serde_json::from_str::<MacroAction>(r#"["delay", "soon"]"#).is_err());
        assert!(serde_json::from_str::<MacroAction>(r#"["tap"]"#).is_err());
    }

    #[test]
    fn test_key_accessor() {
        assert_eq!(MacroAction::Press("KC.LSFT".into()).key(), Some("KC.LSFT"));
        assert_eq!(MacroAction::Delay(5).key(), None);
    }
}
