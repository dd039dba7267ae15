//! Serde helpers for maps keyed by a numeric index.
//!
//! Snapshots key colors by stringified index (`"3": "#FF0000"`). Structs that
//! also `#[serde(flatten)]` unknown fields are deserialized through a buffer
//! that no longer knows the key was a string, so integer map keys must be
//! parsed by hand.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// `BTreeMap<usize, V>` with string keys on the wire.
pub fn serialize<S, V>(map: &BTreeMap<usize, V>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    V: Serialize,
{
    serializer.collect_map(map.iter().map(|(k, v)| (k.to_string(), v)))
}

/// Parses string keys back into indices.
pub fn deserialize<'de, D, V>(deserializer: D) -> Result<BTreeMap<usize, V>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    let raw = BTreeMap::<String, V>::deserialize(deserializer)?;
    raw.into_iter()
        .map(|(key, value)| {
            key.trim()
                .parse::<usize>()
                .map(|index| (index, value))
                .map_err(|_| D::Error::custom(format!("expected a numeric index, found '{key}'")))
        })
        .collect()
}

/// Two-level variant: layer index → key index → value.
pub mod nested {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    /// Serializes both levels with string keys.
    pub fn serialize<S, V>(
        map: &BTreeMap<usize, BTreeMap<usize, V>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        V: Serialize,
    {
        let outer: BTreeMap<String, BTreeMap<String, &V>> = map
            .iter()
            .map(|(layer, keys)| {
                (
                    layer.to_string(),
                    keys.iter().map(|(k, v)| (k.to_string(), v)).collect(),
                )
            })
            .collect();
        outer.serialize(serializer)
    }

    /// Parses both levels of string keys.
    pub fn deserialize<'de, D, V>(
        deserializer: D,
    ) -> Result<BTreeMap<usize, BTreeMap<usize, V>>, D::Error>
    where
        D: Deserializer<'de>,
        V: Deserialize<'de>,
    {
        let raw = BTreeMap::<String, BTreeMap<String, V>>::deserialize(deserializer)?;
        let parse = |key: &str| {
            key.trim()
                .parse::<usize>()
                .map_err(|_| D::Error::custom(format!("expected a numeric index, found '{key}'")))
        };

        let mut out = BTreeMap::new();
        for (layer, keys) in raw {
            let mut inner = BTreeMap::new();
            for (key, value) in keys {
                inner.insert(parse(&key)?, value);
            }
            out.insert(parse(&layer)?, inner);
        }
        Ok(out)
    }
}
