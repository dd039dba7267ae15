//! Snapshot schema migrations.
//!
//! Migrations run on the raw JSON tree before it is deserialized, so they
//! can reshape fields the current model no longer accepts. Each step only
//! adds, renames or converts the fields it owns and leaves everything else
//! (including unknown fields) alone. A step fails rather than build an
//! unbounded value from legacy data.

use crate::constants::{CURRENT_SCHEMA_VERSION, MAX_UNDERGLOW_LEDS, OLDEST_SCHEMA_VERSION};
use crate::error::{CoreError, Result};
use serde_json::{json, Map, Value};

/// Fallback for underglow slots a legacy document never colored.
const LEGACY_UNDERGLOW_COLOR: &str = "#000000";

type Step = fn(&mut Map<String, Value>) -> Result<()>;

/// The chain, oldest first. Each entry upgrades `from` to `to`.
const MIGRATIONS: &[(&str, &str, Step)] = &[("1.0", "2.0", migrate_1_0_to_2_0)];

/// What loading a snapshot did to its schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Version found in the document
    pub from_version: String,
    /// Version after migration
    pub to_version: String,
    /// Applied steps, e.g. `1.0 -> 2.0`
    pub steps: Vec<String>,
}

impl MigrationReport {
    /// True when the document was already current.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Reads the schema version of a document.
///
/// An absent `version` means the oldest schema. `"1"` and `1` are read
/// as `"1.0"`.
///
/// # Errors
///
/// Returns `UnsupportedVersion` for versions outside the migration chain.
pub fn detect_version(doc: &Value) -> Result<String> {
    let raw = match doc.get("version") {
        None | Some(Value::Null) => return Ok(OLDEST_SCHEMA_VERSION.to_string()),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    };
    let normalized = if raw.contains('.') {
        raw
    } else {
        format!("{raw}.0")
    };

    let known = normalized == CURRENT_SCHEMA_VERSION
        || MIGRATIONS.iter().any(|(from, _, _)| *from == normalized);
    if known {
        Ok(normalized)
    } else {
        Err(CoreError::UnsupportedVersion {
            found: normalized,
            supported: CURRENT_SCHEMA_VERSION.to_string(),
        })
    }
}

/// Upgrades a document to the current schema in place.
///
/// Running it on a current document changes nothing, so migrating twice
/// equals migrating once.
///
/// # Errors
///
/// - `Parse` if the document is not a JSON object
/// - `UnsupportedVersion` for versions outside the chain
/// - `InvariantViolation` if a step meets data it cannot convert
pub fn migrate(doc: &mut Value) -> Result<MigrationReport> {
    let from_version = detect_version(doc)?;
    let root = doc.as_object_mut().ok_or_else(|| CoreError::Parse {
        message: "configuration must be a JSON object".to_string(),
        offset: None,
    })?;

    let mut version = from_version.clone();
    let mut steps = Vec::new();
    for &(from, to, step) in MIGRATIONS {
        if version == from {
            step(root)?;
            tracing::info!("Migrated configuration {from} -> {to}");
            steps.push(format!("{from} -> {to}"));
            to.clone_into(&mut version);
        }
    }
    root.insert("version".to_string(), Value::String(version.clone()));

    Ok(MigrationReport {
        from_version,
        to_version: version,
        steps,
    })
}

/// 1.0 → 2.0: layer-aware RGB overrides and boot configuration.
fn migrate_1_0_to_2_0(root: &mut Map<String, Value>) -> Result<()> {
    let rgb = root
        .entry("rgb_matrix_config")
        .or_insert_with(|| json!({}));
    if let Some(rgb) = rgb.as_object_mut() {
        rgb.entry("layer_key_colors").or_insert_with(|| json!({}));

        if let Some(limit) = rgb.remove("brightness_limit") {
            rgb.entry("brightness").or_insert(limit);
        }

        let count = rgb.remove("num_underglow").and_then(|n| legacy_count(&n));
        let fill = rgb
            .remove("default_underglow_color")
            .and_then(|c| c.as_str().map(str::to_string))
            .unwrap_or_else(|| LEGACY_UNDERGLOW_COLOR.to_string());
        let legacy = rgb.remove("underglow_colors");
        let underglow = match legacy {
            Some(Value::Array(colors)) => Value::Array(colors),
            Some(Value::Object(map)) => underglow_array(&map, count, &fill)?,
            _ => underglow_array(&Map::new(), count, &fill)?,
        };
        rgb.insert("underglow_colors".to_string(), underglow);
    }

    root.entry("boot_config")
        .or_insert_with(|| json!({ "enabled": false }));
    Ok(())
}

/// Whole, non-negative counts. Float counts saturate at `u64::MAX`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn legacy_count(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| *n >= 0.0 && n.fract() == 0.0)
            .map(|n| n as u64)
    })
}

fn too_many_underglow(what: &str) -> CoreError {
    CoreError::InvariantViolation(format!(
        "legacy underglow {what} exceeds the {MAX_UNDERGLOW_LEDS} LED limit"
    ))
}

/// Converts an index-keyed underglow map into an ordered list of `count`
/// colors (or up to the highest index present when `count` is unknown).
///
/// Slots are capped at [`MAX_UNDERGLOW_LEDS`].
fn underglow_array(map: &Map<String, Value>, count: Option<u64>, fill: &str) -> Result<Value> {
    let count = match count {
        Some(n) => usize::try_from(n)
            .ok()
            .filter(|&n| n <= MAX_UNDERGLOW_LEDS)
            .ok_or_else(|| too_many_underglow(&format!("count {n}")))?,
        None => match map.keys().filter_map(|k| k.parse::<u64>().ok()).max() {
            Some(max) => usize::try_from(max)
                .ok()
                .filter(|&max| max < MAX_UNDERGLOW_LEDS)
                .ok_or_else(|| too_many_underglow(&format!("index {max}")))?
                + 1,
            None => 0,
        },
    };

    let colors = (0..count)
        .map(|slot| {
            map.get(&slot.to_string())
                .cloned()
                .unwrap_or_else(|| Value::String(fill.to_string()))
        })
        .collect();
    Ok(Value::Array(colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn legacy() -> Value {
        json!({
            "keymap_data": [[["KC.A", "KC.B", "KC.C", "KC.D"]]],
            "rgb_matrix_config": {
                "pixel_pin": "board.GP9",
                "brightness_limit": 0.4,
                "num_underglow": 3,
                "default_underglow_color": "#0000FF",
                "underglow_colors": {"1": "#FF0000"},
                "key_colors": {"0": "#00FF00"},
                "vendor_hint": "keep me"
            },
            "theme": "dark"
        })
    }

    #[test]
    fn test_missing_version_is_oldest() {
        assert_eq!(detect_version(&json!({})).unwrap(), "1.0");
        assert_eq!(detect_version(&json!({"version": "1"})).unwrap(), "1.0");
        assert_eq!(detect_version(&json!({"version": 2})).unwrap(), "2.0");
    }

    #[test]
    fn test_newer_version_is_unsupported() {
        let err = detect_version(&json!({"version": "3.0"})).unwrap_err();
        match err {
            CoreError::UnsupportedVersion { found, supported } => {
                assert_eq!(found, "3.0");
                assert_eq!(supported, "2.0");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_migrate_1_0_document() {
        let mut doc = legacy();
        let report = migrate(&mut doc).unwrap();
        assert_eq!(report.from_version, "1.0");
        assert_eq!(report.to_version, "2.0");
        assert_eq!(report.steps, vec!["1.0 -> 2.0"]);

        let rgb = &doc["rgb_matrix_config"];
        assert_eq!(doc["version"], "2.0");
        assert_eq!(rgb["layer_key_colors"], json!({}));
        assert_eq!(rgb["brightness"], json!(0.4));
        assert!(rgb.get("brightness_limit").is_none());
        assert_eq!(rgb["underglow_colors"], json!(["#0000FF", "#FF0000", "#0000FF"]));
        assert!(rgb.get("num_underglow").is_none());
        assert_eq!(rgb["vendor_hint"], "keep me");
        assert_eq!(doc["boot_config"]["enabled"], false);
        assert_eq!(doc["theme"], "dark");
    }

    #[test]
    fn test_migration_is_idempotent() {
        let mut once = legacy();
        migrate(&mut once).unwrap();
        let mut twice = once.clone();
        let report = migrate(&mut twice).unwrap();
        assert!(report.is_noop());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_existing_brightness_wins() {
        let mut doc = json!({
            "rgb_matrix_config": {"brightness": 0.2, "brightness_limit": 0.9}
        });
        migrate(&mut doc).unwrap();
        assert_eq!(doc["rgb_matrix_config"]["brightness"], json!(0.2));
    }

    #[test]
    fn test_underglow_count_from_highest_index() {
        let mut doc = json!({
            "rgb_matrix_config": {"underglow_colors": {"2": "#111111"}}
        });
        migrate(&mut doc).unwrap();
        assert_eq!(
            doc["rgb_matrix_config"]["underglow_colors"],
            json!(["#000000", "#000000", "#111111"])
        );
    }

    #[test]
    fn test_huge_underglow_count_is_refused() {
        for count in [json!(u64::MAX), json!(1e12), json!(MAX_UNDERGLOW_LEDS + 1)] {
            let mut doc = json!({ "rgb_matrix_config": { "num_underglow": count } });
            assert!(
                matches!(migrate(&mut doc), Err(CoreError::InvariantViolation(_))),
                "{count}"
            );
        }
    }

    #[test]
    fn test_huge_underglow_index_is_refused() {
        let mut doc = json!({
            "rgb_matrix_config": { "underglow_colors": { "4000000000": "#FFFFFF" } }
        });
        assert!(matches!(
            migrate(&mut doc),
            Err(CoreError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_underglow_count_at_limit_is_accepted() {
        let mut doc = json!({ "rgb_matrix_config": { "num_underglow": MAX_UNDERGLOW_LEDS } });
        migrate(&mut doc).unwrap();
        assert_eq!(
            doc["rgb_matrix_config"]["underglow_colors"]
                .as_array()
                .map(Vec::len),
            Some(MAX_UNDERGLOW_LEDS)
        );
    }

    #[test]
    fn test_non_object_is_parse_error() {
        let mut doc = json!([1, 2, 3]);
        assert!(matches!(migrate(&mut doc), Err(CoreError::Parse { .. })));
    }
}
