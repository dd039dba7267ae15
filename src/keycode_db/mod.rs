//! KMK keycode database and validation.
//!
//! This module provides access to the embedded keycode database, the
//! [`KeycodeCatalog`] validity check consumed by the model and the macro
//! encoder, and search for the `keycodes` command.

pub mod display;

use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Modifier tokens that may wrap another keycode, e.g. `KC.LCTL(KC.C)`.
const COMBO_MODIFIERS: &[&str] = &[
    "LCTL", "LSFT", "LALT", "LGUI", "RCTL", "RSFT", "RALT", "RGUI",
];

/// A source of truth for "is this string a recognized keycode token".
pub trait KeycodeCatalog {
    /// Returns true if `token` is a keycode the firmware understands.
    fn is_valid(&self, token: &str) -> bool;
}

/// Category of keycodes for organization in listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeycodeCategory {
    /// Category ID (e.g., "basic", "navigation")
    pub id: String,
    /// Display name (e.g., "Basic", "Navigation")
    pub name: String,
    /// Description of what keys are in this category
    pub description: String,
}

/// Individual keycode definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeycodeDefinition {
    /// KMK keycode (e.g., "KC.A", "KC.MO(1)")
    pub code: String,
    /// Display name (e.g., "A", "Momentary Layer")
    pub name: String,
    /// Category ID
    pub category: String,
    /// Optional description
    #[serde(default)]
    pub description: Option<String>,
    /// Optional regex pattern for parameterized codes
    #[serde(default)]
    pub pattern: Option<String>,
    /// Alternative keycode names
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Database schema from keycodes.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeycodeDatabase {
    version: String,
    categories: Vec<KeycodeCategory>,
    keycodes: Vec<KeycodeDefinition>,
}

/// KMK keycode database with fast lookup and search.
///
/// The database is embedded in the binary at compile time.
#[derive(Debug, Clone)]
pub struct KeycodeDb {
    keycodes: Vec<KeycodeDefinition>,
    categories: Vec<KeycodeCategory>,
    /// Fast lookup by keycode string (codes and aliases)
    lookup: HashMap<String, usize>,
    /// Compiled regex patterns for parameterized keycodes (KC.MO(n), KC.TG(n), ...)
    patterns: Vec<(String, Regex)>,
    combo: Regex,
}

impl KeycodeDb {
    /// Loads the keycode database from the embedded JSON file.
    pub fn load() -> Result<Self> {
        let json_data = include_str!("keycodes.json");
        let db: KeycodeDatabase =
            serde_json::from_str(json_data).context("Failed to parse embedded keycodes.json")?;

        let mut lookup = HashMap::new();
        let mut patterns = Vec::new();

        for (idx, keycode) in db.keycodes.iter().enumerate() {
            lookup.insert(keycode.code.clone(), idx);
            for alias in &keycode.aliases {
                lookup.insert(alias.clone(), idx);
            }

            if let Some(pattern) = &keycode.pattern {
                let regex = Regex::new(pattern)
                    .with_context(|| format!("Invalid pattern for {}: {pattern}", keycode.code))?;
                patterns.push((keycode.category.clone(), regex));
            }
        }

        let combo = Regex::new(&format!(
            r"^KC\.({})\((.+)\)$",
            COMBO_MODIFIERS.join("|")
        ))
        .context("Invalid modifier combo pattern")?;

        tracing::debug!(
            "Loaded keycode database v{} ({} keycodes)",
            db.version,
            db.keycodes.len()
        );

        Ok(Self {
            keycodes: db.keycodes,
            categories: db.categories,
            lookup,
            patterns,
            combo,
        })
    }

    /// Validates a keycode against the database.
    ///
    /// Accepts direct codes, aliases, parameterized layer codes (`KC.MO(5)`)
    /// and modifier combos wrapping a valid code (`KC.LCTL(KC.LSFT(KC.T))`).
    #[must_use]
    pub fn is_valid(&self, keycode: &str) -> bool {
        if self.lookup.contains_key(keycode) {
            return true;
        }

        if self.patterns.iter().any(|(_, regex)| regex.is_match(keycode)) {
            return true;
        }

        self.combo
            .captures(keycode)
            .and_then(|caps| caps.get(2))
            .is_some_and(|inner| self.is_valid(inner.as_str()))
    }

    /// Gets a keycode definition by code or alias.
    #[must_use]
    pub fn get(&self, keycode: &str) -> Option<&KeycodeDefinition> {
        let idx = self.lookup.get(keycode)?;
        self.keycodes.get(*idx)
    }

    /// Searches keycodes by code, name or description (case-insensitive).
    ///
    /// Results are sorted by relevance: exact match, prefix, substring, then
    /// description match. Ties keep database order.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&KeycodeDefinition> {
        if query.is_empty() {
            return self.keycodes.iter().collect();
        }

        let query_lower = query.to_lowercase();
        let mut results: Vec<(&KeycodeDefinition, i32)> = self
            .keycodes
            .iter()
            .filter_map(|keycode| {
                let code_lower = keycode.code.to_lowercase();
                let short_lower = code_lower.trim_start_matches("kc.").to_string();
                let name_lower = keycode.name.to_lowercase();
                let desc_lower = keycode
                    .description
                    .as_ref()
                    .map(|d| d.to_lowercase())
                    .unwrap_or_default();

                if code_lower == query_lower
                    || short_lower == query_lower
                    || name_lower == query_lower
                {
                    return Some((keycode, 100));
                }

                if short_lower.starts_with(&query_lower) || name_lower.starts_with(&query_lower) {
                    return Some((keycode, 50));
                }

                if code_lower.contains(&query_lower) || name_lower.contains(&query_lower) {
                    return Some((keycode, 10));
                }

                if desc_lower.contains(&query_lower) {
                    return Some((keycode, 5));
                }

                None
            })
            .collect();

        results.sort_by(|a, b| b.1.cmp(&a.1));
        results.into_iter().map(|(keycode, _)| keycode).collect()
    }

    /// Gets all keycodes in a category.
    #[must_use]
    pub fn get_category_keycodes(&self, category_id: &str) -> Vec<&KeycodeDefinition> {
        self.keycodes
            .iter()
            .filter(|k| k.category == category_id)
            .collect()
    }

    /// Gets all categories.
    #[must_use]
    pub fn categories(&self) -> &[KeycodeCategory] {
        &self.categories
    }

    /// Gets a category by ID.
    #[must_use]
    pub fn get_category(&self, id: &str) -> Option<&KeycodeCategory> {
        self.categories.iter().find(|c| c.id == id)
    }

    /// Gets the total number of keycodes.
    #[must_use]
    pub fn keycode_count(&self) -> usize {
        self.keycodes.len()
    }
}

impl KeycodeCatalog for KeycodeDb {
    fn is_valid(&self, token: &str) -> bool {
        Self::is_valid(self, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn get_test_db() -> KeycodeDb {
        KeycodeDb::load().expect("Failed to load keycode database")
    }

    #[test]
    fn test_load_database() {
        let db = get_test_db();
        assert!(db.keycode_count() > 100);
        assert_eq!(db.categories().len(), 9);
    }

    #[test]
    fn test_is_valid_basic_keys() {
        let db = get_test_db();
        assert!(db.is_valid("KC.A"));
        assert!(db.is_valid("KC.N1"));
        assert!(db.is_valid("KC.ENT"));
        assert!(db.is_valid("KC.ENTER")); // Alias
    }

    #[test]
    fn test_is_valid_sentinels() {
        let db = get_test_db();
        assert!(db.is_valid("KC.NO"));
        assert!(db.is_valid("KC.TRNS"));
        assert!(db.is_valid("KC.TRANSPARENT"));
    }

    #[test]
    fn test_is_valid_layer_switching() {
        let db = get_test_db();
        assert!(db.is_valid("KC.MO(0)"));
        assert!(db.is_valid("KC.MO(5)"));
        assert!(db.is_valid("KC.TG(2)"));
        assert!(db.is_valid("KC.TO(3)"));
        assert!(db.is_valid("KC.OS(KC.MO(4))"));
        assert!(!db.is_valid("KC.MO(x)"));
    }

    #[test]
    fn test_is_valid_modifier_combos() {
        let db = get_test_db();
        assert!(db.is_valid("KC.LCTL(KC.C)"));
        assert!(db.is_valid("KC.LCTL(KC.LSFT(KC.T))"));
        assert!(!db.is_valid("KC.LCTL(KC.FOO)"));
        assert!(!db.is_valid("KC.A(KC.B)"));
    }

    #[test]
    fn test_is_valid_invalid_keys() {
        let db = get_test_db();
        assert!(!db.is_valid("INVALID_KEY"));
        assert!(!db.is_valid("KC_A"));
        assert!(!db.is_valid("KC.FOO"));
        assert!(!db.is_valid(""));
    }

    #[test]
    fn test_get_keycode_by_alias() {
        let db = get_test_db();
        let keycode = db.get("KC.ENTER").unwrap();
        assert_eq!(keycode.code, "KC.ENT");
        assert_eq!(keycode.name, "Enter");
    }

    #[test]
    fn test_search_exact_match_first() {
        let db = get_test_db();
        let results = db.search("mute");
        assert_eq!(results[0].code, "KC.MUTE");
    }

    #[test]
    fn test_search_empty_query_returns_all() {
        let db = get_test_db();
        assert_eq!(db.search("").len(), db.keycode_count());
    }

    #[test]
    fn test_get_category_keycodes() {
        let db = get_test_db();
        let function = db.get_category_keycodes("function");
        assert_eq!(function.len(), 24);
        assert!(db.get_category("layers").is_some());
        assert!(db.get_category("nope").is_none());
    }
}
