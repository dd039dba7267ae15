//! Short key labels for the OLED keymap view.
//!
//! Labels are looked up in a fixed, ordered table: exact keycode names
//! first, then prefix rules ordered longest prefix first, and finally the
//! bare keycode name. Every label is cut to [`MAX_LABEL_WIDTH`] characters.

use crate::constants::MAX_LABEL_WIDTH;
use crate::models::KeyAssignment;

/// Label drawn for keys that do nothing on this layer.
pub const EMPTY_LABEL: &str = "---";

/// Exact keycode names (without `KC.`) and their labels.
const ABBREVIATIONS: &[(&str, &str)] = &[
    ("LCTL", "LCtl"),
    ("RCTL", "RCtl"),
    ("LSFT", "LSft"),
    ("RSFT", "RSft"),
    ("LALT", "LAlt"),
    ("RALT", "RAlt"),
    ("LGUI", "LGui"),
    ("RGUI", "RGui"),
    ("BSPC", "BkSp"),
    ("ENT", "Entr"),
    ("SPC", "Spce"),
    ("TAB", "Tab"),
    ("ESC", "Esc"),
    ("DEL", "Del"),
    ("PGUP", "PgUp"),
    ("PGDN", "PgDn"),
    ("HOME", "Home"),
    ("END", "End"),
    ("UP", "Up"),
    ("DOWN", "Down"),
    ("LEFT", "Left"),
    ("RGHT", "Rght"),
    ("VOLU", "Vol+"),
    ("VOLD", "Vol-"),
    ("MUTE", "Mute"),
    ("MPLY", "Play"),
    ("MNXT", "Next"),
    ("MPRV", "Prev"),
    ("MSTP", "Stop"),
    ("EJCT", "Ejct"),
    ("BRIU", "Bri+"),
    ("BRID", "Bri-"),
];

/// Prefix rewrites, checked after the exact table. Keep longer prefixes first.
const PREFIX_RULES: &[(&str, &str)] = &[
    ("MS_", "Ms"),
    ("MW_", "Wh"),
    ("MB_", "Btn"),
    ("KP_", "P"),
];

/// Label for a key assignment.
///
/// # Examples
///
/// ```
/// use kmkpad::keycode_db::display::key_label;
/// use kmkpad::models::KeyAssignment;
///
/// assert_eq!(key_label(&"KC.VOLU".parse::<KeyAssignment>().unwrap()), "Vol+");
/// assert_eq!(key_label(&"KC.LCTL(KC.C)".parse::<KeyAssignment>().unwrap()), "LCTL+C");
/// assert_eq!(key_label(&KeyAssignment::Transparent), "---");
/// ```
#[must_use]
pub fn key_label(key: &KeyAssignment) -> String {
    let label = match key {
        KeyAssignment::NoOp | KeyAssignment::Transparent => return EMPTY_LABEL.to_string(),
        KeyAssignment::Macro(name) => name.clone(),
        KeyAssignment::Layer(_) => key.to_string().replace("KC.", ""),
        other => {
            let token = other.to_string();
            let name = token.strip_prefix("KC.").unwrap_or(&token);
            if name.contains('(') {
                // KC.LCTL(KC.C) -> LCTL+C
                name.replace("KC.", "").replace('(', "+").replace(')', "")
            } else {
                abbreviate(name)
            }
        }
    };
    truncate(&label)
}

fn abbreviate(name: &str) -> String {
    if let Some((_, label)) = ABBREVIATIONS.iter().find(|(code, _)| *code == name) {
        return (*label).to_string();
    }
    for (prefix, replacement) in PREFIX_RULES {
        if let Some(rest) = name.strip_prefix(prefix) {
            return format!("{replacement}{}", title_case(rest));
        }
    }
    name.to_string()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
    })
}

fn truncate(label: &str) -> String {
    label.chars().take(MAX_LABEL_WIDTH).collect()
}
