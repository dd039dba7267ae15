//! Shared test fixtures for integration and CLI tests.
#![allow(dead_code)] // Each test binary uses a different subset

use kmkpad::keycode_db::KeycodeDb;
use kmkpad::models::{
    Configuration, HardwareProfile, KeyAssignment, LayerMode, MacroAction,
};
use kmkpad::store::ConfigStore;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// The 5×4 board every fixture targets.
pub fn chronos() -> HardwareProfile {
    HardwareProfile::chronos_pad()
}

/// The embedded keycode catalog.
pub fn catalog() -> KeycodeDb {
    KeycodeDb::load().expect("embedded keycode database should load")
}

/// Creates a configuration with letter keys on the base layer.
///
/// Layer 0 holds `KC.A`..`KC.T` row by row. Every further layer is all
/// transparent except key 0, which is a momentary switch back to layer 0.
pub fn test_config_basic(layers: usize) -> Configuration {
    let profile = chronos();
    let mut config = Configuration::new(&profile);

    for index in 0..profile.key_count() {
        let letter = char::from(b'A' + u8::try_from(index).unwrap());
        config
            .set_key_at_index(0, index, KeyAssignment::Letter(letter))
            .unwrap();
    }

    for _ in 1..layers {
        let layer = config.add_layer();
        for index in 0..profile.key_count() {
            config
                .set_key_at_index(layer, index, KeyAssignment::Transparent)
                .unwrap();
        }
        config
            .set_key_at_index(layer, 0, KeyAssignment::layer(0, LayerMode::Momentary))
            .unwrap();
    }

    config
}

/// A configuration using macros, colors, every extension and boot settings.
pub fn test_config_full() -> Configuration {
    let mut config = test_config_basic(2);

    config
        .add_macro(
            "GREET",
            vec![
                MacroAction::Tap("KC.A".to_string()),
                MacroAction::Delay(100),
                MacroAction::Text("hi".to_string()),
            ],
        )
        .unwrap();
    config
        .set_key_at_index(1, 19, KeyAssignment::macro_ref("GREET"))
        .unwrap();

    config.set_key_color(0, "#00FF00").unwrap();
    config.set_layer_key_color(1, 1, "#FF0000").unwrap();
    config.rgb.underglow_colors = vec!["#0000FF".to_string(); 2];

    config.extensions.encoder.enabled = true;
    config.extensions.analogin.enabled = true;
    config.extensions.display.enabled = true;
    config.extensions.rgb.enabled = true;
    config.boot.enabled = true;
    config.custom_code = "print('ready')\n".to_string();

    config
}

/// Writes a configuration snapshot into a fresh temp directory.
///
/// The `TempDir` must stay alive for as long as the path is used.
pub fn create_temp_config_file(config: &Configuration) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("pad.json");
    ConfigStore::new()
        .save(config, &path)
        .expect("Failed to save configuration");
    (path, temp_dir)
}

/// Writes raw JSON into a fresh temp directory.
pub fn create_temp_json_file(json: &str) -> (PathBuf, TempDir) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let path = temp_dir.path().join("pad.json");
    fs::write(&path, json).expect("Failed to write JSON");
    (path, temp_dir)
}

/// A 1.0 snapshot as older releases wrote it (no `version` field).
pub fn legacy_snapshot_json() -> String {
    let letters: Vec<String> = (b'A'..=b'T').map(|c| format!("\"KC.{}\"", char::from(c))).collect();
    let rows: Vec<String> = letters.chunks(4).map(|row| format!("[{}]", row.join(", "))).collect();

    format!(
        r##"{{
  "keymap_data": [[{rows}]],
  "macros": {{"GREET": [["tap", "KC.A"], ["delay", 100], ["text", "hi"]]}},
  "rgb_matrix_config": {{
    "pixel_pin": "board.GP9",
    "brightness_limit": 0.5,
    "rgb_order": "GRB",
    "disable_auto_write": true,
    "num_underglow": 2,
    "default_key_color": "#FFFFFF",
    "default_underglow_color": "#000000",
    "key_colors": {{"0": "#FF0000"}},
    "underglow_colors": {{"1": "#00FF00"}}
  }},
  "custom_code": "",
  "window_geometry": "800x600"
}}"##,
        rows = rows.join(", ")
    )
}

/// Settings path inside `dir` that does not exist, so defaults apply.
pub fn isolated_settings(dir: &TempDir) -> PathBuf {
    dir.path().join("settings.toml")
}
