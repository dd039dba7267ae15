//! Snapshot persistence and migration tests.

mod fixtures;

use fixtures::*;
use kmkpad::error::ValidationErrorKind;
use kmkpad::models::{Configuration, KeyAssignment, Layer, MacroAction, Position, RgbColor};
use kmkpad::store::ConfigStore;
use kmkpad::CoreError;
use serde_json::{json, Value};
use std::fs;

#[test]
fn test_full_configuration_round_trips() {
    let config = test_config_full();
    let (path, _temp) = create_temp_config_file(&config);

    let loaded = ConfigStore::load(&path).unwrap();
    assert!(loaded.migration.is_noop());
    assert_eq!(loaded.config, config);
}

#[test]
fn test_legacy_snapshot_loads_with_converted_fields() {
    let (path, _temp) = create_temp_json_file(&legacy_snapshot_json());
    let loaded = ConfigStore::load(&path).unwrap();
    let config = &loaded.config;

    assert_eq!(loaded.migration.steps, vec!["1.0 -> 2.0".to_string()]);
    assert_eq!(config.layers()[0].get(19), Some(&KeyAssignment::Letter('T')));
    assert_eq!(
        config.macros["GREET"],
        vec![
            MacroAction::Tap("KC.A".to_string()),
            MacroAction::Delay(100),
            MacroAction::Text("hi".to_string()),
        ]
    );
    assert!((config.rgb.brightness - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.rgb.underglow_colors, vec!["#000000", "#00FF00"]);
    assert_eq!(config.rgb.key_colors.get(&0).map(String::as_str), Some("#FF0000"));
    assert!(config.rgb.layer_key_colors.is_empty());
    assert!(!config.boot.enabled);
    assert_eq!(config.extra.get("window_geometry"), Some(&json!("800x600")));
}

#[test]
fn test_migrate_then_save_is_stable() {
    let once = ConfigStore::from_bytes(legacy_snapshot_json().as_bytes()).unwrap();
    let bytes = ConfigStore::to_bytes(&once.config).unwrap();

    let twice = ConfigStore::from_bytes(&bytes).unwrap();
    assert!(twice.migration.is_noop());
    assert_eq!(twice.config, once.config);
    assert_eq!(ConfigStore::to_bytes(&twice.config).unwrap(), bytes);
}

#[test]
fn test_unknown_fields_survive_save_and_load() {
    let mut doc: Value = serde_json::from_slice(&ConfigStore::to_bytes(&test_config_basic(1)).unwrap())
        .unwrap();
    doc["editor_theme"] = json!("solarized");
    doc["rgb_matrix_config"]["vendor_effect"] = json!({"speed": 3});
    doc["extensions"]["display"]["font"] = json!("terminalio");
    doc["boot_config"]["usb_power"] = json!(500);

    let (path, _temp) = create_temp_json_file(&doc.to_string());
    let loaded = ConfigStore::load(&path).unwrap();
    ConfigStore::new().save(&loaded.config, &path).unwrap();

    let saved: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
    assert_eq!(saved["editor_theme"], "solarized");
    assert_eq!(saved["rgb_matrix_config"]["vendor_effect"]["speed"], 3);
    assert_eq!(saved["extensions"]["display"]["font"], "terminalio");
    assert_eq!(saved["boot_config"]["usb_power"], 500);
}

#[test]
fn test_save_replaces_without_leftovers() {
    let (path, temp) = create_temp_config_file(&test_config_basic(1));
    let mut config = ConfigStore::load(&path).unwrap().config;
    config.set_key_color(3, "#ABCDEF").unwrap();
    ConfigStore::new().save(&config, &path).unwrap();

    let entries: Vec<String> = fs::read_dir(temp.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(entries, vec!["pad.json".to_string()]);

    let reloaded = ConfigStore::load(&path).unwrap().config;
    assert_eq!(
        reloaded.rgb.key_colors.get(&3).map(String::as_str),
        Some(RgbColor::new(0xAB, 0xCD, 0xEF).to_hex().as_str())
    );
}

#[test]
fn test_future_version_is_rejected() {
    let (path, _temp) = create_temp_json_file(r#"{"version": "3.0", "keymap_data": [[["KC.A"]]]}"#);
    match ConfigStore::load(&path) {
        Err(CoreError::UnsupportedVersion { found, .. }) => assert_eq!(found, "3.0"),
        other => panic!("expected unsupported version, got {other:?}"),
    }
}

#[test]
fn test_bad_token_is_a_parse_error() {
    let (path, _temp) =
        create_temp_json_file(r#"{"version": "2.0", "keymap_data": [[["KC.A", "A B"]]]}"#);
    assert!(matches!(
        ConfigStore::load(&path),
        Err(CoreError::Parse { .. })
    ));
}

#[test]
fn test_unloadable_assignments_are_refused_before_saving() {
    let (path, _temp) = create_temp_config_file(&test_config_basic(1));
    let before = fs::read(&path).unwrap();
    let mut config = ConfigStore::load(&path).unwrap().config;

    for bad in [
        KeyAssignment::macro_ref("two words"),
        KeyAssignment::Key("bogus".to_string()),
    ] {
        let err = config
            .set_key(0, Position::new(0, 0), bad.clone())
            .unwrap_err();
        assert_eq!(err.kind, ValidationErrorKind::InvalidKeycode, "{bad:?}");
    }
    assert_eq!(config.key_at_index(0, 0).unwrap(), &KeyAssignment::Letter('A'));

    ConfigStore::new().save(&config, &path).unwrap();
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_save_rejects_layers_built_with_bad_tokens() {
    let (path, _temp) = create_temp_config_file(&test_config_basic(1));
    let before = fs::read(&path).unwrap();
    let layer = Layer::from_rows(vec![vec![KeyAssignment::macro_ref("two words")]]);
    let config = Configuration::from_layers(vec![layer]).unwrap();

    match ConfigStore::new().save(&config, &path) {
        Err(CoreError::Validation(err)) => {
            assert_eq!(err.kind, ValidationErrorKind::InvalidKeycode);
            assert_eq!((err.layer, err.key), (Some(0), Some(0)));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }
    assert_eq!(fs::read(&path).unwrap(), before);
}
