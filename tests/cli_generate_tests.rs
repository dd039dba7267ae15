//! End-to-end tests for `kmkpad new` and `kmkpad generate`.

use std::fs;
use std::process::Command;
use tempfile::TempDir;

mod fixtures;

use fixtures::*;

/// Path to the kmkpad binary
fn kmkpad_bin() -> &'static str {
    env!("CARGO_BIN_EXE_kmkpad")
}

fn generate(config_path: &std::path::Path, out_dir: &std::path::Path, temp: &TempDir) -> std::process::Output {
    Command::new(kmkpad_bin())
        .args([
            "generate",
            "--config",
            config_path.to_str().unwrap(),
            "--out-dir",
            out_dir.to_str().unwrap(),
            "--settings",
            isolated_settings(temp).to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_generate_basic_succeeds() {
    let (config_path, temp) = create_temp_config_file(&test_config_basic(2));
    let out_dir = temp.path().join("output");

    let output = generate(&config_path, &out_dir, &temp);

    assert_eq!(
        output.status.code(),
        Some(0),
        "Generation should succeed. stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let code = fs::read_to_string(out_dir.join("code.py")).expect("code.py should be created");
    assert!(code.contains("keyboard.keymap = ["));
    assert!(code.contains("        KC.A, KC.B, KC.C, KC.D,\n"));
    assert!(
        !out_dir.join("boot.py").exists(),
        "boot.py is only written when boot configuration is enabled"
    );
}

#[test]
fn test_generate_writes_boot_py_when_enabled() {
    let (config_path, temp) = create_temp_config_file(&test_config_full());
    let out_dir = temp.path().join("output");

    let output = generate(&config_path, &out_dir, &temp);

    assert_eq!(output.status.code(), Some(0));
    let boot = fs::read_to_string(out_dir.join("boot.py")).expect("boot.py should be created");
    assert!(boot.contains("bootcfg("));
}

#[test]
fn test_generate_deterministic_output() {
    let (config_path, temp) = create_temp_config_file(&test_config_full());
    let first_dir = temp.path().join("first");
    let second_dir = temp.path().join("second");

    assert_eq!(generate(&config_path, &first_dir, &temp).status.code(), Some(0));
    assert_eq!(generate(&config_path, &second_dir, &temp).status.code(), Some(0));

    for file in ["code.py", "boot.py"] {
        let first = fs::read(first_dir.join(file)).unwrap();
        let second = fs::read(second_dir.join(file)).unwrap();
        assert_eq!(first, second, "{file} should be byte-identical across runs");
    }
}

#[test]
fn test_generate_invalid_keycode_exits_with_validation_code() {
    let mut config = test_config_basic(1);
    config
        .set_key_at_index(0, 0, kmkpad::models::KeyAssignment::Key("KC.NOT_A_KEY".to_string()))
        .unwrap();
    let (config_path, temp) = create_temp_config_file(&config);
    let out_dir = temp.path().join("output");

    let output = generate(&config_path, &out_dir, &temp);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("KC.NOT_A_KEY"), "stderr: {stderr}");
    assert!(!out_dir.join("code.py").exists());
}

#[test]
fn test_generate_missing_file_exits_with_io_code() {
    let temp = TempDir::new().unwrap();
    let missing = temp.path().join("absent.json");
    let out_dir = temp.path().join("output");

    let output = generate(&missing, &out_dir, &temp);

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_new_then_generate() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("fresh.json");

    let output = Command::new(kmkpad_bin())
        .args([
            "new",
            config_path.to_str().unwrap(),
            "--layers",
            "3",
            "--settings",
            isolated_settings(&temp).to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");
    assert_eq!(
        output.status.code(),
        Some(0),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let loaded = kmkpad::store::ConfigStore::load(&config_path).unwrap();
    assert_eq!(loaded.config.layer_count(), 3);

    let out_dir = temp.path().join("output");
    assert_eq!(generate(&config_path, &out_dir, &temp).status.code(), Some(0));
    let code = fs::read_to_string(out_dir.join("code.py")).unwrap();
    assert!(code.contains("    # Layer 2\n"));
}

#[test]
fn test_new_refuses_to_overwrite() {
    let (config_path, temp) = create_temp_config_file(&test_config_basic(1));
    let before = fs::read(&config_path).unwrap();

    let output = Command::new(kmkpad_bin())
        .args([
            "new",
            config_path.to_str().unwrap(),
            "--settings",
            isolated_settings(&temp).to_str().unwrap(),
        ])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(fs::read(&config_path).unwrap(), before);
}
