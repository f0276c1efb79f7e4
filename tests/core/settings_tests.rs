//! Tests for user settings persistence
//!
//! Tests cover:
//! - Default settings values
//! - Serialization/deserialization
//! - Load/save round trips and fallbacks

use barfilter::settings::Settings;
use barfilter::state::{Emphasis, DATATILE_ACTIVE_COLOR, PERFORMANCE_ADVISORY_THRESHOLD};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir()
        .join(format!("barfilter-test-{}", uuid::Uuid::new_v4().simple()))
        .join(name)
}

// ============================================
// Default Settings Tests
// ============================================

#[test]
fn test_settings_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.version, 1);
    assert_eq!(
        settings.performance_advisory_threshold,
        PERFORMANCE_ADVISORY_THRESHOLD
    );
    assert_eq!(settings.color(Emphasis::Active), DATATILE_ACTIVE_COLOR);
}

// ============================================
// Serialization Tests
// ============================================

#[test]
fn test_settings_deserialize_empty_object() {
    let settings: Settings = serde_json::from_str("{}").unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn test_settings_deserialize_partial() {
    let settings: Settings =
        serde_json::from_str(r##"{"inactive_color":"#000000","performance_advisory_threshold":10}"##)
            .unwrap();
    assert_eq!(settings.inactive_color, "#000000");
    assert_eq!(settings.performance_advisory_threshold, 10);
    assert_eq!(settings.active_color, DATATILE_ACTIVE_COLOR);
}

// ============================================
// Persistence Tests
// ============================================

#[test]
fn test_settings_save_and_load() {
    let path = temp_path("settings.json");
    let settings = Settings {
        performance_advisory_threshold: 123,
        ..Default::default()
    };
    settings.save_to(&path).unwrap();
    assert_eq!(Settings::load_from(&path), settings);
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}

#[test]
fn test_settings_missing_file_uses_defaults() {
    let path = temp_path("missing.json");
    assert_eq!(Settings::load_from(&path), Settings::default());
}

#[test]
fn test_settings_invalid_file_uses_defaults() {
    let path = temp_path("broken.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, "not json").unwrap();
    assert_eq!(Settings::load_from(&path), Settings::default());
    let _ = std::fs::remove_dir_all(path.parent().unwrap());
}
