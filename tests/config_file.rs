//! Loading and saving engine config files

use pretty_assertions::assert_eq;
use rage_tracker::{ClassificationPolicy, ConfigProfile, EngineConfig, TrackerError};
use std::fs;

#[test]
fn test_save_then_load_tuned_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");

    let mut config = EngineConfig::from_profile(ConfigProfile::Reactive);
    config.detection.increase_rage_sensitivity();
    config.extractor.decrease_happy_sensitivity();
    config.set_frames_between_counts(20).unwrap();
    config.save(&path).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.policy, ClassificationPolicy::Binary);
    assert_eq!(loaded.debounce.frames_between_counts, 20);
}

#[test]
fn test_load_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(&path, r#"{"debounce": {"emotion_confirmation_frames": 10}}"#).unwrap();

    let loaded = EngineConfig::load(&path).unwrap();
    assert_eq!(loaded.debounce.emotion_confirmation_frames, 10);
    assert_eq!(loaded.debounce.frames_between_counts, 15);
    assert_eq!(loaded.detection, EngineConfig::default().detection);
}

#[test]
fn test_load_rejects_invalid_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(
        &path,
        r#"{"detection": {"brow_angry_threshold": 60.0, "brow_very_angry_threshold": 70.0}}"#,
    )
    .unwrap();

    match EngineConfig::load(&path) {
        Err(TrackerError::InvalidConfig(msg)) => {
            assert!(msg.contains("brow_very_angry_threshold"), "{msg}")
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_load_rejects_malformed_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("engine.json");
    fs::write(&path, "{ policy: binary }").unwrap();

    assert!(matches!(
        EngineConfig::load(&path),
        Err(TrackerError::JsonError(_))
    ));
}

#[test]
fn test_load_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.json");

    assert!(matches!(EngineConfig::load(&path), Err(TrackerError::Io(_))));
}
