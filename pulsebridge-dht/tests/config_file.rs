//! Loading sensor configuration from disk

use std::io::Write;

use pulsebridge_core::ConfigError;
use pulsebridge_dht::SensorConfig;
use tempfile::NamedTempFile;

#[test]
fn loads_partial_config_over_defaults() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{ "poll_attempts": 8, "timing": {{ "frame_start_gap_us": 12000 }}, "limits": {{ "max_humidity": 100.0 }} }}"#
    )
    .unwrap();

    let config = SensorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.poll_attempts, 8);
    assert_eq!(config.trigger_low_ms, 18);
    assert_eq!(config.timing.frame_start_gap_us, 12_000);
    assert_eq!(config.timing.preamble_edges, 2);
    assert!(!config.limits.accepts(100.1, 20.0));
    assert_eq!(config.poll_budget().to_millis(), 400);
}

#[test]
fn rejects_inconsistent_bands() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, r#"{{ "timing": {{ "zero_max_us": 160 }} }}"#).unwrap();
    assert!(matches!(SensorConfig::from_file(file.path()), Err(ConfigError::Invalid(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("dht.json");
    assert!(matches!(SensorConfig::from_file(missing), Err(ConfigError::Io(_))));
}
