//! Configuration loading from disk

#![cfg(test)]

use std::io::Write;

use pulsebridge_core::{Bridge, BridgeConfig, ConfigError};
use tempfile::NamedTempFile;

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file
}

#[test]
fn loads_bridge_config_from_file() {
    let file = write_config(r#"{ "max_line": 53 }"#);
    let config = BridgeConfig::from_file(file.path()).unwrap();
    assert_eq!(config.max_line, 53);

    let bridge = Bridge::new(config).unwrap();
    let mut event_loop = bridge.event_loop().unwrap();
    assert!(event_loop.register_isr(53, None).unwrap().is_none());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = BridgeConfig::from_file(dir.path().join("absent.json"));
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn malformed_file_is_parse_error() {
    let file = write_config("{ max_line: ");
    assert!(matches!(
        BridgeConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}
