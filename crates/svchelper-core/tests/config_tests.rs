//! Integration tests for configuration module

use svchelper_core::config::{EventType, ServiceConfig, StartType};
use svchelper_core::Error;

#[test]
fn test_partial_toml_uses_defaults() {
    let config = ServiceConfig::from_toml(
        r#"
        name = "heartbeat"
        display_name = "Heartbeat"
        start_type = "manual"
        accept_pause_continue = true
        event_types = ["error", "info"]
        "#,
    )
    .expect("Failed to parse");

    assert_eq!(config.name, "heartbeat");
    assert_eq!(config.start_type, StartType::Manual);
    assert!(config.accept_pause_continue);
    assert_eq!(config.event_types, vec![EventType::Error, EventType::Info]);
    assert_eq!(config.control_timeout_secs, 10);
    assert_eq!(config.poll_interval_ms, 300);
    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_start_type() {
    let result = ServiceConfig::from_toml(r#"start_type = "sometimes""#);
    assert!(matches!(result, Err(Error::TomlParse(_))));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = ServiceConfig::load(dir.path().join("missing.toml"));
    assert!(matches!(result, Err(Error::ConfigNotFound { .. })));
}

#[test]
fn test_load_unreadable_path_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ServiceConfig::load(dir.path());
    assert!(matches!(result, Err(Error::Io(_))));
}

#[test]
fn test_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("service.toml");
    std::fs::write(&path, "name = \"from-file\"\nuse_exe_dir_as_working_dir = true\n").unwrap();

    let config = ServiceConfig::load(&path).unwrap();
    assert_eq!(config.name, "from-file");
    assert!(config.use_exe_dir_as_working_dir);
}

#[test]
fn test_toml_serialization_roundtrip() {
    let mut original = ServiceConfig::new("svc", "Service", "Does things", true);
    original.start_type = StartType::Disabled;
    original.launch_arguments = vec!["--log-file".into(), "C:\\svc.log".into()];

    let toml_str = original.to_toml().expect("Failed to serialize");
    let parsed = ServiceConfig::from_toml(&toml_str).expect("Failed to parse");

    assert_eq!(original, parsed);
}
