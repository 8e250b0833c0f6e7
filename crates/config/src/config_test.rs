//! Configuration parsing and validation tests

use std::str::FromStr;

use crate::{Config, ConfigError, LogFormat, LogLevel};

const MINIMAL: &str = r#"
[device]
interrupt_line = 10
path = "/tmp/drain.out"
"#;

#[test]
fn test_minimal_config_gets_defaults() {
    let config = Config::from_str(MINIMAL).unwrap();
    config.validate().unwrap();

    assert_eq!(config.device.interrupt_line, Some(10));
    assert_eq!(config.device.delay_ms, 0);
    assert_eq!(config.device.chunk_size, 4096);
    assert!(!config.device.keep_backlog);
    assert_eq!(config.device.buffer_capacity, 1 << 20);
    assert_eq!(config.log.level, LogLevel::Info);
    assert_eq!(config.log.format, LogFormat::Console);
}

#[test]
fn test_full_config_roundtrip() {
    let config = Config::from_str(
        r#"
[device]
interrupt_line = 12
delay_ms = 5
chunk_size = 64
path = "/tmp/out"
keep_backlog = true
buffer_capacity = 4096
log_dump_dir = "/tmp/gih-logs"

[log]
level = "debug"
format = "json"
"#,
    )
    .unwrap();
    config.validate().unwrap();

    let device = config.device.to_device_config();
    assert_eq!(device.interrupt_line, Some(12));
    assert_eq!(device.delay.as_millis(), 5);
    assert_eq!(device.chunk_size, 64);
    assert_eq!(device.destination_path.as_deref(), Some("/tmp/out"));
    assert!(device.keep_backlog);
    assert_eq!(config.log.level, LogLevel::Debug);
    assert_eq!(config.log.format, LogFormat::Json);
}

#[test]
fn test_missing_interrupt_line_rejected() {
    let config = Config::from_str("[device]\npath = \"/tmp/out\"\n").unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingField {
            field: "device.interrupt_line"
        })
    ));
}

#[test]
fn test_missing_path_rejected() {
    let config = Config::from_str("[device]\ninterrupt_line = 10\n").unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::MissingField {
            field: "device.path"
        })
    ));
}

#[test]
fn test_zero_chunk_size_rejected() {
    let config = Config::from_str(
        "[device]\ninterrupt_line = 10\npath = \"/tmp/out\"\nchunk_size = 0\n",
    )
    .unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "device.chunk_size",
            ..
        })
    ));
}

#[test]
fn test_over_long_path_rejected() {
    let path = "x".repeat(gih_core::MAX_PATH_LEN + 1);
    let config =
        Config::from_str(&format!("[device]\ninterrupt_line = 10\npath = \"{path}\"\n")).unwrap();
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidValue {
            field: "device.path",
            ..
        })
    ));
}

#[test]
fn test_unknown_field_is_a_parse_error() {
    assert!(Config::from_str("[device]\nnot_a_field = 1\n").is_err());
}

#[test]
fn test_load_missing_file_is_io_error() {
    let err = Config::load("/no/such/gihd.toml").unwrap_err();
    assert!(matches!(err, ConfigError::IoError { .. }));
}
