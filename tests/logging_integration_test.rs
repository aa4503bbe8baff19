//! Integration tests for logging functionality

use simplex::config::{parse_config, LoggingConfig};
use simplex::logging::{init_logging, parse_log_level};
use tempfile::TempDir;
use tracing::Level;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_log_levels() {
    assert_eq!(parse_log_level("WARN").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
    assert!(parse_log_level("verbose").is_err());
}

#[test]
fn test_invalid_rotation_is_rejected() {
    let err = parse_config(
        r#"
[terminology]
base_url = "http://localhost:8080/snowstorm/snomed-ct"

[logging]
local_rotation = "weekly"
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("local_rotation"));
}

#[test]
fn test_file_logging_creates_directory() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "hourly".to_string(),
    };
    assert!(!log_path.exists());

    // Only test in this binary that installs the global subscriber
    let guard = init_logging("info", &config).unwrap();
    tracing::info!("written to file");
    drop(guard);

    assert!(log_path.is_dir());
}
