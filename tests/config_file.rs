//! Integration tests for loading configuration files
//!
//! Covers the full path file → parse → validate, including failures that must
//! stop the process at startup.

use gps_proxy::config::{Config, CredentialStrategy};
use gps_proxy::error::AppError;
use std::io::Write;
use tempfile::NamedTempFile;

fn create_temp_config(toml_content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(toml_content.as_bytes())
        .expect("Failed to write temp file");
    temp_file.flush().expect("Failed to flush temp file");
    temp_file
}

#[test]
fn test_from_file_loads_login_deployment() {
    let file = create_temp_config(
        r#"
[server]
port = 8088

[upstream]
base_url = "https://gps51.com/webapi"
login_path = "/StandardApiAction_login.action"

[credentials]
strategy = "login"
username = "fleet"
password = "hunter2"
"#,
    );

    let config = Config::from_file(file.path()).expect("should load config");
    assert_eq!(config.server.port, 8088);
    assert_eq!(config.credentials.strategy(), CredentialStrategy::Login);
    assert!(config.credentials.is_complete());
}

#[test]
fn test_from_file_missing_file_is_read_error() {
    let result = Config::from_file("/nonexistent/gps-proxy.toml");
    assert!(matches!(result, Err(AppError::ConfigFileRead { .. })));
}

#[test]
fn test_from_file_invalid_toml_is_parse_error() {
    let file = create_temp_config("[server\nport = 1");
    let result = Config::from_file(file.path());
    assert!(matches!(result, Err(AppError::ConfigParseFailed { .. })));
}

#[test]
fn test_from_file_validation_error_names_file() {
    let file = create_temp_config("[upstream]\npreview_chars = 0\n");
    let err = Config::from_file(file.path()).expect_err("should reject preview_chars = 0");
    let message = err.to_string();
    assert!(message.contains("preview_chars"), "got: {}", message);
    assert!(
        message.contains(&file.path().display().to_string()),
        "got: {}",
        message
    );
}

#[test]
fn test_from_file_rejects_unknown_strategy() {
    let file = create_temp_config("[credentials]\nstrategy = \"apikey\"\n");
    assert!(Config::from_file(file.path()).is_err());
}
