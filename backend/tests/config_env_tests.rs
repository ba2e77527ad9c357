//! Configuration loading and environment overrides.

mod support;

use std::fs;

use segment_insights::config::AppConfig;
use support::with_scoped_env;

#[test]
fn test_env_overrides_file_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("segment_insights.toml");
    fs::write(
        &path,
        r#"
[server]
host = "127.0.0.1"
port = 9000

[[datasets]]
name = "survey"
rows = "rows.json"
"#,
    )
    .unwrap();

    let config = with_scoped_env(&[("HOST", None), ("PORT", Some("9100"))], || {
        AppConfig::from_file(&path).unwrap().with_env_overrides()
    });
    assert_eq!(config.bind_address(), "127.0.0.1:9100");
    assert_eq!(config.datasets[0].name, "survey");
}

#[test]
fn test_invalid_port_override_is_ignored() {
    let config = with_scoped_env(&[("HOST", Some("10.0.0.1")), ("PORT", Some("99999"))], || {
        AppConfig::default().with_env_overrides()
    });
    assert_eq!(config.bind_address(), "10.0.0.1:8080");
}

#[test]
fn test_no_overrides_keeps_defaults() {
    let config = with_scoped_env(&[("HOST", None), ("PORT", None)], || {
        AppConfig::default().with_env_overrides()
    });
    assert_eq!(config, AppConfig::default());
}
