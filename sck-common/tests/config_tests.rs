//! Unit tests for configuration loading and graceful degradation
//!
//! Tests that manipulate SCK_* environment variables are marked #[serial]
//! so they never run in parallel with each other.

use sck_common::config::{
    load_toml_config, write_toml_config, ConfigResolver, TomlConfig, API_KEY_ENV_VAR,
    CATALOG_URL_ENV_VAR, CONFIG_ENV_VAR,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    env::remove_var(CONFIG_ENV_VAR);
    env::remove_var(CATALOG_URL_ENV_VAR);
    env::remove_var(API_KEY_ENV_VAR);
}

#[test]
fn test_defaults_when_sections_missing() {
    let config: TomlConfig = toml::from_str("").unwrap();

    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.library.catalog_prefix, "/data");
    assert!(config.library.data_root.is_none());
    assert_eq!(config.write_back.delay_ms, 200);
    assert!(config.organize.is_none());
}

#[test]
fn test_parse_full_config() {
    let content = r#"
        [catalog]
        url = "http://localhost:9999/graphql"
        api_key = "secret"

        [library]
        data_root = "/mnt/stash"

        [write_back]
        delay_ms = 50

        [organize]
        structure = "nested"
        template = "{studio} - {title}.{ext}"

        [logging]
        level = "debug"
    "#;
    let config: TomlConfig = toml::from_str(content).unwrap();

    assert_eq!(config.catalog.url, "http://localhost:9999/graphql");
    assert_eq!(config.library.data_root, Some(PathBuf::from("/mnt/stash")));
    assert_eq!(config.library.catalog_prefix, "/data");
    assert_eq!(config.write_back.delay_ms, 50);
    let organize = config.organize.unwrap();
    assert_eq!(organize.structure.as_deref(), Some("nested"));
    assert_eq!(config.logging.level, "debug");
}

#[test]
fn test_write_then_load_preserves_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = TomlConfig::default();
    config.catalog.url = "http://stash.local/graphql".to_string();
    config.catalog.api_key = "abc".to_string();

    write_toml_config(&config, &path).unwrap();
    assert!(path.exists());

    let loaded = load_toml_config(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_unparseable_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[catalog\nurl = ").unwrap();

    assert!(load_toml_config(&path).is_err());
}

#[test]
#[serial]
fn test_cli_path_takes_priority_over_env() {
    clear_env();
    env::set_var(CONFIG_ENV_VAR, "/tmp/from-env.toml");

    let resolver = ConfigResolver::new(Some(PathBuf::from("/tmp/from-cli.toml")));
    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/from-cli.toml")));

    let resolver = ConfigResolver::new(None);
    assert_eq!(resolver.resolve(), Some(PathBuf::from("/tmp/from-env.toml")));

    clear_env();
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let resolver = ConfigResolver::new(Some(dir.path().join("absent.toml")));

    let loaded = resolver.load().unwrap();
    assert_eq!(loaded.config, TomlConfig::default());
    assert_eq!(loaded.source, None);
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.warnings[0].contains("absent.toml"));
    assert!(loaded.warnings[0].contains("not found"));
}

#[test]
#[serial]
fn test_env_overrides_file_values() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "[catalog]\nurl = \"http://file/graphql\"\napi_key = \"file-key\"\n",
    )
    .unwrap();

    env::set_var(API_KEY_ENV_VAR, "env-key");
    let loaded = ConfigResolver::new(Some(path.clone())).load().unwrap();

    assert_eq!(loaded.config.catalog.url, "http://file/graphql");
    assert_eq!(loaded.config.catalog.api_key, "env-key");
    assert_eq!(loaded.source, Some(path));
    assert_eq!(loaded.warnings.len(), 1);
    assert!(loaded.warnings[0].contains(API_KEY_ENV_VAR));

    clear_env();
}

#[test]
fn test_require_catalog_reports_missing_url() {
    let config = TomlConfig::default();
    assert!(config.require_catalog().is_err());
    assert!(config.require_data_root().is_err());
}
