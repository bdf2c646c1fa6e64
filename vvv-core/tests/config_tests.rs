//! Configuration loading and data folder resolution
//!
//! Uses serial_test: tests touching VVV_DATA_DIR are marked #[serial] so they
//! never run concurrently.

use serial_test::serial;
use std::env;
use std::path::PathBuf;
use vvv_core::config::{CompiledDefaults, DataDir, DataDirResolver, TomlConfig, DATA_DIR_ENV};

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();
    assert!(!defaults.data_dir.as_os_str().is_empty());
    assert!(defaults.config_file.ends_with("vvv.toml"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(DATA_DIR_ENV);
    let resolved = DataDirResolver::new().resolve();
    assert_eq!(resolved, CompiledDefaults::for_current_platform().data_dir);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    let toml = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/vvv-from-toml")),
        ..TomlConfig::default()
    };

    env::remove_var(DATA_DIR_ENV);
    assert_eq!(
        DataDirResolver::new().with_toml(&toml).resolve(),
        PathBuf::from("/tmp/vvv-from-toml")
    );

    env::set_var(DATA_DIR_ENV, "/tmp/vvv-from-env");
    assert_eq!(
        DataDirResolver::new().with_toml(&toml).resolve(),
        PathBuf::from("/tmp/vvv-from-env")
    );

    let cli = DataDirResolver::new()
        .with_cli_arg(Some(PathBuf::from("/tmp/vvv-from-cli")))
        .with_toml(&toml)
        .resolve();
    assert_eq!(cli, PathBuf::from("/tmp/vvv-from-cli"));

    env::remove_var(DATA_DIR_ENV);
}

#[test]
#[serial]
fn test_blank_env_var_is_ignored() {
    env::set_var(DATA_DIR_ENV, "   ");
    let toml = TomlConfig {
        data_dir: Some(PathBuf::from("/tmp/vvv-toml")),
        ..TomlConfig::default()
    };
    assert_eq!(DataDirResolver::new().with_toml(&toml).resolve(), PathBuf::from("/tmp/vvv-toml"));
    env::remove_var(DATA_DIR_ENV);
}

#[test]
fn test_missing_toml_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = TomlConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.port, 3000);
    assert_eq!(config.backup_retention_hours, 24);
    assert_eq!(config.session_sweep_interval_secs, 60);
    assert_eq!(config.logging.level, "info");
    assert!(config.data_dir.is_none());
}

#[test]
fn test_partial_toml_keeps_defaults_for_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vvv.toml");
    std::fs::write(
        &path,
        "port = 8080\nsuper_admin_id = \"777\"\n\n[logging]\nlevel = \"debug\"\n",
    )
    .unwrap();

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.super_admin_id, "777");
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.backup_retention_hours, 24);
}

#[test]
fn test_malformed_toml_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("vvv.toml");
    std::fs::write(&path, "port = \"not a number\"").unwrap();
    assert!(matches!(TomlConfig::load(&path), Err(vvv_core::Error::Config(_))));
}

#[test]
fn test_data_dir_layout() {
    let dir = tempfile::tempdir().unwrap();
    let data_dir = DataDir::new(dir.path().join("data"));
    data_dir.ensure_exists().unwrap();
    data_dir.ensure_exists().unwrap();

    assert!(data_dir.backup_dir().is_dir());
    assert!(data_dir.leaderboard_path().ends_with("leaderboard.json"));
    assert!(data_dir.history_path().ends_with("history.json"));
    assert!(data_dir.merge_memory_path().ends_with("merge_memory.json"));
    assert!(data_dir.config_path().ends_with("bot_config.json"));
}
