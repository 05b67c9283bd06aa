//! Integration tests for configuration and graceful degradation
//!
//! Tests that manipulate LIFELIST_ROOT_FOLDER or LIFELIST_CONFIG are marked
//! with #[serial] so they never run in parallel.

use lifelist_common::config::{
    CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig, CONFIG_FILE_ENV,
    ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::PathBuf;

#[test]
fn test_compiled_defaults_for_current_platform() {
    let defaults = CompiledDefaults::for_current_platform();

    assert!(!defaults.root_folder.as_os_str().is_empty());
    assert!(defaults.root_folder.ends_with("lifelist") || defaults.root_folder.ends_with("lifelist_data"));
    assert_eq!(defaults.log_level, "info");
}

#[test]
#[serial]
fn test_resolver_with_no_overrides_uses_default() {
    env::remove_var(ROOT_FOLDER_ENV);

    let resolver = RootFolderResolver::new(None, TomlConfig::default());
    let root_folder = resolver.resolve();

    assert_eq!(root_folder, CompiledDefaults::for_current_platform().root_folder);
}

#[test]
#[serial]
fn test_resolver_priority_order() {
    env::remove_var(ROOT_FOLDER_ENV);

    let toml = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/lifelist-toml")),
        ..Default::default()
    };

    // TOML beats default
    let resolver = RootFolderResolver::new(None, toml.clone());
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lifelist-toml"));

    // Environment beats TOML
    env::set_var(ROOT_FOLDER_ENV, "/tmp/lifelist-env");
    let resolver = RootFolderResolver::new(None, toml.clone());
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lifelist-env"));

    // CLI beats environment
    let resolver = RootFolderResolver::new(Some(PathBuf::from("/tmp/lifelist-cli")), toml);
    assert_eq!(resolver.resolve(), PathBuf::from("/tmp/lifelist-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_missing_config_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    env::set_var(CONFIG_FILE_ENV, dir.path().join("absent.toml"));

    let config = TomlConfig::load_or_default();
    assert_eq!(config, TomlConfig::default());

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_malformed_config_file_degrades_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "api_base_url = ").unwrap();
    env::set_var(CONFIG_FILE_ENV, &path);

    let config = TomlConfig::load_or_default();
    assert_eq!(config, TomlConfig::default());

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
#[serial]
fn test_config_file_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "share_base_url = \"https://example.org/lifelist\"\n[logging]\nlevel = \"warn\"\n",
    )
    .unwrap();
    env::set_var(CONFIG_FILE_ENV, &path);

    let config = TomlConfig::load_or_default();
    assert_eq!(config.share_base_url(), "https://example.org/lifelist");
    assert_eq!(config.logging.level, "warn");

    env::remove_var(CONFIG_FILE_ENV);
}

#[test]
fn test_initializer_creates_missing_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("a").join("b");

    let initializer = RootFolderInitializer::new(root.clone());
    initializer.ensure_directory_exists().unwrap();

    assert!(root.is_dir());
    assert_eq!(initializer.database_path(), root.join("lifelist.db"));
}
