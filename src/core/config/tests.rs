use super::data::{path_display, Config, StorageKind};
use super::io::ConfigError;
use crate::core::constants::DEFAULT_BASE_URL;
use crate::core::session::Storage;
use std::path::PathBuf;
use tempfile::TempDir;

#[test]
fn test_load_nonexistent_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nonexistent.toml");

    let config = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_persistence_lifecycle() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let config_path = temp_dir.path().join("nested").join("config.toml");

    let mut config = Config::default();
    config
        .set_value("base-url", "https://resilia.example.org/api/")
        .unwrap();
    config.set_value("storage", "Keyring").unwrap();
    config.set_value("data-dir", "/tmp/resilia-data").unwrap();
    config.save_to_path(&config_path).expect("Failed to save config");

    let loaded = Config::load_from_path(&config_path).expect("Failed to load config");
    assert_eq!(
        loaded.base_url.as_deref(),
        Some("https://resilia.example.org/api")
    );
    assert_eq!(loaded.storage, Some(StorageKind::Keyring));
    assert_eq!(loaded.data_dir, Some(PathBuf::from("/tmp/resilia-data")));

    let mut cleared = loaded.clone();
    cleared.unset_value("storage").unwrap();
    cleared.unset_value("base-url").unwrap();
    cleared.save_to_path(&config_path).unwrap();

    let reloaded = Config::load_from_path(&config_path).unwrap();
    assert_eq!(reloaded.storage_kind(), StorageKind::File);
    assert!(reloaded.base_url.is_none());
    assert!(reloaded.data_dir.is_some());
}

#[test]
fn test_parse_error_names_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "storage = [not toml").unwrap();

    let err = Config::load_from_path(&config_path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_unknown_storage_in_file_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, "storage = \"cloud\"\n").unwrap();

    assert!(matches!(
        Config::load_from_path(&config_path),
        Err(ConfigError::Parse { .. })
    ));
}

#[test]
fn test_base_url_precedence() {
    let config = Config {
        base_url: Some("http://from-config:8080/api".to_string()),
        ..Config::default()
    };

    assert_eq!(
        config.resolve_base_url_with_env(Some("http://flag/api/"), Some("http://env/api")),
        "http://flag/api"
    );
    assert_eq!(
        config.resolve_base_url_with_env(None, Some("http://env/api")),
        "http://env/api"
    );
    assert_eq!(
        config.resolve_base_url_with_env(None, Some("  ")),
        "http://from-config:8080/api"
    );
    assert_eq!(
        Config::default().resolve_base_url_with_env(None, None),
        DEFAULT_BASE_URL
    );
}

#[test]
fn test_set_value_validation() {
    let mut config = Config::default();

    assert!(config.set_value("base-url", "localhost:8080").is_err());
    assert!(config.set_value("storage", "cloud").is_err());
    assert!(config.set_value("storage", "  ").is_err());
    assert!(config.set_value("theme", "dark").is_err());
    assert!(config.unset_value("theme").is_err());
    assert_eq!(config, Config::default());
}

#[test]
fn test_explicit_data_dir_is_used_for_storage() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: Some(temp_dir.path().to_path_buf()),
        ..Config::default()
    };

    assert_eq!(config.resolve_data_dir().unwrap(), temp_dir.path());

    let storage = config.open_storage().unwrap();
    storage.set("sample", "{}").unwrap();
    assert!(temp_dir.path().join("sample.json").exists());
}

#[test]
fn test_storage_kind_parsing() {
    assert_eq!("file".parse::<StorageKind>(), Ok(StorageKind::File));
    assert_eq!(" KEYRING ".parse::<StorageKind>(), Ok(StorageKind::Keyring));
    assert_eq!(StorageKind::Keyring.to_string(), "keyring");
}

#[cfg(unix)]
#[test]
fn test_path_display_uses_tilde_under_home() {
    if let Some(home) = std::env::var_os("HOME") {
        let path = PathBuf::from(home).join(".config").join("resilia");
        assert_eq!(path_display(&path), "~/.config/resilia");
    }
    assert_eq!(path_display("/opt/resilia"), "/opt/resilia");
}
