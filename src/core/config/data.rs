use crate::core::constants::{BASE_URL_ENV, DEFAULT_BASE_URL};
use crate::utils::url::{is_http_url, normalize_base_url};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where the session record and conversation cache are persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    /// JSON documents in the platform data directory.
    #[default]
    File,
    /// Entries in the system keyring.
    Keyring,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::File => f.write_str("file"),
            StorageKind::Keyring => f.write_str("keyring"),
        }
    }
}

impl FromStr for StorageKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Ok(StorageKind::File),
            "keyring" => Ok(StorageKind::Keyring),
            other => Err(format!(
                "Unknown storage '{other}' (expected 'file' or 'keyring')"
            )),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend address, e.g. "https://resilia.example.org/api"
    pub base_url: Option<String>,
    /// Session storage medium ("file" or "keyring")
    pub storage: Option<StorageKind>,
    /// Overrides the platform data directory used by file storage
    pub data_dir: Option<PathBuf>,
}

/// Keys accepted by `resilia config set/unset`.
pub const CONFIG_KEYS: [&str; 3] = ["base-url", "storage", "data-dir"];

impl Config {
    /// Backend address: explicit override, then `RESILIA_BASE_URL`, then the
    /// config file, then the built-in default.
    pub fn resolve_base_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(BASE_URL_ENV).ok();
        self.resolve_base_url_with_env(cli_override, env_value.as_deref())
    }

    pub(crate) fn resolve_base_url_with_env(
        &self,
        cli_override: Option<&str>,
        env_value: Option<&str>,
    ) -> String {
        [cli_override, env_value, self.base_url.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(normalize_base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
    }

    pub fn storage_kind(&self) -> StorageKind {
        self.storage.unwrap_or_default()
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.trim();
        if value.is_empty() {
            return Err(format!("A value is required for '{key}'"));
        }
        match key {
            "base-url" => {
                if !is_http_url(value) {
                    return Err(format!("'{value}' is not an http(s) URL"));
                }
                self.base_url = Some(normalize_base_url(value));
            }
            "storage" => self.storage = Some(value.parse()?),
            "data-dir" => self.data_dir = Some(PathBuf::from(value)),
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    pub fn unset_value(&mut self, key: &str) -> Result<(), String> {
        match key {
            "base-url" => self.base_url = None,
            "storage" => self.storage = None,
            "data-dir" => self.data_dir = None,
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {key} (expected one of: {})",
        CONFIG_KEYS.join(", ")
    )
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
///
/// # Examples
/// - Unix: `/home/user/.local/share/resilia` → `~/.local/share/resilia`
/// - macOS: `/Users/user/Library/Application Support/...` → `~/Library/Application Support/...`
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}
