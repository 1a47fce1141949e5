//! Key-value storage media backing the session store.
//!
//! A [`Storage`] behaves like a tiny string-keyed document store: each key
//! maps to one serialized document that is replaced wholesale on write. The
//! session store and the conversation cache are layered on top of it so the
//! medium can be swapped (file, keyring, memory) without touching either.

use crate::core::config::data::path_display;
use crate::core::session::keyring::KeyringAccessError;
use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Failures raised by a storage medium.
#[derive(Debug)]
pub enum StorageError {
    /// Reading, writing or removing a file failed.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// A record could not be serialized before writing it.
    Serialize(serde_json::Error),
    /// The platform keyring refused the operation.
    Keyring(KeyringAccessError),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Io { path, source } => {
                write!(f, "Failed to access {}: {}", path_display(path), source)
            }
            StorageError::Serialize(source) => write!(f, "Failed to encode record: {source}"),
            StorageError::Keyring(source) => write!(f, "Keyring access failed: {source}"),
        }
    }
}

impl StdError for StorageError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            StorageError::Io { source, .. } => Some(source),
            StorageError::Serialize(source) => Some(source),
            StorageError::Keyring(source) => Some(source),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialize(err)
    }
}

impl From<KeyringAccessError> for StorageError {
    fn from(err: KeyringAccessError) -> Self {
        StorageError::Keyring(err)
    }
}

/// A persistent string-keyed store. Each write replaces the whole value.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Removing a key that does not exist is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-process storage. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A panic while holding the lock leaves the map itself intact.
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

/// Stores each key as `<dir>/<key>.json`, replacing files atomically.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let io_err = |source| StorageError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;
        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        temp_file.write_all(value.as_bytes()).map_err(io_err)?;
        temp_file.as_file_mut().sync_all().map_err(io_err)?;
        temp_file
            .persist(&path)
            .map_err(|err| io_err(err.error))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Io { path, source }),
        }
    }
}

/// Field moved out of each document into the secret store.
const SECRET_FIELD: &str = "token";

/// Keeps the `token` field of each document in a secret store and the rest
/// of the document in a regular one.
///
/// Secret stores such as the Windows credential manager cap entries at a few
/// kilobytes, while a session document carrying a profile photo runs to
/// megabytes. Values that are not JSON objects go to the document store whole.
#[derive(Clone)]
pub struct SplitSecretStorage {
    secrets: Arc<dyn Storage>,
    documents: Arc<dyn Storage>,
}

impl SplitSecretStorage {
    pub fn new(secrets: Arc<dyn Storage>, documents: Arc<dyn Storage>) -> Self {
        Self { secrets, documents }
    }
}

impl Storage for SplitSecretStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let Some(raw) = self.documents.get(key)? else {
            return Ok(None);
        };
        let Some(secret) = self.secrets.get(key)? else {
            return Ok(Some(raw));
        };

        match serde_json::from_str::<serde_json::Value>(&raw) {
            Ok(serde_json::Value::Object(mut fields)) => {
                fields.insert(SECRET_FIELD.to_string(), serde_json::Value::String(secret));
                Ok(Some(serde_json::to_string(&fields)?))
            }
            // Malformed documents are left for the reader to reject.
            _ => Ok(Some(raw)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut fields = match serde_json::from_str::<serde_json::Value>(value) {
            Ok(serde_json::Value::Object(fields)) => fields,
            _ => {
                self.secrets.remove(key)?;
                return self.documents.set(key, value);
            }
        };

        match fields.remove(SECRET_FIELD) {
            Some(serde_json::Value::String(secret)) => self.secrets.set(key, &secret)?,
            _ => self.secrets.remove(key)?,
        }
        self.documents.set(key, &serde_json::to_string(&fields)?)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.secrets.remove(key)?;
        self.documents.remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Memory storage that refuses long values, like a platform credential store.
    struct CappedStorage {
        inner: MemoryStorage,
        max_len: usize,
    }

    impl Storage for CappedStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if value.len() > self.max_len {
                return Err(StorageError::Io {
                    path: PathBuf::from(key),
                    source: std::io::Error::other("secret too long"),
                });
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    fn split_storage() -> (Arc<CappedStorage>, Arc<MemoryStorage>, SplitSecretStorage) {
        let secrets = Arc::new(CappedStorage {
            inner: MemoryStorage::new(),
            max_len: 2560,
        });
        let documents = Arc::new(MemoryStorage::new());
        let storage = SplitSecretStorage::new(secrets.clone(), documents.clone());
        (secrets, documents, storage)
    }

    #[test]
    fn memory_storage_replaces_and_removes_values() {
        let storage = MemoryStorage::new();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("two"));

        storage.remove("k").unwrap();
        assert!(storage.get("k").unwrap().is_none());
        storage.remove("k").expect("removing a missing key is fine");
    }

    #[test]
    fn file_storage_creates_directory_on_first_write() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("data");
        let storage = FileStorage::new(&dir);

        assert!(storage.get("resiliaUser").unwrap().is_none());
        storage.set("resiliaUser", "{\"token\":\"T1\"}").unwrap();

        assert!(dir.join("resiliaUser.json").exists());
        assert_eq!(
            storage.get("resiliaUser").unwrap().as_deref(),
            Some("{\"token\":\"T1\"}")
        );
    }

    #[test]
    fn file_storage_remove_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set("chatHistory", "[]").unwrap();
        storage.remove("chatHistory").unwrap();
        storage.remove("chatHistory").unwrap();

        assert!(!temp_dir.path().join("chatHistory.json").exists());
    }

    #[test]
    fn file_storage_overwrites_existing_document() {
        let temp_dir = TempDir::new().unwrap();
        let storage = FileStorage::new(temp_dir.path());

        storage.set("resiliaUser", "first").unwrap();
        storage.set("resiliaUser", "second").unwrap();

        let contents = fs::read_to_string(temp_dir.path().join("resiliaUser.json")).unwrap();
        assert_eq!(contents, "second");
    }

    #[test]
    fn split_storage_keeps_only_the_token_in_the_secret_store() {
        let (secrets, documents, storage) = split_storage();
        let photo = format!("data:image/png;base64,{}", "A".repeat(2_800_000));
        let value = serde_json::json!({"token": "T1", "id": 1, "profilePhoto": photo});

        storage.set("resiliaUser", &value.to_string()).unwrap();

        assert_eq!(secrets.get("resiliaUser").unwrap().as_deref(), Some("T1"));
        let document = documents.get("resiliaUser").unwrap().unwrap();
        assert!(!document.contains("\"token\""));

        let restored = storage.get("resiliaUser").unwrap().unwrap();
        assert_eq!(
            serde_json::from_str::<serde_json::Value>(&restored).unwrap(),
            value
        );
    }

    #[test]
    fn split_storage_drops_a_stale_secret_when_the_document_has_none() {
        let (secrets, _, storage) = split_storage();
        storage.set("resiliaUser", r#"{"token":"T1","id":1}"#).unwrap();
        storage.set("resiliaUser", r#"{"id":1}"#).unwrap();

        assert!(secrets.get("resiliaUser").unwrap().is_none());
        assert_eq!(
            storage.get("resiliaUser").unwrap().as_deref(),
            Some(r#"{"id":1}"#)
        );
    }

    #[test]
    fn split_storage_passes_non_object_values_through() {
        let (secrets, documents, storage) = split_storage();
        storage.set("chatHistory", "[1,2]").unwrap();

        assert!(!secrets.inner.contains("chatHistory"));
        assert_eq!(documents.get("chatHistory").unwrap().as_deref(), Some("[1,2]"));
        assert_eq!(storage.get("chatHistory").unwrap().as_deref(), Some("[1,2]"));

        storage.remove("chatHistory").unwrap();
        assert!(storage.get("chatHistory").unwrap().is_none());
    }
}
