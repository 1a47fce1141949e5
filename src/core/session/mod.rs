//! Persisted login session.
//!
//! The session is a single record holding the bearer token and the profile
//! of the logged-in user. It is written wholesale on login and registration,
//! merged after profile updates, and removed on logout. Token presence is the
//! only thing that decides whether the user is logged in: a stored record
//! without a token is a logged-out record, whatever else it contains.

pub mod history;
pub mod keyring;
pub mod storage;

use crate::core::constants::{HISTORY_KEY, SESSION_KEY};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

pub use self::history::{CachedConversation, HistoryCache};
pub use self::keyring::{KeyringAccessError, KeyringStorage};
pub use self::storage::{FileStorage, MemoryStorage, SplitSecretStorage, Storage, StorageError};

/// Profile fields shared by the session record and the backend's user payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl UserProfile {
    /// Name used when greeting the user.
    pub fn display_name(&self) -> &str {
        [self.name.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .unwrap_or("Friend")
    }
}

/// The persisted session: bearer token plus the user's profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub profile: UserProfile,
}

impl SessionRecord {
    pub fn new(token: impl Into<String>, profile: UserProfile) -> Self {
        Self {
            token: Some(token.into()),
            profile,
        }
    }

    /// The bearer token, if the record represents a logged-in user.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|token| !token.is_empty())
    }

    pub fn is_authenticated(&self) -> bool {
        self.bearer_token().is_some()
    }

    /// Shallow merge: every field the patch mentions replaces the current
    /// value (an explicit null clears it); the token is never touched.
    pub fn apply(&mut self, patch: ProfilePatch) {
        let profile = &mut self.profile;
        patch_field(&mut profile.id, patch.id);
        patch_field(&mut profile.email, patch.email);
        patch_field(&mut profile.username, patch.username);
        patch_field(&mut profile.name, patch.name);
        patch_field(&mut profile.surname, patch.surname);
        patch_field(&mut profile.age, patch.age);
        patch_field(&mut profile.gender, patch.gender);
        patch_field(&mut profile.bio, patch.bio);
        patch_field(&mut profile.goals, patch.goals);
        patch_field(&mut profile.emergency_contact, patch.emergency_contact);
        patch_field(&mut profile.profile_photo, patch.profile_photo);
    }
}

fn patch_field<T>(slot: &mut Option<T>, update: Option<Option<T>>) {
    if let Some(value) = update {
        *slot = value;
    }
}

/// Deserializes a field that may be absent, null, or set.
///
/// Absent keys take the `#[serde(default)]` path and stay `None`; a present
/// key, even a null one, becomes `Some(..)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial profile carried by a profile-update response.
///
/// Any credential the payload carries is ignored: the token stored in the
/// session is the only one that survives a merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub username: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub surname: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub age: Option<Option<i32>>,
    #[serde(default, deserialize_with = "present")]
    pub gender: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub goals: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub emergency_contact: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub profile_photo: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn bio(value: impl Into<String>) -> Self {
        Self {
            bio: Some(Some(value.into())),
            ..Self::default()
        }
    }
}

/// Failures of session-store operations.
#[derive(Debug)]
pub enum SessionError {
    /// No stored record, or the stored record carries no token.
    NotAuthenticated,
    Storage(StorageError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotAuthenticated => write!(f, "You are not logged in."),
            SessionError::Storage(err) => write!(f, "Session storage failed: {err}"),
        }
    }
}

impl StdError for SessionError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            SessionError::NotAuthenticated => None,
            SessionError::Storage(err) => Some(err),
        }
    }
}

impl From<StorageError> for SessionError {
    fn from(err: StorageError) -> Self {
        SessionError::Storage(err)
    }
}

/// The narrow interface every session consumer depends on.
pub trait SessionStore: Send + Sync {
    /// Current record, or `None` when nothing usable is stored.
    fn read(&self) -> Option<SessionRecord>;
    /// Replaces the stored record wholesale.
    fn save(&self, record: &SessionRecord) -> Result<(), SessionError>;
    /// Merges `patch` into the stored record, keeping its token.
    fn merge(&self, patch: ProfilePatch) -> Result<SessionRecord, SessionError>;
    /// Removes the record and every cache tied to it.
    fn clear(&self) -> Result<(), SessionError>;
}

/// [`SessionStore`] persisted in a [`Storage`] medium under a fixed key.
#[derive(Clone)]
pub struct PersistentSession {
    storage: Arc<dyn Storage>,
}

impl PersistentSession {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }
}

impl SessionStore for PersistentSession {
    fn read(&self) -> Option<SessionRecord> {
        let raw = match self.storage.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %err, "Could not read stored session; treating as logged out");
                return None;
            }
        };

        match serde_json::from_str::<SessionRecord>(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(error = %err, "Stored session is malformed; treating as logged out");
                None
            }
        }
    }

    fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        let encoded = serde_json::to_string(record).map_err(StorageError::from)?;
        self.storage.set(SESSION_KEY, &encoded)?;
        debug!(user_id = ?record.profile.id, "Session saved");
        Ok(())
    }

    fn merge(&self, patch: ProfilePatch) -> Result<SessionRecord, SessionError> {
        let mut record = self.read().ok_or(SessionError::NotAuthenticated)?;
        if !record.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }

        record.apply(patch);
        self.save(&record)?;
        Ok(record)
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.storage.remove(SESSION_KEY)?;
        self.storage.remove(HISTORY_KEY)?;
        debug!("Session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
