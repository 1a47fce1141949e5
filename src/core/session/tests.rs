use super::*;
use crate::core::session::storage::MemoryStorage;
use std::path::PathBuf;
use tempfile::TempDir;

/// Storage whose every access fails, like a locked keychain.
struct UnreadableStorage;

impl Storage for UnreadableStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Io {
            path: PathBuf::from(key),
            source: std::io::Error::other("locked"),
        })
    }

    fn set(&self, key: &str, _value: &str) -> Result<(), StorageError> {
        self.get(key).map(|_| ())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.get(key).map(|_| ())
    }
}

fn memory_session() -> (Arc<MemoryStorage>, PersistentSession) {
    let storage = Arc::new(MemoryStorage::new());
    let session = PersistentSession::new(storage.clone());
    (storage, session)
}

fn record(token: &str, bio: Option<&str>) -> SessionRecord {
    SessionRecord::new(
        token,
        UserProfile {
            id: Some(1),
            email: Some("a@b.com".to_string()),
            bio: bio.map(str::to_string),
            ..UserProfile::default()
        },
    )
}

#[test]
fn read_returns_none_when_nothing_is_stored() {
    let (_, session) = memory_session();
    assert!(session.read().is_none());
}

#[test]
fn save_then_read_returns_the_same_record() {
    let (_, session) = memory_session();
    let saved = record("T1", Some("hello"));

    session.save(&saved).unwrap();

    assert_eq!(session.read(), Some(saved));
}

#[test]
fn save_overwrites_the_previous_record_wholesale() {
    let (_, session) = memory_session();
    session.save(&record("T1", Some("old bio"))).unwrap();

    let replacement = SessionRecord::new("T2", UserProfile::default());
    session.save(&replacement).unwrap();

    let stored = session.read().unwrap();
    assert_eq!(stored.token.as_deref(), Some("T2"));
    assert!(stored.profile.bio.is_none());
    assert!(stored.profile.email.is_none());
}

#[test]
fn malformed_stored_state_reads_as_absent() {
    let (storage, session) = memory_session();
    storage.set(SESSION_KEY, "{not json").unwrap();
    assert!(session.read().is_none());

    storage.set(SESSION_KEY, "[1, 2, 3]").unwrap();
    assert!(session.read().is_none());
}

#[test]
fn unreadable_storage_reads_as_absent() {
    let session = PersistentSession::new(Arc::new(UnreadableStorage));
    assert!(session.read().is_none());
    assert!(matches!(
        session.merge(ProfilePatch::bio("hello")),
        Err(SessionError::NotAuthenticated)
    ));
    assert!(matches!(
        session.save(&record("T1", None)),
        Err(SessionError::Storage(_))
    ));
}

#[test]
fn split_storage_session_keeps_a_large_photo_out_of_the_secret_store() {
    let secrets = Arc::new(MemoryStorage::new());
    let documents = Arc::new(MemoryStorage::new());
    let session = PersistentSession::new(Arc::new(SplitSecretStorage::new(
        secrets.clone(),
        documents.clone(),
    )));
    let mut saved = record("T1", Some("hello"));
    saved.profile.profile_photo =
        Some(format!("data:image/jpeg;base64,{}", "A".repeat(2_800_000)));

    session.save(&saved).unwrap();

    assert_eq!(secrets.get(SESSION_KEY).unwrap().as_deref(), Some("T1"));
    assert_eq!(session.read(), Some(saved));

    let merged = session.merge(ProfilePatch::bio("updated")).unwrap();
    assert_eq!(merged.token.as_deref(), Some("T1"));
    assert_eq!(session.read().unwrap().profile.bio.as_deref(), Some("updated"));

    session.clear().unwrap();
    assert!(!secrets.contains(SESSION_KEY));
    assert!(!documents.contains(SESSION_KEY));
    assert!(session.read().is_none());
}

#[test]
fn stored_record_uses_camel_case_keys_and_omits_absent_fields() {
    let (storage, session) = memory_session();
    let mut saved = record("T1", None);
    saved.profile.emergency_contact = Some("555-0100".to_string());
    session.save(&saved).unwrap();

    let raw = storage.get(SESSION_KEY).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["token"], "T1");
    assert_eq!(value["emergencyContact"], "555-0100");
    assert!(value.get("bio").is_none());
    assert!(value.get("emergency_contact").is_none());
}

#[test]
fn merge_keeps_token_and_replaces_mentioned_fields() {
    let (_, session) = memory_session();
    session.save(&record("T1", Some("old"))).unwrap();

    let merged = session.merge(ProfilePatch::bio("x")).unwrap();

    assert_eq!(merged.token.as_deref(), Some("T1"));
    assert_eq!(merged.profile.bio.as_deref(), Some("x"));
    assert_eq!(merged.profile.email.as_deref(), Some("a@b.com"));
    assert_eq!(session.read(), Some(merged));
}

#[test]
fn merge_ignores_credentials_in_the_patch() {
    let (_, session) = memory_session();
    session.save(&record("T1", None)).unwrap();

    let patch: ProfilePatch =
        serde_json::from_str(r#"{"jwt": null, "token": "evil", "bio": "hello"}"#).unwrap();
    let merged = session.merge(patch).unwrap();

    assert_eq!(merged.token.as_deref(), Some("T1"));
    assert_eq!(merged.profile.bio.as_deref(), Some("hello"));
}

#[test]
fn merge_clears_fields_the_patch_nulls_out() {
    let (_, session) = memory_session();
    session.save(&record("T1", Some("old"))).unwrap();

    let patch: ProfilePatch = serde_json::from_str(r#"{"bio": null}"#).unwrap();
    let merged = session.merge(patch).unwrap();

    assert!(merged.profile.bio.is_none());
    assert_eq!(merged.profile.email.as_deref(), Some("a@b.com"));
}

#[test]
fn merge_without_a_session_is_not_authenticated() {
    let (_, session) = memory_session();
    let err = session.merge(ProfilePatch::bio("x")).unwrap_err();
    assert!(matches!(err, SessionError::NotAuthenticated));
}

#[test]
fn merge_with_a_tokenless_record_is_not_authenticated() {
    let (_, session) = memory_session();
    let mut tokenless = record("T1", Some("old"));
    tokenless.token = None;
    session.save(&tokenless).unwrap();

    let err = session.merge(ProfilePatch::bio("x")).unwrap_err();
    assert!(matches!(err, SessionError::NotAuthenticated));
    assert_eq!(
        session.read().unwrap().profile.bio.as_deref(),
        Some("old"),
        "a refused merge must not write"
    );
}

#[test]
fn empty_token_counts_as_logged_out() {
    let mut empty = record("", None);
    assert!(!empty.is_authenticated());
    empty.token = Some("T1".to_string());
    assert!(empty.is_authenticated());
}

#[test]
fn clear_removes_session_and_cached_history() {
    let (storage, session) = memory_session();
    session.save(&record("T1", None)).unwrap();
    storage.set(HISTORY_KEY, "{\"conversationId\": 3}").unwrap();

    session.clear().unwrap();

    assert!(session.read().is_none());
    assert!(!storage.contains(SESSION_KEY));
    assert!(!storage.contains(HISTORY_KEY));
}

#[test]
fn clear_on_an_empty_store_succeeds() {
    let (_, session) = memory_session();
    session.clear().expect("clearing nothing is fine");
}

#[test]
fn file_backed_session_survives_a_new_store_instance() {
    let temp_dir = TempDir::new().unwrap();
    let first = PersistentSession::new(Arc::new(FileStorage::new(temp_dir.path())));
    first.save(&record("T1", Some("hello"))).unwrap();

    let second = PersistentSession::new(Arc::new(FileStorage::new(temp_dir.path())));
    let restored = second.read().unwrap();
    assert_eq!(restored.token.as_deref(), Some("T1"));
    assert_eq!(restored.profile.bio.as_deref(), Some("hello"));
}

#[test]
fn display_name_prefers_name_then_username() {
    let mut profile = UserProfile::default();
    assert_eq!(profile.display_name(), "Friend");

    profile.username = Some("sky".to_string());
    assert_eq!(profile.display_name(), "sky");

    profile.name = Some(String::new());
    assert_eq!(profile.display_name(), "sky");

    profile.name = Some("Ada".to_string());
    assert_eq!(profile.display_name(), "Ada");
}
