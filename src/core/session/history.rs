use crate::core::constants::HISTORY_KEY;
use crate::core::session::storage::{Storage, StorageError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// One line of a locally cached transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedMessage {
    pub sender: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotion: Option<String>,
}

/// The conversation the interactive chat was last attached to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedConversation {
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub messages: Vec<CachedMessage>,
}

impl CachedConversation {
    pub fn push(&mut self, sender: &str, content: &str, emotion: Option<&str>) {
        self.messages.push(CachedMessage {
            sender: sender.to_string(),
            content: content.to_string(),
            emotion: emotion.map(str::to_string),
        });
    }
}

/// Conversation cache sharing the session's storage medium.
///
/// Logging out clears it through [`super::SessionStore::clear`].
#[derive(Clone)]
pub struct HistoryCache {
    storage: Arc<dyn Storage>,
}

impl HistoryCache {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub fn load(&self) -> Option<CachedConversation> {
        let raw = match self.storage.get(HISTORY_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "Could not read cached conversation");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(cached) => Some(cached),
            Err(err) => {
                warn!(error = %err, "Cached conversation is malformed; ignoring it");
                None
            }
        }
    }

    pub fn store(&self, conversation: &CachedConversation) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(conversation)?;
        self.storage.set(HISTORY_KEY, &encoded)
    }
}
