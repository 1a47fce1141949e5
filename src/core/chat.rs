//! Conversations with the companion: sending messages and browsing history.

use crate::api::{ChatReply, ChatRequest, ConversationMessage, ConversationSummary};
use crate::core::constants::HISTORY_TITLE_MAX_CHARS;
use crate::core::gateway::{ApiError, RequestGateway};
use crate::core::session::UserProfile;
use chrono::{NaiveDateTime, NaiveTime};
use std::fmt;
use tracing::error;

pub const SENDER_USER: &str = "user";
pub const SENDER_BOT: &str = "bot";

/// Shown in place of a reply when a message could not be delivered.
pub const CONNECTION_TROUBLE: &str = "I'm having trouble connecting to the server.";

/// Opening line of a fresh conversation.
pub fn greeting(profile: &UserProfile) -> String {
    let name = profile
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or("there");
    format!("Hi {name}! I'm Resilia, your mental health companion. How are you feeling today?")
}

/// One row of the conversation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub id: i64,
    pub title: String,
    pub started_at: Option<BackendTime>,
}

/// A backend timestamp, parsed when its format is recognised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendTime {
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Raw(String),
}

impl BackendTime {
    pub fn parse(raw: &str) -> Self {
        const DATE_TIME_FORMATS: [&str; 3] =
            ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

        let raw = raw.trim();
        for format in DATE_TIME_FORMATS {
            if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
                return BackendTime::DateTime(parsed);
            }
        }
        match NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
            Ok(parsed) => BackendTime::Time(parsed),
            Err(_) => BackendTime::Raw(raw.to_string()),
        }
    }

    /// `2025-01-31 10:04` style rendering for lists.
    pub fn short(&self) -> String {
        match self {
            BackendTime::DateTime(value) => value.format("%Y-%m-%d %H:%M").to_string(),
            BackendTime::Time(value) => value.format("%H:%M").to_string(),
            BackendTime::Raw(value) => value.clone(),
        }
    }
}

impl fmt::Display for BackendTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short())
    }
}

/// Title of a conversation: its first user message, or a numbered fallback.
pub fn conversation_title(summary: &ConversationSummary) -> String {
    let first = summary
        .messages
        .iter()
        .find(|message| message.sender == SENDER_USER)
        .map(|message| message.content.trim())
        .filter(|content| !content.is_empty());

    match first {
        Some(content) => truncate_title(content),
        None => format!("Conversation {}", summary.id),
    }
}

fn truncate_title(text: &str) -> String {
    if text.chars().count() <= HISTORY_TITLE_MAX_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(HISTORY_TITLE_MAX_CHARS).collect();
    cut.push_str("...");
    cut
}

#[derive(Debug)]
pub enum ChatError {
    EmptyMessage,
    Api(ApiError),
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::EmptyMessage => write!(f, "Message is empty"),
            ChatError::Api(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ChatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ChatError::EmptyMessage => None,
            ChatError::Api(err) => Some(err),
        }
    }
}

impl From<ApiError> for ChatError {
    fn from(err: ApiError) -> Self {
        ChatError::Api(err)
    }
}

#[derive(Clone)]
pub struct ChatService {
    gateway: RequestGateway,
}

impl ChatService {
    pub fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    pub async fn conversations(&self) -> Result<Vec<ConversationSummary>, ApiError> {
        self.gateway.get("/chat/conversations").await
    }

    /// Conversation list for display. Failures are logged and yield no rows.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        match self.conversations().await {
            Ok(summaries) => summaries
                .iter()
                .map(|summary| HistoryEntry {
                    id: summary.id,
                    title: conversation_title(summary),
                    started_at: summary.start_time.as_deref().map(BackendTime::parse),
                })
                .collect(),
            Err(err) => {
                error!(error = %err, "Could not load conversation history");
                Vec::new()
            }
        }
    }

    pub async fn messages(&self, conversation_id: i64) -> Result<Vec<ConversationMessage>, ApiError> {
        self.gateway
            .get(&format!("/chat/conversations/{conversation_id}/messages"))
            .await
    }

    /// Like [`Self::messages`], but a failed load shows as an empty conversation.
    pub async fn messages_or_empty(&self, conversation_id: i64) -> Vec<ConversationMessage> {
        self.messages(conversation_id).await.unwrap_or_else(|err| {
            error!(conversation_id, error = %err, "Failed to load conversation");
            Vec::new()
        })
    }

    /// Sends `text` to an existing conversation, or starts one when `None`.
    pub async fn send(
        &self,
        text: &str,
        conversation_id: Option<i64>,
    ) -> Result<ChatReply, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let request = ChatRequest {
            user_message: text.to_string(),
            conversation_id,
        };
        Ok(self.gateway.post("/chat/message", &request).await?)
    }
}
