//! Request and response payloads exchanged with the Resilia backend.

use crate::core::session::UserProfile;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

/// Body of `PUT /user/profile`. The backend only touches fields that are set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProfileUpdate::default()
    }
}

/// Login and registration response: the credential plus the user's profile.
///
/// The credential is named `jwt` on the wire, not `token`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(deserialize_with = "non_empty")]
    pub jwt: String,
    #[serde(flatten)]
    pub profile: UserProfile,
}

/// An empty credential would store a session that reads as logged out.
fn non_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    if value.is_empty() {
        return Err(D::Error::custom("credential is empty"));
    }
    Ok(value)
}

/// Sender and content of a message embedded in a conversation summary.
#[derive(Debug, Clone, Deserialize)]
pub struct PreviewMessage {
    pub sender: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: i64,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub messages: Vec<PreviewMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationMessage {
    pub id: i64,
    #[serde(default)]
    pub content: String,
    pub sender: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub emotion: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub user_message: String,
    pub conversation_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub ai_response: String,
    pub conversation_id: i64,
    #[serde(default)]
    pub detected_emotion: Option<String>,
}
