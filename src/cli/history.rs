use std::error::Error;
use std::io::Write;

use crate::cli::account::require_user;
use crate::core::chat::{BackendTime, SENDER_USER};
use crate::core::client::ResiliaClient;

pub async fn list<W: Write>(
    client: &ResiliaClient,
    limit: Option<usize>,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    require_user(client)?;

    let entries = client.chat.history().await;
    if entries.is_empty() {
        writeln!(out, "No conversations yet.")?;
        return Ok(());
    }

    for entry in entries.iter().take(limit.unwrap_or(usize::MAX)) {
        let started = entry
            .started_at
            .as_ref()
            .map(BackendTime::short)
            .unwrap_or_default();
        writeln!(out, "#{:<5} {:<16}  {}", entry.id, started, entry.title)?;
    }
    Ok(())
}

pub async fn show<W: Write>(
    client: &ResiliaClient,
    conversation_id: i64,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let user = require_user(client)?;

    let messages = client.chat.messages_or_empty(conversation_id).await;
    if messages.is_empty() {
        writeln!(out, "No messages in conversation {conversation_id}.")?;
        return Ok(());
    }

    let you = user.profile.display_name().to_string();
    for message in messages {
        let speaker = if message.sender == SENDER_USER {
            you.as_str()
        } else {
            "Resilia"
        };
        let time = message
            .timestamp
            .as_deref()
            .map(|raw| format!("[{}] ", BackendTime::parse(raw)))
            .unwrap_or_default();
        writeln!(out, "{time}{speaker}: {}", message.content)?;
    }
    Ok(())
}
