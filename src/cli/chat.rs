//! One-shot `say` and the interactive line-based chat.

use std::error::Error;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::api::ChatReply;
use crate::cli::account::require_user;
use crate::core::chat::{greeting, ChatError, CONNECTION_TROUBLE, SENDER_BOT, SENDER_USER};
use crate::core::client::ResiliaClient;
use crate::core::session::CachedConversation;
use crate::utils::input::prompt_line;
use crate::utils::logging::TranscriptLog;

const BOT_NAME: &str = "Resilia";

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub conversation: Option<i64>,
    pub resume: bool,
    pub log: Option<PathBuf>,
}

pub async fn say<W: Write>(
    client: &ResiliaClient,
    conversation: Option<i64>,
    words: &[String],
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    require_user(client)?;
    let text = words.join(" ");

    let reply = match client.chat.send(&text, conversation).await {
        Ok(reply) => reply,
        Err(ChatError::EmptyMessage) => return Err("Message is empty".into()),
        Err(ChatError::Api(err)) => {
            warn!(error = %err, "Sending message failed");
            return Err(CONNECTION_TROUBLE.into());
        }
    };

    writeln!(out, "{}", reply.ai_response)?;

    let mut cached = CachedConversation {
        conversation_id: conversation,
        messages: Vec::new(),
    };
    if conversation.is_some() {
        if let Some(previous) = client.history.load() {
            if previous.conversation_id == conversation {
                cached = previous;
            }
        }
    }
    record_exchange(&mut cached, text.trim(), &reply);
    remember(client, &cached);
    Ok(())
}

pub async fn run_chat(client: &ResiliaClient, options: ChatOptions) -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    chat_loop(client, options, &mut reader, &mut io::stdout()).await
}

/// Interactive chat over any line source; `run_chat` binds it to the terminal.
pub async fn chat_loop<R: BufRead, W: Write>(
    client: &ResiliaClient,
    options: ChatOptions,
    reader: &mut R,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let user = require_user(client)?;
    let you = user.profile.display_name().to_string();
    let mut transcript = TranscriptLog::new(options.log.clone())?;
    if transcript.is_active() {
        writeln!(out, "Transcript: {}", transcript.status_string())?;
    }

    let mut conversation = opening_conversation(client, &options).await;
    if conversation.messages.is_empty() {
        let hello = greeting(&user.profile);
        print_line(out, BOT_NAME, &hello, None)?;
        log_or_warn(transcript.log_reply(&hello));
    } else {
        for message in &conversation.messages {
            let speaker = if message.sender == SENDER_USER {
                you.as_str()
            } else {
                BOT_NAME
            };
            print_line(out, speaker, &message.content, message.emotion.as_deref())?;
        }
    }

    while let Some(line) = prompt_line(reader, out, &format!("{you}: "))? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "/quit" | "/exit" => break,
            "/new" => {
                conversation = CachedConversation::default();
                remember(client, &conversation);
                log_or_warn(transcript.log_note("New conversation"));
                writeln!(out, "Started a new conversation.")?;
                continue;
            }
            "/log" => {
                match transcript.toggle_logging("Logging paused") {
                    Ok(status) => writeln!(out, "{status}")?,
                    Err(e) => writeln!(out, "⚠️  {e}")?,
                }
                continue;
            }
            _ => {}
        }
        if let Some(path) = line.strip_prefix("/log ") {
            match transcript.set_log_file(PathBuf::from(path.trim())) {
                Ok(status) => writeln!(out, "{status}")?,
                Err(e) => writeln!(out, "⚠️  Could not open log file: {e}")?,
            }
            continue;
        }

        log_or_warn(transcript.log_user(&you, line));
        match client.chat.send(line, conversation.conversation_id).await {
            Ok(reply) => {
                record_exchange(&mut conversation, line, &reply);
                remember(client, &conversation);
                print_line(
                    out,
                    BOT_NAME,
                    &reply.ai_response,
                    reply.detected_emotion.as_deref(),
                )?;
                log_or_warn(transcript.log_reply(&reply.ai_response));
            }
            Err(err) => {
                warn!(error = %err, "Sending message failed");
                print_line(out, BOT_NAME, CONNECTION_TROUBLE, None)?;
                log_or_warn(transcript.log_reply(CONNECTION_TROUBLE));
            }
        }
    }

    writeln!(out)?;
    Ok(())
}

async fn opening_conversation(client: &ResiliaClient, options: &ChatOptions) -> CachedConversation {
    if let Some(id) = options.conversation {
        let mut conversation = CachedConversation {
            conversation_id: Some(id),
            messages: Vec::new(),
        };
        for message in client.chat.messages_or_empty(id).await {
            conversation.push(&message.sender, &message.content, message.emotion.as_deref());
        }
        return conversation;
    }

    if options.resume {
        match client.history.load() {
            Some(previous) => return previous,
            None => debug!("Nothing to resume; starting a new conversation"),
        }
    }
    CachedConversation::default()
}

fn record_exchange(conversation: &mut CachedConversation, text: &str, reply: &ChatReply) {
    conversation.conversation_id = Some(reply.conversation_id);
    conversation.push(SENDER_USER, text, None);
    conversation.push(SENDER_BOT, &reply.ai_response, reply.detected_emotion.as_deref());
}

fn remember(client: &ResiliaClient, conversation: &CachedConversation) {
    if let Err(err) = client.history.store(conversation) {
        warn!(error = %err, "Could not cache conversation");
    }
}

fn log_or_warn(result: Result<(), Box<dyn Error>>) {
    if let Err(err) = result {
        warn!(error = %err, "Could not write transcript");
    }
}

fn print_line<W: Write>(
    out: &mut W,
    speaker: &str,
    content: &str,
    emotion: Option<&str>,
) -> io::Result<()> {
    writeln!(out, "{speaker}: {content}")?;
    if let Some(emotion) = emotion.filter(|value| !value.is_empty()) {
        writeln!(out, "  · {}", emotion.to_lowercase())?;
    }
    Ok(())
}
