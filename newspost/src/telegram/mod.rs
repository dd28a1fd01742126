//! Telegram webhook relay: `/start` and `/generate <topic>` commands.

use serde::Deserialize;
use std::borrow::Cow;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::pipeline::{ContentPipeline, GeneratedContent};

pub mod client;

pub use client::{DeliveryError, MessageSender, TelegramClient};

pub const GREETING: &str = "👋 Hi! I write articles grounded in the latest news.\n\
Send /generate &lt;topic&gt; and I'll reply with a title, a meta-description and the full text.";

pub const USAGE_REMINDER: &str = "Please add a topic after the command, e.g. /generate climate change";

/// Telegram caps the parsed text of a message at 4096 UTF-16 code units.
const MAX_MESSAGE_UNITS: usize = 4000;

/// Subset of the Telegram `Update` object the relay reads
#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Generate(String),
    /// `/generate` with nothing after it
    GenerateWithoutTopic,
    Unrecognized,
}

impl Command {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let (head, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
        // Group chats address commands as /generate@my_bot
        let name = head.split('@').next().unwrap_or(head);

        match name {
            "/start" => Command::Start,
            "/generate" => {
                let topic = rest.trim();
                if topic.is_empty() {
                    Command::GenerateWithoutTopic
                } else {
                    Command::Generate(topic.to_string())
                }
            }
            _ => Command::Unrecognized,
        }
    }
}

pub struct ChatRelay {
    pipeline: Arc<ContentPipeline>,
    sender: Arc<dyn MessageSender>,
}

impl ChatRelay {
    pub fn new(pipeline: Arc<ContentPipeline>, sender: Arc<dyn MessageSender>) -> Self {
        Self { pipeline, sender }
    }

    /// Handle one inbound update. Only the final reply's delivery failure is returned.
    pub async fn handle_update(&self, update: &Update) -> Result<(), DeliveryError> {
        let Some(message) = update.message.as_ref() else {
            debug!(update_id = update.update_id, "update without message ignored");
            return Ok(());
        };
        let Some(text) = message.text.as_deref() else {
            return Ok(());
        };
        let chat_id = message.chat.id;

        match Command::parse(text) {
            Command::Start => self.sender.send_message(chat_id, GREETING).await,
            Command::GenerateWithoutTopic => self.sender.send_message(chat_id, USAGE_REMINDER).await,
            Command::Generate(topic) => {
                info!(chat_id, topic = %topic, "generation requested from Telegram");
                let started = acknowledgement(&topic);
                if let Err(e) = self.sender.send_message(chat_id, &started).await {
                    warn!(%e, chat_id, "failed to send acknowledgement, continuing");
                }

                let reply = match self.pipeline.generate(&topic).await {
                    Ok(content) => format_content(&content),
                    Err(e) => format!("❌ Generation failed: {}", escape_html(&e.to_string())),
                };
                self.sender.send_message(chat_id, &reply).await
            }
            Command::Unrecognized => {
                debug!(chat_id, "unrecognized message ignored");
                Ok(())
            }
        }
    }
}

pub fn acknowledgement(topic: &str) -> String {
    format!("⏳ Generating a post about <b>{}</b>...", escape_html(topic))
}

/// Render generated content as one HTML message: bold title, italic description, body.
/// The body is cut so the visible text stays within Telegram's length limit.
pub fn format_content(content: &GeneratedContent) -> String {
    let head_units = utf16_len(&content.title) + utf16_len(&content.meta_description) + 4;
    let body = truncate_utf16(&content.post_content, MAX_MESSAGE_UNITS.saturating_sub(head_units));

    format!(
        "<b>{}</b>\n\n<i>{}</i>\n\n{}",
        escape_html(&content.title),
        escape_html(&content.meta_description),
        escape_html(&body)
    )
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

/// Keep at most `budget` UTF-16 units, ending with `…` when anything was dropped.
fn truncate_utf16(text: &str, budget: usize) -> Cow<'_, str> {
    if utf16_len(text) <= budget {
        return Cow::Borrowed(text);
    }
    let limit = budget.saturating_sub(1);
    let mut used = 0;
    let mut end = 0;
    for (i, c) in text.char_indices() {
        used += c.len_utf16();
        if used > limit {
            break;
        }
        end = i + c.len_utf8();
    }
    Cow::Owned(format!("{}…", &text[..end]))
}

/// Escape the characters Telegram's HTML parse mode reserves.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}
