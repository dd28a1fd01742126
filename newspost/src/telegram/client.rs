use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Outbound message could not be delivered
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Telegram sendMessage request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Telegram sendMessage returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// Anything able to push a text message into a chat
#[async_trait::async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError>;
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'a str,
}

/// Telegram Bot API client (only `sendMessage` is used)
pub struct TelegramClient {
    send_url: Url,
    client: Client,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self> {
        let mut send_url = Url::parse(api_base)
            .with_context(|| format!("invalid Telegram API base URL: {}", api_base))?;
        // Bot tokens contain ':' so the path is built segment by segment, not joined
        send_url
            .path_segments_mut()
            .map_err(|_| anyhow!("Telegram API base URL cannot carry a path: {}", api_base))?
            .pop_if_empty()
            .push(&format!("bot{}", token))
            .push("sendMessage");

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self { send_url, client })
    }
}

#[async_trait::async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.send_url.clone())
            .json(&SendMessage {
                chat_id,
                text,
                parse_mode: "HTML",
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(chat_id, len = text.len(), "Telegram message delivered");
        Ok(())
    }
}
