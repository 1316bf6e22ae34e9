//! Minimal Telegram Bot API client
//!
//! Long-polls getUpdates and sends command replies. Only the fields the
//! command interface needs are modeled; everything else is ignored.

use crate::config::TelegramConfig;
use serde::Deserialize;
use std::time::Duration;

/// One update from getUpdates
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// Incoming chat message
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

/// Message sender
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

/// Chat the message arrived in
#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// Bot API response envelope
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// Telegram Bot API client
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
    poll_timeout_secs: u64,
}

impl TelegramApi {
    /// Create a new API client
    pub fn new(config: &TelegramConfig) -> Self {
        // HTTP timeout must outlast the long-poll timeout
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.poll_timeout_secs + 10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: format!("https://api.telegram.org/bot{}", config.bot_token),
            poll_timeout_secs: config.poll_timeout_secs,
        }
    }

    /// Long-poll for new updates
    ///
    /// `offset` acknowledges everything before it; pass the last seen
    /// update_id plus one.
    pub async fn get_updates(&self, offset: Option<i64>) -> anyhow::Result<Vec<Update>> {
        let url = format!("{}/getUpdates", self.base_url);
        let payload = serde_json::json!({
            "timeout": self.poll_timeout_secs,
            "offset": offset,
            "allowed_updates": ["message"],
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error: {} - {}", status, body);
        }

        let parsed: ApiResponse<Vec<Update>> = response.json().await?;
        if !parsed.ok {
            anyhow::bail!(
                "getUpdates rejected: {}",
                parsed.description.unwrap_or_default()
            );
        }

        Ok(parsed.result.unwrap_or_default())
    }

    /// Send a reply to a chat
    pub async fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let url = format!("{}/sendMessage", self.base_url);
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true,
        });

        let response = self.client.post(&url).json(&payload).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error: {} - {}", status, body);
        }

        Ok(())
    }
}
