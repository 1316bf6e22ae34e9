//! Telegram alert channel
//!
//! Pushes wallet alerts to the operator chat via the Bot API.

use super::{Notifier, TransferAlert};
use crate::config::TelegramConfig;
use std::time::Duration;
use tracing::info;

/// Telegram alert channel
pub struct TelegramNotifier {
    /// Bot token
    bot_token: String,
    /// Operator chat ID
    chat_id: i64,
    /// HTTP client
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a new Telegram notifier
    pub fn new(config: &TelegramConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            bot_token: config.bot_token.clone(),
            chat_id: config.admin_chat_id,
            client,
        }
    }

    /// Send a message to the operator chat
    async fn send_message(&self, text: &str) -> anyhow::Result<()> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let payload = serde_json::json!({
            "chat_id": self.chat_id,
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

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    async fn send_alert(&self, alert: &TransferAlert) -> anyhow::Result<()> {
        self.send_message(&alert.format_message()).await?;

        info!(
            recipient = %alert.recipient,
            amount_sol = %alert.amount_sol,
            "Sent Telegram alert"
        );

        Ok(())
    }

    fn is_enabled(&self) -> bool {
        !self.bot_token.is_empty() && self.chat_id != 0
    }
}
