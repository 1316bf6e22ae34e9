//! Admin command interface
//!
//! Long-polls Telegram for operator commands: source CRUD, amount range,
//! timezone, notification mode, cache reset. Only the configured admin
//! chat is served; everyone else gets a denial on /start and silence
//! otherwise.

pub mod api;
pub mod commands;

pub use api::TelegramApi;
pub use commands::{handle_message, Dialogue};

use crate::config::TelegramConfig;
use crate::db::DbPool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run the command bot until the token is cancelled
pub async fn run_bot(db: DbPool, config: TelegramConfig, cancel_token: CancellationToken) {
    let api = TelegramApi::new(&config);
    let mut offset: Option<i64> = None;
    let mut dialogue = Dialogue::Idle;

    tracing::info!(admin_chat_id = config.admin_chat_id, "Starting command bot");

    loop {
        let updates = tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Command bot shutting down");
                break;
            }
            result = api.get_updates(offset) => result,
        };

        let updates = match updates {
            Ok(updates) => updates,
            Err(e) => {
                tracing::warn!(error = %e, "getUpdates failed, backing off");
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = tokio::time::sleep(Duration::from_secs(5)) => {}
                }
                continue;
            }
        };

        for update in updates {
            offset = Some(update.update_id + 1);

            let Some(message) = update.message else {
                continue;
            };
            let Some(text) = message.text.clone() else {
                continue;
            };

            let from_id = message.from.as_ref().map(|u| u.id);
            if message.chat.id != config.admin_chat_id || from_id != Some(config.admin_chat_id) {
                if text.starts_with("/start") {
                    if let Err(e) = api
                        .send_message(message.chat.id, "❌ You don't have access to this bot")
                        .await
                    {
                        tracing::warn!(error = %e, "Failed to send denial");
                    }
                }
                continue;
            }

            let (next, reply) =
                match commands::handle_message(&db, dialogue.clone(), &text).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::error!(error = %e, "Command handling failed");
                        (
                            Dialogue::Idle,
                            Some("❌ Internal error, please try again".to_string()),
                        )
                    }
                };
            dialogue = next;

            if let Some(reply) = reply {
                if let Err(e) = api.send_message(message.chat.id, &reply).await {
                    tracing::warn!(error = %e, "Failed to send reply");
                }
            }
        }
    }
}
