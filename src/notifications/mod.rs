//! Alert delivery for Solwatch
//!
//! One alert per newly discovered recipient wallet, pushed to the operator
//! chat. Delivery is best effort; the polling task only records a recipient
//! as notified after the channel reports success.

pub mod telegram;

pub use telegram::TelegramNotifier;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use rust_decimal::Decimal;

/// One qualifying transfer, ready to be announced
#[derive(Debug, Clone)]
pub struct TransferAlert {
    /// Newly discovered recipient wallet
    pub recipient: String,
    /// Transfer amount in SOL
    pub amount_sol: Decimal,
    /// Watched source the transfer came from
    pub source: String,
    /// Unix timestamp of the transaction (block time, or receipt time when
    /// the ledger omits it)
    pub timestamp: i64,
    /// UTC offset for rendering the timestamp
    pub utc_offset_hours: i32,
}

impl TransferAlert {
    /// Format the alert message sent to the operator
    pub fn format_message(&self) -> String {
        let offset = FixedOffset::east_opt(self.utc_offset_hours.saturating_mul(3600))
            .unwrap_or_else(|| Utc.fix());
        let local: DateTime<FixedOffset> = DateTime::from_timestamp(self.timestamp, 0)
            .unwrap_or_else(Utc::now)
            .with_timezone(&offset);

        format!(
            "🔥 New wallet detected!\n\
             • Wallet: `{}`\n\
             • First deposit: {:.6} SOL\n\
             • From source: `{}`\n\
             • Time: {}",
            self.recipient,
            self.amount_sol,
            self.source,
            local.format("%Y-%m-%d %H:%M:%S UTC%:z")
        )
    }
}

/// Alert delivery channel
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert; Ok means the operator received it
    async fn send_alert(&self, alert: &TransferAlert) -> anyhow::Result<()>;

    /// Check if the channel is configured and usable
    fn is_enabled(&self) -> bool;
}
