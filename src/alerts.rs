//! Best-effort chat alerts
//!
//! Posts short messages to a Telegram bot when `TELEGRAM_BOT_TOKEN` and
//! `TELEGRAM_CHAT_ID` are set. Delivery failures are logged at debug and never
//! reach the governor.

use crate::strike::{StrikeAttempt, StrikeOutcome};
use crate::Result;
use alloy::primitives::utils::format_ether;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const TELEGRAM_BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const TELEGRAM_CHAT_ID_ENV: &str = "TELEGRAM_CHAT_ID";

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Webhook alert sink
pub struct AlertSink {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl AlertSink {
    /// Build from the environment; `None` when alerts are not configured
    pub fn from_env() -> Option<Self> {
        let token = std::env::var(TELEGRAM_BOT_TOKEN_ENV).ok()?;
        let chat_id = std::env::var(TELEGRAM_CHAT_ID_ENV).ok()?;
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            return None;
        }
        Some(Self::new(
            format!("https://api.telegram.org/bot{}/sendMessage", token.trim()),
            chat_id.trim(),
        ))
    }

    pub fn new(endpoint: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_default();
        Self {
            client,
            endpoint: endpoint.into(),
            chat_id: chat_id.into(),
        }
    }

    /// Deliver one message and wait for the response
    pub async fn send(&self, text: &str) -> Result<()> {
        self.client
            .post(&self.endpoint)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Fire and forget
    pub fn notify(self: &Arc<Self>, text: String) {
        let sink = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = sink.send(&text).await {
                tracing::debug!(error = %e, "Alert delivery failed");
            }
        });
    }
}

/// Startup summary, naming any network that failed to come online
pub fn startup_message(online: usize, offline: &[&str]) -> String {
    if offline.is_empty() {
        format!("governor online: {} networks hunting", online)
    } else {
        format!(
            "governor online: {} networks hunting, offline: {}",
            online,
            offline.join(", ")
        )
    }
}

/// Alert text for attempts worth a message; routine skips produce none
pub fn describe(attempt: &StrikeAttempt) -> Option<String> {
    let metrics = attempt.metrics.as_ref();
    match &attempt.outcome {
        StrikeOutcome::Broadcast { tx_hash } => Some(format!(
            "[{}] strike sent {} | premium {} | amount {}",
            attempt.network,
            tx_hash,
            metrics.map(|m| format_ether(m.premium)).unwrap_or_default(),
            metrics
                .map(|m| format_ether(m.trade_amount))
                .unwrap_or_default(),
        )),
        StrikeOutcome::BroadcastFailed { error } => Some(format!(
            "[{}] broadcast failed: {}",
            attempt.network, error
        )),
        _ => None,
    }
}
