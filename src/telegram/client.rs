use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::ChatDelivery;

/// Client for the Telegram Bot API `sendMessage` method.
#[derive(Clone)]
pub struct TelegramClient {
    http: Client,
    api_url: String,
    token: Option<String>,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(TelegramClient {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, token, method)
    }
}

#[async_trait]
impl ChatDelivery for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let token = self
            .token
            .as_deref()
            .context("TELEGRAM_BOT_TOKEN is not configured")?;

        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        debug!("Sending {} bytes to chat {}", text.len(), chat_id);
        let resp = self
            .http
            .post(self.method_url(token, "sendMessage"))
            .json(&body)
            .send()
            .await
            .context("Telegram request failed")?;

        if !resp.status().is_success() {
            let status = resp.status();
            let detail = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error {}: {}", status, detail);
        }

        info!("Message delivered to chat {}", chat_id);
        Ok(())
    }
}
