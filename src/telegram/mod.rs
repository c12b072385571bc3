pub mod client;
pub mod format;

pub use client::TelegramClient;
pub use format::format_predictions;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use tracing::error;

/// Anything that can deliver a text message to a chat.
#[async_trait]
pub trait ChatDelivery: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Per-chat result of a broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryOutcome {
    pub chat_id: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Send `text` to each chat in order. A failed chat does not stop the rest
/// and nothing is retried.
pub async fn broadcast(
    delivery: &dyn ChatDelivery,
    chat_ids: &[String],
    text: &str,
) -> Vec<DeliveryOutcome> {
    let mut outcomes = Vec::with_capacity(chat_ids.len());
    for chat_id in chat_ids {
        let outcome = match delivery.send_message(chat_id, text).await {
            Ok(()) => DeliveryOutcome {
                chat_id: chat_id.clone(),
                delivered: true,
                error: None,
            },
            Err(e) => {
                error!("Failed to send to chat {}: {:#}", chat_id, e);
                DeliveryOutcome {
                    chat_id: chat_id.clone(),
                    delivered: false,
                    error: Some(e.to_string()),
                }
            }
        };
        outcomes.push(outcome);
    }
    outcomes
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Records every message; chats listed in `failing` are rejected.
    #[derive(Default)]
    pub(crate) struct RecordingDelivery {
        pub failing: Vec<String>,
        pub sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl ChatDelivery for RecordingDelivery {
        async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
            if self.failing.iter().any(|c| c == chat_id) {
                anyhow::bail!("chat not found");
            }
            self.sent
                .lock()
                .unwrap()
                .push((chat_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_broadcast_continues_after_failure() {
        let delivery = RecordingDelivery {
            failing: vec!["-100".into()],
            ..Default::default()
        };
        let chats = vec!["1".to_string(), "-100".to_string(), "2".to_string()];
        let outcomes = broadcast(&delivery, &chats, "hola").await;

        let delivered: Vec<bool> = outcomes.iter().map(|o| o.delivered).collect();
        assert_eq!(delivered, vec![true, false, true]);
        assert_eq!(outcomes[1].error.as_deref(), Some("chat not found"));

        let sent = delivery.sent.lock().unwrap();
        let ids: Vec<&str> = sent.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }
}
