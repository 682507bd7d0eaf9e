//! Discord webhook notifier.
//!
//! Delivery failure is never fatal: by the time a notification is attempted
//! the selection is already persisted, so the caller logs and moves on.

use crate::error::NotifyError;
use serde::Serialize;

/// Notifier that posts messages to a Discord webhook
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

/// Webhook payload shape
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
}

impl DiscordNotifier {
    /// Create a notifier for a webhook URL
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url: webhook_url.into(),
        }
    }

    /// Post one message to the webhook
    pub async fn send(&self, content: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookPayload { content })
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        Ok(())
    }
}
