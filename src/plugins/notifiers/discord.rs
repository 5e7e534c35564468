use crate::config::DiscordConfig as DiscordSettings;
use crate::plugins::traits::{NotificationResult, Notifier, RestockAlert};
use crate::{AppError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub timeout: Duration,
}

impl DiscordConfig {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            username: None,
            avatar_url: None,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn from_app_config(config: &DiscordSettings) -> Result<Self> {
        let webhook_url = config
            .webhook_url
            .clone()
            .ok_or_else(|| AppError::Validation("Missing webhook_url".to_string()))?;

        if !webhook_url.starts_with("https://") && !webhook_url.starts_with("http://") {
            return Err(AppError::Validation("Invalid Discord webhook URL format".to_string()));
        }

        Ok(Self {
            webhook_url,
            username: config.username.clone(),
            avatar_url: config.avatar_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

/// Posts the alert text to a Discord webhook.
pub struct DiscordNotifier {
    client: Client,
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    pub fn from_config(config: &DiscordSettings) -> Result<Self> {
        Self::new(DiscordConfig::from_app_config(config)?)
    }

    fn create_webhook_payload(&self, alert: &RestockAlert) -> serde_json::Value {
        let mut payload = json!({
            "content": alert.message,
        });

        if let Some(username) = &self.config.username {
            payload["username"] = json!(username);
        }

        if let Some(avatar_url) = &self.config.avatar_url {
            payload["avatar_url"] = json!(avatar_url);
        }

        payload
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "Discord Notifier"
    }

    async fn notify(&self, alert: &RestockAlert) -> Result<NotificationResult> {
        let payload = self.create_webhook_payload(alert);

        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Notification(format!(
                "Discord webhook returned {}: {}",
                status,
                body.trim()
            )));
        }

        tracing::info!("Sent Discord alert for {}", alert.item_name);

        Ok(NotificationResult {
            success: true,
            message_id: Some(format!("discord-{}", alert.detected_at.timestamp())),
            error: None,
        })
    }
}
