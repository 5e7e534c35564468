pub mod traits;
pub mod notifiers;

use std::sync::Arc;

use crate::config::DiscordConfig;
use crate::Result;

pub use traits::{Notifier, NotificationResult, RestockAlert};

/// Picks the Discord webhook when one is configured, otherwise log-only alerts.
pub fn notifier_from_config(config: &DiscordConfig) -> Result<Arc<dyn Notifier>> {
    match &config.webhook_url {
        Some(_) => Ok(Arc::new(notifiers::DiscordNotifier::from_config(config)?)),
        None => {
            tracing::warn!("DISCORD_WEBHOOK_URL is not set; restock alerts will only be logged");
            Ok(Arc::new(notifiers::LogNotifier::new()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notifier_selection() {
        let log_only = notifier_from_config(&DiscordConfig::default()).unwrap();
        assert_eq!(log_only.name(), "Log Notifier");

        let config = DiscordConfig {
            webhook_url: Some("https://discord.com/api/webhooks/1/token".to_string()),
            ..DiscordConfig::default()
        };
        let discord = notifier_from_config(&config).unwrap();
        assert_eq!(discord.name(), "Discord Notifier");
    }
}
