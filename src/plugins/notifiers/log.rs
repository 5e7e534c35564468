use crate::plugins::traits::{NotificationResult, Notifier, RestockAlert};
use crate::Result;
use async_trait::async_trait;

/// Dry-run notifier used when no webhook is configured.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "Log Notifier"
    }

    async fn notify(&self, alert: &RestockAlert) -> Result<NotificationResult> {
        tracing::info!("ALERT {}", alert.message.replace('\n', " "));
        Ok(NotificationResult {
            success: true,
            message_id: None,
            error: None,
        })
    }
}
