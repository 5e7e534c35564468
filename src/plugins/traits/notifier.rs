use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::TrackedItem;
use crate::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockAlert {
    pub item_name: String,
    pub url: String,
    pub message: String,
    pub detected_at: DateTime<Utc>,
}

impl RestockAlert {
    pub fn for_item(item: &TrackedItem) -> Self {
        Self {
            item_name: item.name.clone(),
            url: item.url.clone(),
            message: item.restock_message(),
            detected_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// Delivers restock alerts to an external endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Sends the alert once. Delivery is not retried.
    async fn notify(&self, alert: &RestockAlert) -> Result<NotificationResult>;
}
