// Integration tests for Restock Watcher
// These tests drive the poller through its public API with in-memory fakes

pub mod notification_tests;
pub mod poll_cycle_tests;

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

use restock_watcher::models::{PageContent, PageSnapshot, TrackedItem};
use restock_watcher::plugins::{NotificationResult, Notifier, RestockAlert};
use restock_watcher::retry::RetryPolicy;
use restock_watcher::scraper::{extract_body_text, PageFetcher};
use restock_watcher::{AppError, PollerSettings, Result};

/// Serves fixed markup per URL, parsed the same way the browser fetcher does.
pub struct StaticPageFetcher {
    pages: Vec<(String, String)>,
    calls: Mutex<Vec<String>>,
}

impl StaticPageFetcher {
    pub fn new() -> Self {
        Self {
            pages: Vec::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_page(mut self, url: &str, body_text: &str) -> Self {
        self.pages
            .push((url.to_string(), format!("<html><body><p>{}</p></body></html>", body_text)));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for StaticPageFetcher {
    async fn fetch(&self, item: &TrackedItem) -> Result<PageSnapshot> {
        self.calls.lock().unwrap().push(item.url.clone());

        let html = self
            .pages
            .iter()
            .find(|(url, _)| *url == item.url)
            .map(|(_, html)| html.clone())
            .ok_or_else(|| AppError::Navigation {
                url: item.url.clone(),
                message: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })?;

        let content = PageContent::Body(extract_body_text(&html));
        Ok(PageSnapshot::new(item.url.clone(), content).with_html(html))
    }
}

/// Records every alert it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<RestockAlert>>,
}

impl RecordingNotifier {
    pub fn alerts(&self) -> Vec<RestockAlert> {
        self.alerts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    fn name(&self) -> &str {
        "Recording Notifier"
    }

    async fn notify(&self, alert: &RestockAlert) -> Result<NotificationResult> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(NotificationResult {
            success: true,
            message_id: None,
            error: None,
        })
    }
}

pub const SOLD_OUT_URL: &str = "https://shop.example.com/products/sold-out";
pub const IN_STOCK_URL: &str = "https://shop.example.com/products/in-stock";

pub fn sold_out_item() -> TrackedItem {
    TrackedItem::new("Sold Out Box", SOLD_OUT_URL, "NOTIFY ME WHEN AVAILABLE")
}

pub fn in_stock_item() -> TrackedItem {
    TrackedItem::new("In Stock Box", IN_STOCK_URL, "NOTIFY ME WHEN AVAILABLE")
}

/// Test settings: no pause between retries, long interval between cycles.
pub fn test_settings(items: Vec<TrackedItem>) -> PollerSettings {
    PollerSettings {
        items,
        retry: RetryPolicy::new(3, Duration::ZERO),
        interval: Duration::from_secs(60),
    }
}
