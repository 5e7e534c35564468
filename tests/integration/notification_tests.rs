use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use restock_watcher::config::DiscordConfig;
use restock_watcher::plugins::notifier_from_config;
use restock_watcher::StockPoller;

use super::*;

fn discord_config(server: &MockServer) -> DiscordConfig {
    DiscordConfig {
        webhook_url: Some(format!("{}/api/webhooks/42/token", server.uri())),
        username: Some("Restock Watcher".to_string()),
        ..DiscordConfig::default()
    }
}

#[tokio::test]
async fn test_restock_delivered_to_webhook() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/webhooks/42/token"))
        .and(body_string_contains("In Stock Box restock detected!"))
        .and(body_string_contains(IN_STOCK_URL))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = notifier_from_config(&discord_config(&server)).unwrap();
    let fetcher = Arc::new(StaticPageFetcher::new().with_page(IN_STOCK_URL, "Add to cart"));

    let poller = StockPoller::new(test_settings(vec![in_stock_item()]), fetcher, notifier);
    let report = poller.run_cycle().await;

    assert!(report.results[0].notified);
    assert!(report.results[0].notification_error.is_none());
}

#[tokio::test]
async fn test_sold_out_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;

    let notifier = notifier_from_config(&discord_config(&server)).unwrap();
    let fetcher = Arc::new(
        StaticPageFetcher::new().with_page(SOLD_OUT_URL, "...NOTIFY ME WHEN AVAILABLE..."),
    );

    let poller = StockPoller::new(test_settings(vec![sold_out_item()]), fetcher, notifier);
    let report = poller.run_cycle().await;

    assert_eq!(report.notifications_sent(), 0);
}

#[tokio::test]
async fn test_webhook_failure_logged_and_cycle_continues() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "Internal Server Error" })),
        )
        .expect(2)
        .mount(&server)
        .await;

    let second =
        TrackedItem::new("Second Box", "https://shop.example.com/products/second", "Sold out");
    let notifier = notifier_from_config(&discord_config(&server)).unwrap();
    let fetcher = Arc::new(
        StaticPageFetcher::new()
            .with_page(IN_STOCK_URL, "Add to cart")
            .with_page("https://shop.example.com/products/second", "Buy now"),
    );

    let poller = StockPoller::new(test_settings(vec![in_stock_item(), second]), fetcher, notifier);
    let report = poller.run_cycle().await;

    assert_eq!(report.results.len(), 2);
    assert!(report.results.iter().all(|r| r.in_stock && !r.notified));
    assert!(report.results[0].notification_error.as_deref().unwrap().contains("500"));

    let stats = poller.stats().await;
    assert_eq!(stats.notification_failures, 2);
    assert_eq!(stats.notifications_sent, 0);
}
