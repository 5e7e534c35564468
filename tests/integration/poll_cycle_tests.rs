use std::sync::Arc;
use std::time::Duration;

use restock_watcher::debug_capture::DebugCapture;
use restock_watcher::StockPoller;

use super::*;

#[tokio::test]
async fn test_marker_present_skips_notification() {
    let fetcher = Arc::new(
        StaticPageFetcher::new().with_page(SOLD_OUT_URL, "...NOTIFY ME WHEN AVAILABLE..."),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let settings = test_settings(vec![sold_out_item()]);
    let poller = StockPoller::new(settings, fetcher.clone(), notifier.clone());
    let report = poller.run_cycle().await;

    assert!(!report.results[0].in_stock);
    assert!(notifier.alerts().is_empty());
    assert_eq!(fetcher.calls().len(), 1);
}

#[tokio::test]
async fn test_marker_absent_notifies_with_url() {
    let fetcher = Arc::new(StaticPageFetcher::new().with_page(IN_STOCK_URL, "Add to cart"));
    let notifier = Arc::new(RecordingNotifier::default());

    let poller = StockPoller::new(test_settings(vec![in_stock_item()]), fetcher, notifier.clone());
    let report = poller.run_cycle().await;

    assert!(report.results[0].in_stock);
    let alerts = notifier.alerts();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].message.contains(IN_STOCK_URL));
    assert_eq!(alerts[0].item_name, "In Stock Box");
}

#[tokio::test]
async fn test_items_checked_in_order_each_cycle() {
    let fetcher = Arc::new(
        StaticPageFetcher::new()
            .with_page(SOLD_OUT_URL, "Notify me when available")
            .with_page(IN_STOCK_URL, "Add to cart"),
    );
    let notifier = Arc::new(RecordingNotifier::default());

    let poller = StockPoller::new(
        test_settings(vec![sold_out_item(), in_stock_item()]),
        fetcher.clone(),
        notifier.clone(),
    );
    poller.run_cycle().await;
    poller.run_cycle().await;

    assert_eq!(fetcher.calls(), vec![SOLD_OUT_URL, IN_STOCK_URL, SOLD_OUT_URL, IN_STOCK_URL]);
    // Status is recomputed every cycle, so the in-stock item alerts each time
    assert_eq!(notifier.alerts().len(), 2);
}

#[tokio::test]
async fn test_unreachable_page_retried_then_treated_as_sold_out() {
    let fetcher = Arc::new(StaticPageFetcher::new());
    let notifier = Arc::new(RecordingNotifier::default());

    let settings = test_settings(vec![in_stock_item()]);
    let poller = StockPoller::new(settings, fetcher.clone(), notifier.clone());
    let report = poller.run_cycle().await;

    assert_eq!(fetcher.calls().len(), 3);
    assert!(report.results[0].attempts_exhausted);
    assert!(!report.results[0].in_stock);
    assert!(notifier.alerts().is_empty());
}

#[tokio::test]
async fn test_sold_out_page_written_for_debugging() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher =
        Arc::new(StaticPageFetcher::new().with_page(SOLD_OUT_URL, "NOTIFY ME WHEN AVAILABLE"));
    let notifier = Arc::new(RecordingNotifier::default());
    let item = sold_out_item().with_debug_file("sold_out_debug.html");

    let poller = StockPoller::new(test_settings(vec![item]), fetcher, notifier)
        .with_debug_capture(Some(DebugCapture::new(dir.path())));
    let report = poller.run_cycle().await;

    let path = report.results[0].debug_file.clone().unwrap();
    assert_eq!(path, dir.path().join("sold_out_debug.html"));
    let saved = std::fs::read_to_string(path).unwrap();
    assert!(saved.contains("<p>NOTIFY ME WHEN AVAILABLE</p>"));
}

#[tokio::test(start_paused = true)]
async fn test_stop_signal_ends_loop() {
    let fetcher =
        Arc::new(StaticPageFetcher::new().with_page(SOLD_OUT_URL, "NOTIFY ME WHEN AVAILABLE"));
    let notifier = Arc::new(RecordingNotifier::default());

    let settings = test_settings(vec![sold_out_item()]);
    let handle = StockPoller::new(settings, fetcher.clone(), notifier).spawn();

    tokio::time::sleep(Duration::from_secs(30)).await;
    let stats = handle.stop().await.unwrap();

    assert_eq!(stats.cycles_completed, 1);
    assert_eq!(fetcher.calls().len(), 1);
}
