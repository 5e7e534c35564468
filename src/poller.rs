use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;
use crate::debug_capture::DebugCapture;
use crate::detector;
use crate::models::TrackedItem;
use crate::plugins::{Notifier, RestockAlert};
use crate::retry::{retry_or_default, RetryPolicy};
use crate::scraper::PageFetcher;
use crate::{AppError, Result};

/// Everything the poll loop needs from configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct PollerSettings {
    pub items: Vec<TrackedItem>,
    pub retry: RetryPolicy,
    pub interval: Duration,
}

impl PollerSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            items: config.items.clone(),
            retry: RetryPolicy::from(&config.retry),
            interval: config.poller.interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemCheckResult {
    pub item_name: String,
    pub url: String,
    pub in_stock: bool,
    /// Every fetch attempt failed; the item was treated as not in stock.
    pub attempts_exhausted: bool,
    pub notified: bool,
    pub notification_error: Option<String>,
    pub debug_file: Option<PathBuf>,
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub results: Vec<ItemCheckResult>,
    pub total_time_ms: u64,
}

impl CycleReport {
    pub fn restocks(&self) -> usize {
        self.results.iter().filter(|r| r.in_stock).count()
    }

    pub fn notifications_sent(&self) -> usize {
        self.results.iter().filter(|r| r.notified).count()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollerStats {
    pub cycles_completed: u64,
    pub checks_run: u64,
    pub restocks_detected: u64,
    pub notifications_sent: u64,
    pub notification_failures: u64,
    pub started_at: DateTime<Utc>,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl Default for PollerStats {
    fn default() -> Self {
        Self {
            cycles_completed: 0,
            checks_run: 0,
            restocks_detected: 0,
            notifications_sent: 0,
            notification_failures: 0,
            started_at: Utc::now(),
            last_cycle_at: None,
        }
    }
}

impl PollerStats {
    pub fn uptime_seconds(&self) -> u64 {
        Utc::now().signed_duration_since(self.started_at).num_seconds().max(0) as u64
    }
}

struct StockCheck {
    in_stock: bool,
    html: Option<String>,
    exhausted: bool,
}

impl StockCheck {
    fn exhausted() -> Self {
        Self {
            in_stock: false,
            html: None,
            exhausted: true,
        }
    }
}

/// Checks every tracked item in turn, alerts on restock, then waits for the next cycle.
pub struct StockPoller {
    settings: PollerSettings,
    fetcher: Arc<dyn PageFetcher>,
    notifier: Arc<dyn Notifier>,
    debug_capture: Option<DebugCapture>,
    stats: Arc<RwLock<PollerStats>>,
}

impl StockPoller {
    pub fn new(
        settings: PollerSettings,
        fetcher: Arc<dyn PageFetcher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            settings,
            fetcher,
            notifier,
            debug_capture: None,
            stats: Arc::new(RwLock::new(PollerStats::default())),
        }
    }

    pub fn with_debug_capture(mut self, debug_capture: Option<DebugCapture>) -> Self {
        self.debug_capture = debug_capture;
        self
    }

    pub async fn stats(&self) -> PollerStats {
        self.stats.read().await.clone()
    }

    /// Fetch, detect and, when in stock, notify for a single item.
    ///
    /// Fetch failures are retried per the retry policy and then read as sold
    /// out. A failed notification is logged and recorded, never propagated.
    pub async fn check_item(&self, item: &TrackedItem) -> ItemCheckResult {
        let start_time = Instant::now();
        tracing::info!("Checking {}...", item.name);

        let fetcher = &self.fetcher;
        let attempt = move || async move {
            let snapshot = fetcher.fetch(item).await?;
            tracing::debug!("{}: page loaded in {} ms", item.name, snapshot.response_time_ms);
            let in_stock = detector::is_in_stock(&snapshot.content, item);
            if in_stock {
                tracing::info!("{}: '{}' NOT found, assuming in stock", item.name, item.marker);
            } else {
                tracing::info!("{}: found '{}', sold out", item.name, item.marker);
            }
            Ok::<_, AppError>(StockCheck {
                in_stock,
                html: snapshot.html,
                exhausted: false,
            })
        };
        let check =
            retry_or_default(&self.settings.retry, &item.name, StockCheck::exhausted(), attempt)
                .await;

        let mut result = ItemCheckResult {
            item_name: item.name.clone(),
            url: item.url.clone(),
            in_stock: check.in_stock,
            attempts_exhausted: check.exhausted,
            notified: false,
            notification_error: None,
            debug_file: None,
            elapsed_ms: 0,
        };

        if check.in_stock {
            let alert = RestockAlert::for_item(item);
            match self.notifier.notify(&alert).await {
                Ok(_) => result.notified = true,
                Err(e) => {
                    tracing::error!("{}: failed to send restock alert: {}", item.name, e);
                    result.notification_error = Some(e.to_string());
                }
            }
        } else {
            tracing::info!("{}: still sold out", item.name);
            if let (Some(capture), Some(html)) = (&self.debug_capture, check.html.as_deref()) {
                match capture.save(item, html).await {
                    Ok(path) => result.debug_file = Some(path),
                    Err(e) => tracing::warn!("{}: failed to save debug markup: {}", item.name, e),
                }
            }
        }

        result.elapsed_ms = start_time.elapsed().as_millis() as u64;
        self.record_check(&result).await;
        result
    }

    /// One pass over all tracked items, sequentially.
    pub async fn run_cycle(&self) -> CycleReport {
        let start_time = Instant::now();
        let started_at = Utc::now();

        let mut results = Vec::with_capacity(self.settings.items.len());
        for item in &self.settings.items {
            results.push(self.check_item(item).await);
        }

        let cycle = {
            let mut stats = self.stats.write().await;
            stats.cycles_completed += 1;
            stats.last_cycle_at = Some(Utc::now());
            stats.cycles_completed
        };

        let report = CycleReport {
            cycle,
            started_at,
            results,
            total_time_ms: start_time.elapsed().as_millis() as u64,
        };

        tracing::info!(
            "Cycle {} finished in {} ms: {} of {} items in stock, {} alerts sent",
            report.cycle,
            report.total_time_ms,
            report.restocks(),
            report.results.len(),
            report.notifications_sent()
        );

        report
    }

    /// Single-run mode: one cycle, no waiting.
    pub async fn run_once(&self) -> CycleReport {
        self.run_cycle().await
    }

    /// Runs cycles until `cancel` fires. A cycle in progress finishes first.
    pub async fn run(&self, cancel: CancellationToken) {
        tracing::info!(
            "Stock poller started: {} items, every {}s",
            self.settings.items.len(),
            self.settings.interval.as_secs()
        );

        while !cancel.is_cancelled() {
            self.run_cycle().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.settings.interval) => {}
            }
        }

        tracing::info!("Stock poller stopped");
    }

    /// Moves the poller onto its own task and returns a handle to stop it.
    pub fn spawn(self) -> PollerHandle {
        let cancel = CancellationToken::new();
        let stats = Arc::clone(&self.stats);
        let token = cancel.clone();
        let join = tokio::spawn(async move { self.run(token).await });

        PollerHandle { cancel, join, stats }
    }

    async fn record_check(&self, result: &ItemCheckResult) {
        let mut stats = self.stats.write().await;
        stats.checks_run += 1;
        if result.in_stock {
            stats.restocks_detected += 1;
        }
        if result.notified {
            stats.notifications_sent += 1;
        }
        if result.notification_error.is_some() {
            stats.notification_failures += 1;
        }
    }
}

pub struct PollerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
    stats: Arc<RwLock<PollerStats>>,
}

impl PollerHandle {
    pub async fn stats(&self) -> PollerStats {
        self.stats.read().await.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Signals the loop to stop and waits for it to exit.
    pub async fn stop(self) -> Result<PollerStats> {
        self.cancel.cancel();
        self.join
            .await
            .map_err(|e| AppError::Internal(format!("Poller task failed: {}", e)))?;
        Ok(self.stats.read().await.clone())
    }

    /// Like [`stop`](Self::stop), but gives up on the running cycle once
    /// `interrupt` completes. Returns `None` when the cycle was abandoned.
    pub async fn stop_unless<F>(self, interrupt: F) -> Result<Option<PollerStats>>
    where
        F: Future<Output = ()>,
    {
        self.cancel.cancel();
        let mut join = self.join;

        tokio::select! {
            joined = &mut join => {
                joined.map_err(|e| AppError::Internal(format!("Poller task failed: {}", e)))?;
                Ok(Some(self.stats.read().await.clone()))
            }
            _ = interrupt => {
                join.abort();
                Ok(None)
            }
        }
    }
}
