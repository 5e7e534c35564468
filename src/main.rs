use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use restock_watcher::debug_capture::DebugCapture;
use restock_watcher::plugins::notifier_from_config;
use restock_watcher::scraper::ChromeFetcher;
use restock_watcher::utils::logging;
use restock_watcher::{AppConfig, PollerSettings, StockPoller};

#[derive(Debug, Parser)]
#[command(
    name = "restock-watcher",
    version,
    about = "Watches product pages and alerts when they are back in stock"
)]
struct Cli {
    /// Extra configuration file layered over config/*.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run a single check cycle and exit
    #[arg(long)]
    once: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let _log_guard = logging::init(&config.logging)?;

    info!("Starting Restock Watcher...");

    let fetcher = ChromeFetcher::launch(&config.scraper, config.poller.interval())
        .context("Failed to start headless browser")?;
    let notifier = notifier_from_config(&config.notifications.discord)?;
    let settings = PollerSettings::from_config(&config);
    let poller = StockPoller::new(settings, Arc::new(fetcher), notifier)
        .with_debug_capture(DebugCapture::from_config(&config.debug));

    if cli.once {
        poller.run_once().await;
        return Ok(());
    }

    let handle = poller.spawn();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down, waiting for the current cycle to finish (Ctrl-C again to abort)...");

    let second_signal = async {
        tokio::signal::ctrl_c().await.ok();
    };
    let Some(stats) = handle.stop_unless(second_signal).await? else {
        warn!("Second interrupt received, abandoning the current cycle");
        std::process::exit(130);
    };
    info!(
        "Stopped after {} cycles in {}s, {} alerts sent",
        stats.cycles_completed,
        stats.uptime_seconds(),
        stats.notifications_sent
    );

    Ok(())
}
