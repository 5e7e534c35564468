use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::models::TrackedItem;

const REDACTED: &str = "<redacted>";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scraper: ScraperConfig,
    pub retry: RetryConfig,
    pub poller: PollerConfig,
    pub notifications: NotificationsConfig,
    pub debug: DebugConfig,
    pub logging: LoggingConfig,
    pub items: Vec<TrackedItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub chrome_path: Option<String>,
    pub headless: bool,
    pub user_agent: Option<String>,
    pub navigation_timeout_secs: u64,
    pub selector_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub delay_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub interval_secs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub discord: DiscordConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordConfig {
    pub webhook_url: Option<String>,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
    pub directory: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for a daily-rolling log file, in addition to stdout.
    pub directory: Option<String>,
    pub filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            scraper: ScraperConfig::default(),
            retry: RetryConfig::default(),
            poller: PollerConfig::default(),
            notifications: NotificationsConfig::default(),
            debug: DebugConfig::default(),
            logging: LoggingConfig::default(),
            items: TrackedItem::defaults(),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            headless: true,
            user_agent: None,
            navigation_timeout_secs: 60,
            selector_timeout_secs: 10,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay_secs: 3,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: None,
            avatar_url: None,
            timeout_secs: 10,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: ".".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            filter: "restock_watcher=info".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    pub fn selector_timeout(&self) -> Duration {
        Duration::from_secs(self.selector_timeout_secs)
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl AppConfig {
    /// Layers the config files, an optional extra file and `RESTOCK__*`
    /// environment variables over the built-in defaults.
    pub fn load(extra_file: Option<&Path>) -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, ignored by git
            .add_source(File::with_name("config/local").required(false));

        if let Some(path) = extra_file {
            builder = builder.add_source(File::from(path));
        }

        let s = builder
            .add_source(Environment::with_prefix("RESTOCK").separator("__"))
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_env_fallbacks();
        config.validate()?;
        Ok(config)
    }

    /// The webhook credential and browser path keep their conventional
    /// variable names when the config layers leave them unset.
    fn apply_env_fallbacks(&mut self) {
        if self.notifications.discord.webhook_url.is_none() {
            self.notifications.discord.webhook_url =
                env::var("DISCORD_WEBHOOK_URL").ok().filter(|url| !url.trim().is_empty());
        }

        if self.scraper.chrome_path.is_none() {
            self.scraper.chrome_path = env::var("CHROME_PATH").ok();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items.is_empty() {
            return Err(ConfigError::Message("At least one tracked item is required".into()));
        }

        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(ConfigError::Message("Tracked item name must not be empty".into()));
            }

            if !is_http_url(&item.url) {
                return Err(ConfigError::Message(format!(
                    "Invalid URL for item '{}': {}",
                    item.name, item.url
                )));
            }

            if item.marker.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "Marker for item '{}' must not be empty",
                    item.name
                )));
            }

            if let Some(selector) = &item.selector {
                if scraper::Selector::parse(selector).is_err() {
                    return Err(ConfigError::Message(format!(
                        "Invalid CSS selector for item '{}': {}",
                        item.name, selector
                    )));
                }
            }
        }

        if self.retry.attempts == 0 {
            return Err(ConfigError::Message("Retry attempts must be greater than 0".into()));
        }

        if self.poller.interval_secs == 0 {
            return Err(ConfigError::Message(
                "Poller interval_secs must be greater than 0".into(),
            ));
        }

        if self.scraper.navigation_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Scraper navigation_timeout_secs must be greater than 0".into(),
            ));
        }

        if self.scraper.selector_timeout_secs == 0 {
            return Err(ConfigError::Message(
                "Scraper selector_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(webhook_url) = &self.notifications.discord.webhook_url {
            if !is_http_url(webhook_url) {
                return Err(ConfigError::Message("Invalid Discord webhook URL format".into()));
            }
        }

        if self.notifications.discord.timeout_secs == 0 {
            return Err(ConfigError::Message("Discord timeout_secs must be greater than 0".into()));
        }

        if self.debug.enabled && self.debug.directory.trim().is_empty() {
            return Err(ConfigError::Message(
                "Debug directory must not be empty when debug capture is enabled".into(),
            ));
        }

        Ok(())
    }

    /// Effective configuration as TOML, with the webhook URL masked.
    pub fn to_toml(&self) -> crate::Result<String> {
        let mut shown = self.clone();
        if shown.notifications.discord.webhook_url.is_some() {
            shown.notifications.discord.webhook_url = Some(REDACTED.to_string());
        }
        Ok(toml::to_string_pretty(&shown)?)
    }
}

fn is_http_url(raw: &str) -> bool {
    match Url::parse(raw) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}
