use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::config::ScraperConfig;
use crate::models::{PageContent, PageSnapshot, TrackedItem};
use crate::{AppError, Result};

/// Loads a tracked item's page and returns the text to match against.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, item: &TrackedItem) -> Result<PageSnapshot>;
}

/// A running browser that loads pages. Calls block.
pub trait BrowserSession: Send + 'static {
    fn load(&self, item: &TrackedItem) -> Result<PageSnapshot>;

    /// False once the browser process or its connection is gone.
    fn is_alive(&self) -> bool;
}

pub trait SessionLauncher: Send + Sync + 'static {
    type Session: BrowserSession;

    fn launch(&self) -> Result<Self::Session>;
}

/// Fetches through one reused browser session and relaunches it after the
/// session dies.
pub struct BrowserFetcher<L: SessionLauncher> {
    launcher: Arc<L>,
    session: Arc<Mutex<Option<L::Session>>>,
}

pub type ChromeFetcher = BrowserFetcher<ChromeLauncher>;

impl<L: SessionLauncher> BrowserFetcher<L> {
    /// Lazy: the first fetch launches the browser.
    pub fn new(launcher: L) -> Self {
        Self {
            launcher: Arc::new(launcher),
            session: Arc::new(Mutex::new(None)),
        }
    }

    /// Launches the browser up front so startup fails fast without one.
    pub fn start(launcher: L) -> Result<Self> {
        let session = launcher.launch()?;
        Ok(Self {
            launcher: Arc::new(launcher),
            session: Arc::new(Mutex::new(Some(session))),
        })
    }

    fn fetch_blocking(
        launcher: &L,
        slot: &Mutex<Option<L::Session>>,
        item: &TrackedItem,
    ) -> Result<PageSnapshot> {
        let mut slot = slot
            .lock()
            .map_err(|_| AppError::Internal("Browser session lock poisoned".to_string()))?;

        let session = match slot.take() {
            Some(session) => session,
            None => {
                tracing::info!("Launching headless browser");
                launcher.launch()?
            }
        };

        let result = session.load(item);
        if result.is_err() && !session.is_alive() {
            tracing::warn!("{}: browser session died, relaunching on next fetch", item.name);
        } else {
            *slot = Some(session);
        }

        result
    }
}

#[async_trait]
impl<L: SessionLauncher> PageFetcher for BrowserFetcher<L> {
    async fn fetch(&self, item: &TrackedItem) -> Result<PageSnapshot> {
        let launcher = Arc::clone(&self.launcher);
        let session = Arc::clone(&self.session);
        let item = item.clone();

        tokio::task::spawn_blocking(move || Self::fetch_blocking(&launcher, &session, &item))
            .await
            .map_err(|e| AppError::Internal(format!("Browser task failed: {}", e)))?
    }
}

impl ChromeFetcher {
    pub fn launch(config: &ScraperConfig, poll_interval: Duration) -> Result<Self> {
        Self::start(ChromeLauncher::new(config, poll_interval))
    }
}

/// Starts headless Chrome with one tab.
pub struct ChromeLauncher {
    config: ScraperConfig,
    idle_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &ScraperConfig, poll_interval: Duration) -> Self {
        Self {
            config: config.clone(),
            idle_timeout: idle_timeout_for(config, poll_interval),
        }
    }
}

/// Chrome drops its connection after this long without traffic, so it has to
/// outlast the pause between cycles plus a slow page load.
pub fn idle_timeout_for(config: &ScraperConfig, poll_interval: Duration) -> Duration {
    let busiest = config.navigation_timeout() + config.selector_timeout();
    ((poll_interval + busiest) * 2).max(Duration::from_secs(300))
}

impl SessionLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession> {
        let config = &self.config;
        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(false) // Often needed in containerized environments
            .idle_browser_timeout(self.idle_timeout)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| AppError::Browser(format!("Failed to create launch options: {}", e)))?;

        if let Some(chrome_path) = &config.chrome_path {
            launch_options.path = Some(std::path::PathBuf::from(chrome_path));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| AppError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| AppError::Browser(format!("Failed to create tab: {}", e)))?;

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| AppError::Browser(format!("Failed to set user agent: {}", e)))?;
        }

        tracing::info!("Headless browser ready");

        Ok(ChromeSession {
            browser,
            tab,
            navigation_timeout: config.navigation_timeout(),
            selector_timeout: config.selector_timeout(),
        })
    }
}

pub struct ChromeSession {
    // Dropping the browser kills the Chrome process, so it lives as long as the tab.
    browser: Browser,
    tab: Arc<Tab>,
    navigation_timeout: Duration,
    selector_timeout: Duration,
}

impl ChromeSession {
    fn page_content(&self) -> Result<String> {
        self.tab
            .get_content()
            .map_err(|e| AppError::Browser(format!("Failed to get page content: {}", e)))
    }
}

impl BrowserSession for ChromeSession {
    fn load(&self, item: &TrackedItem) -> Result<PageSnapshot> {
        let start_time = Instant::now();
        let tab = &self.tab;

        tab.set_default_timeout(self.navigation_timeout);
        tab.navigate_to(&item.url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| AppError::Navigation {
                url: item.url.clone(),
                message: e.to_string(),
            })?;

        let (content, html) = match &item.selector {
            Some(selector) => {
                match tab.wait_for_element_with_custom_timeout(selector, self.selector_timeout) {
                    Ok(_) => {
                        // Read after the wait so late-rendered elements are included
                        let rendered = self.page_content()?;
                        let texts = extract_element_texts(&rendered, selector)?;
                        (PageContent::Elements(texts), Some(rendered))
                    }
                    Err(e) => {
                        tracing::debug!(
                            "{}: selector '{}' did not appear: {}",
                            item.name,
                            selector,
                            e
                        );
                        (PageContent::SelectorMissing, tab.get_content().ok())
                    }
                }
            }
            None => {
                let rendered = self.page_content()?;
                (PageContent::Body(extract_body_text(&rendered)), Some(rendered))
            }
        };

        Ok(PageSnapshot {
            url: item.url.clone(),
            content,
            html,
            response_time_ms: start_time.elapsed().as_millis() as u64,
        })
    }

    fn is_alive(&self) -> bool {
        self.browser.get_version().is_ok()
    }
}

/// Texts of every element matching `selector`, trimmed, in document order.
pub fn extract_element_texts(html: &str, selector: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let css_selector = Selector::parse(selector).map_err(|e| AppError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })?;

    Ok(document
        .select(&css_selector)
        .map(|element| element.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .collect())
}

/// Visible text of the document body, without script and style contents.
pub fn extract_body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let body = Selector::parse("body").ok();

    let root = body
        .as_ref()
        .and_then(|selector| document.select(selector).next())
        .unwrap_or_else(|| document.root_element());

    let mut parts = Vec::new();
    for node in root.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element())
            .map(|element| matches!(element.name(), "script" | "style" | "noscript"))
            .unwrap_or(false);
        let text = text.trim();
        if !hidden && !text.is_empty() {
            parts.push(text);
        }
    }

    parts.join(" ")
}
