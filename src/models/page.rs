use serde::{Deserialize, Serialize};

/// Text pulled from a rendered page for marker matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum PageContent {
    /// Texts of every element matching the item's selector, in document order.
    Elements(Vec<String>),
    /// Visible text of the whole body, used when the item has no selector.
    Body(String),
    /// The selector never appeared before the wait timed out.
    SelectorMissing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    pub content: PageContent,
    /// Raw markup of the page, kept for debug capture.
    pub html: Option<String>,
    pub response_time_ms: u64,
}

impl PageSnapshot {
    pub fn new(url: impl Into<String>, content: PageContent) -> Self {
        Self {
            url: url.into(),
            content,
            html: None,
            response_time_ms: 0,
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = Some(html.into());
        self
    }
}
