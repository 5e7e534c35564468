use serde::{Deserialize, Serialize};

pub const POP_MART_URL: &str =
    "https://www.popmart.com/gb/products/641/THE-MONSTERS---Exciting-Macaron-Vinyl-Face-Blind-Box";
pub const ALIEXPRESS_URL: &str = "https://www.aliexpress.com/item/1005007966229736.html";

/// How the sold-out marker is compared against the fetched text.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMatch {
    /// Marker appears anywhere in the text, ignoring case.
    #[default]
    Contains,
    /// Some matched element's trimmed text is exactly the marker, ignoring case.
    ExactElement,
}

/// One monitored listing. Built from configuration at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrackedItem {
    pub name: String,
    pub url: String,
    /// CSS selector for the element carrying the marker. `None` searches the page body.
    #[serde(default)]
    pub selector: Option<String>,
    pub marker: String,
    #[serde(default)]
    pub match_mode: MarkerMatch,
    /// File name for the raw markup written when the item is confirmed sold out.
    #[serde(default)]
    pub debug_file: Option<String>,
}

impl TrackedItem {
    pub fn new(name: impl Into<String>, url: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            selector: None,
            marker: marker.into(),
            match_mode: MarkerMatch::Contains,
            debug_file: None,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn with_match_mode(mut self, match_mode: MarkerMatch) -> Self {
        self.match_mode = match_mode;
        self
    }

    pub fn with_debug_file(mut self, debug_file: impl Into<String>) -> Self {
        self.debug_file = Some(debug_file.into());
        self
    }

    /// Debug file name, falling back to a slug of the item name.
    pub fn debug_file_name(&self) -> String {
        match &self.debug_file {
            Some(file) => file.clone(),
            None => format!("{}_debug.html", slugify(&self.name)),
        }
    }

    /// Alert text sent when the item comes back in stock.
    pub fn restock_message(&self) -> String {
        format!("🔔 {} restock detected!\n{}", self.name, self.url)
    }

    pub fn pop_mart() -> Self {
        Self::new("Pop Mart", POP_MART_URL, "NOTIFY ME WHEN AVAILABLE")
            .with_selector("div.index_btn__w5nKF.index_black__RgEgP.index_btnFull__F7k90")
            .with_debug_file("popmart_debug.html")
    }

    pub fn aliexpress() -> Self {
        Self::new("AliExpress", ALIEXPRESS_URL, "find similar items")
            .with_selector("button.find-similar--findsimilar--dgsA7rv, span")
            .with_match_mode(MarkerMatch::ExactElement)
            .with_debug_file("aliexpress_debug.html")
    }

    pub fn defaults() -> Vec<Self> {
        vec![Self::pop_mart(), Self::aliexpress()]
    }
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_').to_string();
    if slug.is_empty() { "item".to_string() } else { slug }
}
