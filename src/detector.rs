use crate::models::{MarkerMatch, PageContent, TrackedItem};

/// Decides whether a listing looks purchasable.
///
/// The marker's presence means sold out; its absence, including a selector
/// that never rendered, is read as in stock. A page that failed to render
/// the marker for any other reason therefore also reads as in stock.
pub fn is_in_stock(content: &PageContent, item: &TrackedItem) -> bool {
    !marker_present(content, &item.marker, item.match_mode)
}

pub fn marker_present(content: &PageContent, marker: &str, mode: MarkerMatch) -> bool {
    let marker = marker.trim().to_lowercase();
    if marker.is_empty() {
        return false;
    }

    match content {
        PageContent::SelectorMissing => false,
        PageContent::Body(text) => text_matches(text, &marker, mode),
        PageContent::Elements(texts) => texts.iter().any(|text| text_matches(text, &marker, mode)),
    }
}

fn text_matches(text: &str, marker: &str, mode: MarkerMatch) -> bool {
    let text = text.to_lowercase();
    match mode {
        MarkerMatch::Contains => text.contains(marker),
        MarkerMatch::ExactElement => text.trim() == marker,
    }
}
