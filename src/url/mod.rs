//! URL handling module for Shelf-Harvest
//!
//! Catalogue pages link to their neighbours and items with relative hrefs.
//! This module resolves those against the page they appear on and normalizes
//! the result so the coordinator can spot duplicates and pagination cycles.

mod normalize;

pub use normalize::{normalize_parsed, normalize_url};

use url::Url;

/// Resolves a link href to a normalized absolute URL
///
/// Returns None if the link should be ignored:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that cannot be joined onto the base
/// - non-HTTP(S) results
///
/// # Example
///
/// ```
/// use shelf_harvest::url::resolve_link;
/// use url::Url;
///
/// let page = Url::parse("https://books.example/catalogue/page-1.html").unwrap();
/// let next = resolve_link("page-2.html", &page).unwrap();
/// assert_eq!(next.as_str(), "https://books.example/catalogue/page-2.html");
/// ```
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    normalize_parsed(absolute).ok()
}
