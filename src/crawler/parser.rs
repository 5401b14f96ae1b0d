//! Listing page parser
//!
//! Turns one catalogue listing page into summary [`Record`]s plus the address
//! of the next listing page. Every field extractor is total: a missing or
//! malformed field yields a sentinel value and marks the item as degraded,
//! it never fails the page.

use crate::record::{Price, Rating, Record, UNKNOWN_TITLE};
use crate::url::resolve_link;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use url::Url;

/// What a listing page yielded
#[derive(Debug, Clone, Default)]
pub struct ListingPage {
    /// Items in document order
    pub records: Vec<Record>,

    /// Next listing page, if the page links to one
    pub next_page: Option<Url>,

    /// Items emitted with at least one sentinel field
    pub degraded: u32,

    /// Items dropped because they had no detail link
    pub skipped: u32,
}

struct ListingSelectors {
    item: Selector,
    title_link: Selector,
    any_link: Selector,
    price: Selector,
    rating: Selector,
    availability: Selector,
    next: Selector,
}

impl ListingSelectors {
    fn new() -> Option<Self> {
        Some(Self {
            item: Selector::parse("article.product_pod").ok()?,
            title_link: Selector::parse("h3 a").ok()?,
            any_link: Selector::parse("a[href]").ok()?,
            price: Selector::parse("p.price_color").ok()?,
            rating: Selector::parse("p.star-rating").ok()?,
            availability: Selector::parse("p.availability").ok()?,
            next: Selector::parse("li.next a[href]").ok()?,
        })
    }
}

/// Parses a listing page
///
/// # Extraction Rules
///
/// | Field | Source | Fallback |
/// |-------|--------|----------|
/// | title | `h3 a[title]`, else link text | "Unknown Title" (degraded) |
/// | detail link | `h3 a[href]`, else first `a[href]` | item skipped |
/// | price | `p.price_color` text | "N/A", amount None (degraded) |
/// | rating | `p.star-rating` class word | Unknown (degraded) |
/// | availability | "(N available)" in `p.availability` | 0 |
/// | next page | `li.next a[href]` | None |
///
/// # Arguments
///
/// * `html` - The listing page body
/// * `page_url` - Address the page was fetched from, for resolving links
pub fn parse_listing(html: &str, page_url: &Url) -> ListingPage {
    let Some(sel) = ListingSelectors::new() else {
        return ListingPage::default();
    };
    let document = Html::parse_document(html);
    let mut page = ListingPage::default();

    for item in document.select(&sel.item) {
        let Some(detail_url) = extract_detail_url(item, &sel, page_url) else {
            tracing::warn!("Skipping listing item without a detail link on {}", page_url);
            page.skipped += 1;
            continue;
        };

        let (availability, stock_degraded) = extract_availability(item, &sel);
        let record = Record {
            title: extract_title(item, &sel),
            price: extract_price(item, &sel),
            rating: extract_rating(item, &sel),
            availability,
            detail_url: detail_url.to_string(),
            detail: None,
        };

        if record.is_degraded() || stock_degraded {
            tracing::debug!("Degraded listing item: {}", record.detail_url);
            page.degraded += 1;
        }
        page.records.push(record);
    }

    page.next_page = document
        .select(&sel.next)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve_link(href, page_url));

    page
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_title(item: ElementRef<'_>, sel: &ListingSelectors) -> String {
    let Some(link) = item.select(&sel.title_link).next() else {
        return UNKNOWN_TITLE.to_string();
    };

    let from_attr = link.value().attr("title").map(str::trim).unwrap_or("");
    if !from_attr.is_empty() {
        return from_attr.to_string();
    }

    let from_text = text_of(link);
    if from_text.is_empty() {
        UNKNOWN_TITLE.to_string()
    } else {
        from_text
    }
}

fn extract_detail_url(item: ElementRef<'_>, sel: &ListingSelectors, page_url: &Url) -> Option<Url> {
    item.select(&sel.title_link)
        .chain(item.select(&sel.any_link))
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve_link(href, page_url))
}

fn extract_price(item: ElementRef<'_>, sel: &ListingSelectors) -> Price {
    item.select(&sel.price)
        .next()
        .map(text_of)
        .filter(|text| !text.is_empty())
        .map(|text| Price::parse(&text))
        .unwrap_or_else(Price::missing)
}

fn extract_rating(item: ElementRef<'_>, sel: &ListingSelectors) -> Rating {
    item.select(&sel.rating)
        .next()
        .map(|p| Rating::from_class_tokens(p.value().classes()))
        .unwrap_or(Rating::Unknown)
}

fn stock_count_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"(?i)\(?\s*(\d+)\s+available").ok())
        .as_ref()
}

/// Returns the unit count and whether it had to be guessed
fn extract_availability(item: ElementRef<'_>, sel: &ListingSelectors) -> (u32, bool) {
    let Some(element) = item.select(&sel.availability).next() else {
        return (0, false);
    };
    let phrase = text_of(element);
    if phrase.is_empty() {
        return (0, false);
    }

    if let Some(count) = stock_count_pattern()
        .and_then(|re| re.captures(&phrase))
        .and_then(|caps| caps.get(1))
    {
        return match count.as_str().parse::<u32>() {
            Ok(n) => (n, false),
            Err(_) => (0, true),
        };
    }

    if phrase.to_ascii_lowercase().contains("out of stock") {
        (0, false)
    } else {
        // "In stock" without a count
        (0, true)
    }
}
