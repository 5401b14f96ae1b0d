//! Catalogue record types
//!
//! A [`Record`] is produced by the listing parser with its summary fields and
//! may later receive [`DetailFields`] from the item's own page. Once the
//! coordinator appends it to the crawl state it is never touched again.

mod price;
mod rating;

pub use price::{parse_amount, Price, MISSING_PRICE};
pub use rating::Rating;

/// Title used when a listing entry has neither a title attribute nor link text
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// One catalogue item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub title: String,
    pub price: Price,
    pub rating: Rating,

    /// Units in stock; 0 when out of stock or not stated
    pub availability: u32,

    /// Absolute address of the item's detail page
    pub detail_url: String,

    /// Present only after a successful deep-mode enrichment
    pub detail: Option<DetailFields>,
}

/// Fields only available on an item's detail page
///
/// Sections missing from the page are empty strings; the struct as a whole is
/// either attached to a record or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailFields {
    pub upc: String,
    pub category: String,
    pub description: String,
}

impl Record {
    /// Returns a copy of this record carrying the given detail fields
    pub fn with_detail(mut self, detail: DetailFields) -> Self {
        self.detail = Some(detail);
        self
    }

    /// True when any summary field had to fall back to a sentinel
    pub fn is_degraded(&self) -> bool {
        self.title == UNKNOWN_TITLE || !self.price.is_parsed() || self.rating.is_unknown()
    }

    pub fn upc(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.upc.as_str())
    }

    pub fn category(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.category.as_str())
    }

    pub fn description(&self) -> Option<&str> {
        self.detail.as_ref().map(|d| d.description.as_str())
    }
}
