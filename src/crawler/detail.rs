//! Detail page parser
//!
//! Reads the UPC from the product information table, the category from the
//! breadcrumb trail and the description paragraph from an item's own page.
//! Each field is optional on its own; a page carrying none of them is
//! reported as unrecognized so the coordinator can count the failure.

use crate::record::DetailFields;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DetailParseError {
    /// None of the product table, breadcrumb or description block was found
    #[error("page has no product table, breadcrumb or description")]
    Unrecognized,
}

/// Extracts UPC, category and description from an item's own page
///
/// A section missing from the page leaves its field empty. Only a page with
/// none of the three sections is rejected.
pub fn parse_detail(html: &str) -> Result<DetailFields, DetailParseError> {
    let document = Html::parse_document(html);

    let upc = extract_upc(&document);
    let category = extract_category(&document);
    let description = extract_description(&document);

    if upc.is_none() && category.is_none() && description.is_none() {
        return Err(DetailParseError::Unrecognized);
    }

    Ok(DetailFields {
        upc: upc.unwrap_or_default(),
        category: category.unwrap_or_default(),
        description: description.unwrap_or_default(),
    })
}

fn collapsed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().split_whitespace().collect::<Vec<_>>().join(" ")
}

/// `Some("")` when the table exists without a UPC row
fn extract_upc(document: &Html) -> Option<String> {
    let rows = Selector::parse("table tr").ok()?;
    let th = Selector::parse("th").ok()?;
    let td = Selector::parse("td").ok()?;

    let mut saw_table = false;
    for row in document.select(&rows) {
        let Some(label) = row.select(&th).next() else {
            continue;
        };
        saw_table = true;
        if collapsed_text(label).eq_ignore_ascii_case("UPC") {
            return Some(row.select(&td).next().map(collapsed_text).unwrap_or_default());
        }
    }

    saw_table.then(String::new)
}

fn extract_category(document: &Html) -> Option<String> {
    let breadcrumb = Selector::parse("ul.breadcrumb").ok()?;
    let links = Selector::parse("a").ok()?;

    let crumbs = document.select(&breadcrumb).next()?;
    Some(crumbs.select(&links).last().map(collapsed_text).unwrap_or_default())
}

fn extract_description(document: &Html) -> Option<String> {
    let block = Selector::parse("#product_description").ok()?;
    let paragraph = Selector::parse("#product_description ~ p").ok()?;

    document.select(&block).next()?;
    let text = document
        .select(&paragraph)
        .next()
        .map(|p| {
            p.text()
                .collect::<String>()
                .lines()
                .map(str::trim)
                .collect::<Vec<_>>()
                .join("\n")
                .trim()
                .to_string()
        })
        .unwrap_or_default();
    Some(text)
}
