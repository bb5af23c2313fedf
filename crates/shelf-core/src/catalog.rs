//! # Catalog View Model
//!
//! Decides what the book list shows and whether a fetched catalog should be
//! dispatched into shared state.
//!
//! ## Source Selection
//! ```text
//! filtered non-empty ──────────────► render filtered      (query skipped)
//! filtered empty, fetched non-empty ► render fetched
//! both empty ──────────────────────► "Uh oh, we don't have that in stock..."
//! ```
//!
//! The fetched list is what renders on the fallback path. Rendering only the
//! filtered list there would leave an unfiltered catalog permanently blank.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::Book;

pub const CATALOG_HEADING: &str = "Our Books:";
pub const OUT_OF_STOCK_MESSAGE: &str = "Uh oh, we don't have that in stock right now.";

/// One book tile in the list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BookCard {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    /// Never empty.
    pub image: String,
    pub price: Money,
    pub quantity: Option<i64>,
}

impl From<&Book> for BookCard {
    fn from(book: &Book) -> Self {
        BookCard {
            id: book.id.clone(),
            name: book.name.clone(),
            image: book.display_image().to_string(),
            price: book.price,
            quantity: book.quantity,
        }
    }
}

/// Where the rendered items came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CatalogSource {
    Filtered,
    Fetched,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CatalogView {
    pub heading: String,
    pub source: CatalogSource,
    pub items: Vec<BookCard>,
    /// Set only when there is nothing to show.
    pub message: Option<String>,
    /// A catalog fetch is outstanding.
    pub loading: bool,
}

impl CatalogView {
    pub fn is_out_of_stock(&self) -> bool {
        self.source == CatalogSource::Empty
    }
}

/// Builds the catalog view from the parent's filtered list and the fetched
/// catalog (if any).
pub fn render_catalog(filtered: &[Book], fetched: Option<&[Book]>, loading: bool) -> CatalogView {
    let (source, books): (CatalogSource, &[Book]) = if !filtered.is_empty() {
        (CatalogSource::Filtered, filtered)
    } else {
        match fetched {
            Some(books) if !books.is_empty() => (CatalogSource::Fetched, books),
            _ => (CatalogSource::Empty, &[][..]),
        }
    };

    CatalogView {
        heading: CATALOG_HEADING.to_string(),
        source,
        items: books.iter().map(BookCard::from).collect(),
        message: (source == CatalogSource::Empty).then(|| OUT_OF_STOCK_MESSAGE.to_string()),
        loading,
    }
}

// =============================================================================
// Dispatch Guard
// =============================================================================

/// Identity of a fetched catalog payload.
pub fn payload_fingerprint(books: &[Book]) -> u64 {
    let mut hasher = DefaultHasher::new();
    books.hash(&mut hasher);
    hasher.finish()
}

/// Idempotency check in front of the `UpdateBooks` dispatch.
///
/// Tracks the last observed `(payload fingerprint, filtered length)` pair.
/// A dispatch is allowed only when that pair changed and no filtered list is
/// being shown.
#[derive(Debug, Clone, Default)]
pub struct FetchGuard {
    last_seen: Option<(u64, usize)>,
}

impl FetchGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_dispatch(&mut self, fingerprint: u64, filtered_len: usize) -> bool {
        let key = (fingerprint, filtered_len);
        if self.last_seen == Some(key) {
            return false;
        }
        self.last_seen = Some(key);
        filtered_len == 0
    }

    pub fn reset(&mut self) {
        self.last_seen = None;
    }
}
