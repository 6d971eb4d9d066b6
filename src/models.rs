//! Data models for listing items and crawled articles.
//!
//! - [`ArticleLink`]: one item read from a category page, before year gating
//! - [`ArticleRecord`]: the persisted article, one JSON document per file
//! - [`CollectMethod`]: which listing layout the collector walks
//! - [`CrawlSummary`]: counters reported at the end of a crawl run

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A listing item as read from a category page.
///
/// Both fields are optional: an item may carry a date but no usable link (it
/// still takes part in year gating), or a link with no parseable date (it is
/// skipped).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleLink {
    /// Absolute article URL.
    pub url: Option<String>,
    /// Publication year inferred from the item's date field.
    pub year: Option<i32>,
}

/// A crawled article, serialized as-is into `<index>.json`.
///
/// ```json
/// {
///     "url": "https://znews.vn/...",
///     "title": "...",
///     "content": "summary\nparagraph 1\nparagraph 2",
///     "metadata": { "images": [ { "url": "a.jpg, b.jpg", "caption": "..." } ] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleRecord {
    pub url: String,
    pub title: String,
    /// Summary line followed by the body paragraphs, newline-joined.
    pub content: String,
    pub metadata: ArticleMetadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ArticleMetadata {
    pub images: Vec<ImageRecord>,
}

/// One captioned photo block.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ImageRecord {
    /// Every image source in the block, joined with `", "`.
    pub url: String,
    pub caption: String,
}

/// Listing layout walked by the link collector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CollectMethod {
    /// `#news-latest` list items; stops at the first item older than the
    /// target year.
    #[default]
    Scroll,
    /// Any `<article>` element on the page; older items are only skipped.
    Article,
}

impl fmt::Display for CollectMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectMethod::Scroll => f.write_str("scroll"),
            CollectMethod::Article => f.write_str("article"),
        }
    }
}

/// Outcome of one crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    /// Links handed to the crawler before the cap was hit.
    pub attempted: usize,
    /// Articles whose title and body were found.
    pub crawled: usize,
    /// Articles written to disk.
    pub saved: usize,
}
