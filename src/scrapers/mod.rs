//! ZNews scrapers.
//!
//! The work is split into two phases, each run as its own subcommand:
//!
//! 1. **Collecting** ([`links`]): walk a category page, scrolling until the
//!    listing stops growing, and keep the links published in the target year.
//! 2. **Crawling** ([`articles`]): open each collected link and extract the
//!    title, the summary plus body paragraphs, and the captioned images.
//!
//! Both phases drive a [`Browser`](crate::browser::Browser) for navigation and
//! scrolling, then parse a DOM snapshot with `scraper` to find elements.
//!
//! Failures are handled per item: an unparseable listing item is skipped, a
//! broken article is logged and the run moves on to the next link.

use crate::error::{Result, ScrapeError};
use scraper::Selector;

pub mod articles;
pub mod links;

/// Compile a CSS selector, reporting bad configuration as
/// [`ScrapeError::Config`].
pub(crate) fn css(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::Config(format!("invalid selector `{}`: {}", selector, e)))
}

/// Selector for a bare class name (`"date"` → `.date`).
pub(crate) fn class_selector(class: &str) -> Result<Selector> {
    css(&format!(".{}", class))
}

/// Selector for a bare id (`"news-latest"` → `#news-latest`).
pub(crate) fn id_selector(id: &str) -> Result<Selector> {
    css(&format!("#{}", id))
}
