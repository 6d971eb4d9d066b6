//! Utility functions for date parsing, DOM text handling and file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Publication date parsing from `datetime` attributes and `DD/MM/YYYY` text
//! - Whitespace-normalized text of parsed DOM elements
//! - String truncation for logging
//! - Output directory validation
//! - Fixed pauses standing in for page readiness signals

use chrono::{DateTime, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::ElementRef;
use std::fs as stdfs;
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument, warn};
use url::Url;

static DMY_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid date regex"));

/// Parse a structured timestamp taken from a `datetime` attribute.
///
/// Accepted forms, tried in order:
/// - `2024-01-15T10:00:00+0700` (offset without colon, as ZNews emits it)
/// - RFC 3339, e.g. `2024-01-15T10:00:00Z` or `2024-01-15T10:00:00+07:00`
/// - date only, `2024-01-15`
///
/// Returns `None` for anything else; a malformed date is never an error.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Parse a free-text `DD/MM/YYYY` date.
///
/// The date may be surrounded by other text (`"10:30 15/01/2024"`); the first
/// `D/M/YYYY` token is used. Impossible dates (`31/02/2024`) yield `None`.
pub fn parse_date_from_text(text: &str) -> Option<NaiveDate> {
    let caps = DMY_DATE.captures(text)?;
    let day = caps[1].parse().ok()?;
    let month = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Visible-ish text of an element: descendant text nodes concatenated as-is,
/// then runs of whitespace collapsed to single spaces and the ends trimmed.
///
/// Inline markup does not introduce spaces: `Theo <a>VnExpress</a>,` reads
/// `Theo VnExpress,`.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Resolve an `href`/`src` attribute against the page it was found on.
///
/// Returns `None` for empty values and values that do not form a valid URL.
pub fn resolve_url(base: Option<&Url>, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match base {
        Some(base) => base.join(raw).ok().map(|u| u.to_string()),
        None => Url::parse(raw).ok().map(|u| u.to_string()),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to `max` characters with an ellipsis and a count of
/// the dropped bytes appended. Cuts fall on character boundaries, so
/// Vietnamese text is safe.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…(+{} bytes)", &s[..cut], s.len() - cut),
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn ensure_writable_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await?;
    let scratch = path.join("..__write_check__");
    stdfs::File::create(&scratch)?;
    if let Err(e) = stdfs::remove_file(&scratch) {
        warn!(file = %scratch.display(), error = %e, "Failed to remove write check file");
    }
    info!("Output directory is writable");
    Ok(())
}

/// Sleep for a fixed pause. Zero-length pauses return immediately.
pub async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
