//! Error types shared by the collector, the crawler and the browser layer.
//!
//! Failures fall into two groups:
//!
//! - [`ScrapeError::ElementNotFound`]: an expected outcome on real pages. Callers
//!   skip the item (or fall back) and keep going.
//! - Everything else is unexpected. It is logged at the granularity of one
//!   article or one page load and swallowed, so a run ends with fewer results
//!   rather than aborting.
//!
//! [`ScrapeError::NoUsableUrl`] is the one failure that stops a run, and it is
//! raised before any browser work starts.

/// Errors produced while scraping.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("element not found: {0}")]
    ElementNotFound(String),

    #[error("failed to load {url}: {reason}")]
    PageLoad { url: String, reason: String },

    #[error("webdriver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),

    #[error("could not start webdriver session: {0}")]
    Session(#[from] fantoccini::error::NewSessionError),

    #[error("unexpected script result: {0}")]
    Script(String),

    #[error("no usable URL: {0}")]
    NoUsableUrl(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScrapeError {
    /// `true` for the expected, non-fatal "element not found" class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ScrapeError::ElementNotFound(_))
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;
