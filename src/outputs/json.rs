//! JSON output for crawled articles.
//!
//! Each article is written to its own file, numbered by crawl order:
//!
//! ```text
//! articles_dir/
//! └── bong_da/
//!     ├── 0.json
//!     ├── 1.json
//!     └── 2.json
//! ```
//!
//! Output is pretty-printed with a configurable indentation width and keeps
//! non-ASCII characters as UTF-8 rather than `\u` escapes.

use crate::error::Result;
use crate::models::ArticleRecord;
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, instrument};

/// Serialize `record` with `indent` spaces per level.
pub fn to_pretty_json(record: &ArticleRecord, indent: usize) -> Result<Vec<u8>> {
    let indent = " ".repeat(indent);
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, formatter);
    record.serialize(&mut ser)?;
    Ok(buf)
}

/// Write an [`ArticleRecord`] to `{output_dir}/{index}.json`.
///
/// The directory is created if needed. An existing file with the same index
/// is replaced.
///
/// # Returns
///
/// The path written.
#[instrument(level = "info", skip(record, indent), fields(output_dir = %output_dir.display()))]
pub async fn write_article(
    record: &ArticleRecord,
    output_dir: &Path,
    index: usize,
    indent: usize,
) -> Result<PathBuf> {
    let json = to_pretty_json(record, indent)?;
    fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(format!("{}.json", index));
    fs::write(&path, json).await?;
    info!(path = %path.display(), "Saved article");
    Ok(path)
}
