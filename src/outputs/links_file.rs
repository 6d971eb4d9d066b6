//! Links file: the handoff between `collect` and `crawl`.
//!
//! One absolute URL per line, UTF-8, trailing newline after each entry.
//! Reading trims every line and drops blank ones, so hand-edited files with
//! stray whitespace still work.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Write `links` to `path`, one per line, creating parent directories.
#[instrument(level = "info", skip(links), fields(path = %path.display(), count = links.len()))]
pub async fn save_links(links: &[String], path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    let mut body = String::with_capacity(links.iter().map(|l| l.len() + 1).sum());
    for link in links {
        body.push_str(link);
        body.push('\n');
    }
    fs::write(path, body).await?;
    info!("Wrote links file");
    Ok(())
}

/// Read the links in `path`, order preserved, blank lines stripped.
#[instrument(level = "info", fields(path = %path.display()))]
pub async fn read_links(path: &Path) -> io::Result<Vec<String>> {
    let raw = fs::read_to_string(path).await?;
    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
