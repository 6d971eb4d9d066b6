//! # ZNews Scraper
//!
//! Collects article links from ZNews category pages and crawls them into one
//! JSON record per article, driving Chrome through WebDriver.
//!
//! ## Features
//!
//! - Scroll-until-stable collection of category listings, filtered to one
//!   publication year
//! - Two listing layouts: the `#news-latest` feed and generic `<article>` pages
//! - Article extraction of title, summary, body paragraphs and captioned photos
//! - YAML configuration for pauses, limits, selectors, categories and logging
//!
//! ## Usage
//!
//! ```sh
//! znews_scraper collect --category bong_da --output links_bong_da.txt
//! znews_scraper crawl data/links/links_bong_da.txt --category bong_da
//! ```
//!
//! ## Architecture
//!
//! Two sequential phases, run as separate subcommands:
//! 1. **Collecting**: load a category page, scroll, keep target-year links,
//!    write a links file
//! 2. **Crawling**: open each link, extract the article, write `<n>.json`
//!
//! A single browser session serves a whole run and is closed at the end,
//! whatever the outcome.

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info};

mod browser;
mod cli;
mod config;
mod error;
mod logging;
mod models;
mod outputs;
mod scrapers;
mod utils;

use browser::{Browser, WebDriverBrowser};
use cli::{Cli, CollectArgs, Command, CrawlArgs};
use config::Config;
use scrapers::{articles, links};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Cli::parse();

    let config = Config::load(args.config.as_deref())?;
    logging::init_tracing(&config.logging)?;

    let start_time = std::time::Instant::now();
    info!("znews_scraper starting up");
    debug!(?args.config, ?args.command, "Parsed CLI arguments");

    let result = match args.command {
        Command::Collect(collect) => run_collect(&config, collect).await,
        Command::Crawl(crawl) => run_crawl(&config, crawl).await,
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    result
}

fn headless(config: &Config, no_headless: bool) -> bool {
    config.browser.headless && !no_headless
}

async fn run_collect(config: &Config, args: CollectArgs) -> Result<(), Box<dyn Error>> {
    // Resolve the URL before touching the browser
    let url = match args.target_url(config) {
        Ok(url) => url,
        Err(e) => {
            error!(error = %e, "Nothing to collect");
            return Err(e.into());
        }
    };
    let request = links::CollectRequest {
        url,
        target_year: args.year.unwrap_or(config.crawl.target_year),
        max_links: args.max_links.unwrap_or(config.crawl.max_links),
        method: args.method,
    };

    let mut browser =
        WebDriverBrowser::launch(&config.browser, headless(config, args.no_headless)).await?;
    let outcome = links::collect_and_save(&mut browser, config, &request, &args.output).await;
    browser.close().await;

    match outcome {
        Ok(Some(path)) => {
            info!(path = %path.display(), "Links ready for crawling");
            Ok(())
        }
        Ok(None) => Ok(()),
        Err(e) => {
            error!(error = %e, output = %args.output, "Link collection failed");
            Err(e.into())
        }
    }
}

async fn run_crawl(config: &Config, args: CrawlArgs) -> Result<(), Box<dyn Error>> {
    let start = args.start.unwrap_or(config.crawl.start_count);
    let max = args.max.unwrap_or(config.crawl.max_articles);

    let mut browser =
        WebDriverBrowser::launch(&config.browser, headless(config, args.no_headless)).await?;
    let outcome = articles::crawl_from_file(
        &mut browser,
        config,
        &args.links_file,
        &args.category,
        start,
        max,
    )
    .await;
    browser.close().await;

    match outcome {
        Ok(summary) => {
            info!(saved = summary.saved, category = %args.category, "Crawl finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, links_file = %args.links_file.display(), "Crawl failed");
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_flag_overrides_config() {
        let mut config = Config::default();
        assert!(headless(&config, false));
        assert!(!headless(&config, true));
        config.browser.headless = false;
        assert!(!headless(&config, false));
    }
}
