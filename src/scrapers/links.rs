//! Link collection from ZNews category pages.
//!
//! A category page lists articles newest first and loads more as the window
//! is scrolled. The collector repeatedly reads the listing, keeps links whose
//! publication year equals the target year, then scrolls to the bottom and
//! waits. It stops when:
//!
//! - the link cap is reached,
//! - an item older than the target year shows up (`scroll` method only; the
//!   listing is assumed to be in reverse-chronological order),
//! - the page height stops growing after a scroll, or
//! - `max_scrolls` iterations have run.
//!
//! # Listing layouts
//!
//! | Method | Items | Link |
//! |--------|-------|------|
//! | [`CollectMethod::Scroll`] | `#news-latest .section-content .article-item` | first `a` in `.article-thumbnail` |
//! | [`CollectMethod::Article`] | every `<article>` | first `a[href]` |
//!
//! An item's date comes from `time[datetime]` when it parses, else from the
//! `DD/MM/YYYY` text of its `.date` element. Items without a date are skipped.

use crate::browser::Browser;
use crate::config::{Config, Selectors};
use crate::error::{Result, ScrapeError};
use crate::models::{ArticleLink, CollectMethod};
use crate::outputs::links_file::save_links;
use crate::scrapers::{class_selector, css, id_selector};
use crate::utils::{element_text, parse_date_from_text, parse_iso_date, pause, resolve_url};
use chrono::Datelike;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// What to collect and where from.
#[derive(Debug, Clone)]
pub struct CollectRequest {
    pub url: String,
    pub target_year: i32,
    pub max_links: usize,
    pub method: CollectMethod,
}

/// Result of offering one listing item to a [`LinkGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep reading items.
    Continue,
    /// The item is older than the target year; nothing further can match.
    Older(i32),
    /// The link cap has been reached.
    Full,
}

/// Year filter and deduplicating link set for one collection run.
///
/// Accepted links keep first-seen order so the links file is stable across
/// runs over the same listing.
#[derive(Debug)]
pub struct LinkGate {
    target_year: i32,
    max_links: usize,
    stop_on_older: bool,
    links: Vec<String>,
    seen: HashSet<String>,
}

impl LinkGate {
    pub fn new(target_year: i32, max_links: usize, stop_on_older: bool) -> Self {
        Self {
            target_year,
            max_links,
            stop_on_older,
            links: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn for_request(request: &CollectRequest) -> Self {
        Self::new(
            request.target_year,
            request.max_links,
            request.method == CollectMethod::Scroll,
        )
    }

    /// Apply the year rules to one item.
    pub fn offer(&mut self, item: &ArticleLink) -> Verdict {
        match item.year {
            None => {}
            Some(year) if year > self.target_year => {}
            Some(year) if year == self.target_year => {
                if let Some(url) = &item.url {
                    if self.seen.insert(url.clone()) {
                        debug!(%url, "Found link");
                        self.links.push(url.clone());
                    }
                }
            }
            Some(year) => {
                if self.stop_on_older {
                    return Verdict::Older(year);
                }
            }
        }
        if self.is_full() {
            Verdict::Full
        } else {
            Verdict::Continue
        }
    }

    pub fn is_full(&self) -> bool {
        self.links.len() >= self.max_links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    pub fn into_links(self) -> Vec<String> {
        self.links
    }
}

/// Compiled selectors for one listing layout.
struct ListingSelectors {
    method: CollectMethod,
    news_latest: Selector,
    section_content: Selector,
    article_item: Selector,
    article: Selector,
    thumbnail_link: Selector,
    link: Selector,
    time: Selector,
    date: Selector,
}

impl ListingSelectors {
    fn new(method: CollectMethod, selectors: &Selectors) -> Result<Self> {
        Ok(Self {
            method,
            news_latest: id_selector(&selectors.news_latest)?,
            section_content: class_selector(&selectors.section_content)?,
            article_item: class_selector(&selectors.article_item)?,
            article: css("article")?,
            thumbnail_link: css(&format!(".{} a", selectors.thumbnail))?,
            link: css("a[href]")?,
            time: css("time")?,
            date: class_selector(&selectors.date)?,
        })
    }

    /// Read the listing items of a DOM snapshot in document order.
    fn items(&self, html: &str, base: Option<&Url>) -> Result<Vec<ArticleLink>> {
        let document = Html::parse_document(html);
        let (elements, link_selector): (Vec<ElementRef<'_>>, &Selector) = match self.method {
            CollectMethod::Scroll => {
                let news_box = document
                    .select(&self.news_latest)
                    .next()
                    .ok_or_else(|| ScrapeError::ElementNotFound("#news-latest".to_string()))?;
                let content_box = news_box
                    .select(&self.section_content)
                    .next()
                    .ok_or_else(|| ScrapeError::ElementNotFound("section content".to_string()))?;
                (
                    content_box.select(&self.article_item).collect(),
                    &self.thumbnail_link,
                )
            }
            CollectMethod::Article => (document.select(&self.article).collect(), &self.link),
        };

        Ok(elements
            .into_iter()
            .map(|item| ArticleLink {
                url: item
                    .select(link_selector)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| resolve_url(base, href)),
                year: self.item_year(item),
            })
            .collect())
    }

    fn item_year(&self, item: ElementRef<'_>) -> Option<i32> {
        let from_attr = item
            .select(&self.time)
            .next()
            .and_then(|time| time.value().attr("datetime"))
            .and_then(parse_iso_date);
        if let Some(date) = from_attr {
            return Some(date.year());
        }
        item.select(&self.date)
            .next()
            .map(element_text)
            .and_then(|text| parse_date_from_text(&text))
            .map(|date| date.year())
    }
}

/// Collect links from one category page.
///
/// A page-load or browser error ends the collection early and the links
/// gathered up to that point are returned.
///
/// # Errors
///
/// [`ScrapeError::Config`] when the configured selectors do not compile. This
/// is checked before the page is loaded.
#[instrument(level = "info", skip_all, fields(url = %request.url, year = request.target_year, method = %request.method))]
pub async fn collect_links<B: Browser>(
    browser: &mut B,
    config: &Config,
    request: &CollectRequest,
) -> Result<Vec<String>> {
    let listing = ListingSelectors::new(request.method, &config.selectors)?;
    let mut gate = LinkGate::for_request(request);
    if let Err(e) = scroll_and_gather(browser, config, request, &listing, &mut gate).await {
        error!(error = %e, collected = gate.len(), "Link collection stopped early");
    }
    info!(count = gate.len(), "Collected links");
    Ok(gate.into_links())
}

async fn scroll_and_gather<B: Browser>(
    browser: &mut B,
    config: &Config,
    request: &CollectRequest,
    listing: &ListingSelectors,
    gate: &mut LinkGate,
) -> Result<()> {
    info!("Starting link collection");
    browser.goto(&request.url).await?;
    pause(match request.method {
        CollectMethod::Scroll => config.crawl.listing_load_pause(),
        CollectMethod::Article => config.crawl.article_listing_load_pause(),
    })
    .await;

    let base = match browser.current_url().await {
        Ok(current) => Url::parse(&current).ok(),
        Err(_) => None,
    }
    .or_else(|| Url::parse(&request.url).ok());

    let mut last_height = browser.scroll_height().await?;
    let mut scrolls = 0;

    while scrolls < config.crawl.max_scrolls {
        let html = browser.page_source().await?;
        match listing.items(&html, base.as_ref()) {
            Ok(items) => {
                for item in &items {
                    match gate.offer(item) {
                        Verdict::Continue => {}
                        Verdict::Older(year) => {
                            info!(year, "Reached older articles, stopping");
                            return Ok(());
                        }
                        Verdict::Full => {
                            info!(max_links = request.max_links, "Reached maximum links");
                            return Ok(());
                        }
                    }
                }
            }
            Err(e) if e.is_not_found() => warn!(error = %e, "Listing not found on page"),
            Err(e) => return Err(e),
        }

        browser.scroll_to_bottom().await?;
        pause(config.crawl.scroll_pause()).await;

        let new_height = browser.scroll_height().await?;
        if new_height == last_height {
            info!("No more content to load");
            break;
        }
        last_height = new_height;
        scrolls += 1;
        debug!(scrolls, height = new_height, collected = gate.len(), "Scrolled");
    }
    Ok(())
}

/// Collect links and write them to `links_dir/<output_file>`.
///
/// # Returns
///
/// The links file path, or `None` when nothing was collected (no file is
/// written in that case).
///
/// # Errors
///
/// Bad selector configuration, or a links file that cannot be written.
#[instrument(level = "info", skip(browser, config, request))]
pub async fn collect_and_save<B: Browser>(
    browser: &mut B,
    config: &Config,
    request: &CollectRequest,
    output_file: &str,
) -> Result<Option<PathBuf>> {
    let links = collect_links(browser, config, request).await?;
    if links.is_empty() {
        warn!("No links collected");
        return Ok(None);
    }
    let path = config.paths.links_dir.join(output_file);
    save_links(&links, &path).await?;
    info!(count = links.len(), path = %path.display(), "Saved links");
    Ok(Some(path))
}
