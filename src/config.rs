//! Runtime configuration.
//!
//! Every tunable has a built-in default, so the scraper runs without any
//! configuration file. A YAML file passed with `--config` (or `ZNEWS_CONFIG`)
//! overrides individual values; sections and keys that are left out keep
//! their defaults.
//!
//! ```yaml
//! crawl:
//!   target_year: 2023
//!   max_scrolls: 20
//! browser:
//!   chromedriver_path: ./chromedriver
//! logging:
//!   level: debug
//! ```

use crate::error::{Result, ScrapeError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub browser: BrowserConfig,
    pub crawl: CrawlConfig,
    /// Named category pages selectable with `collect --category`.
    pub categories: Categories,
    pub selectors: Selectors,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from an optional YAML file.
    ///
    /// `None` yields the defaults. A path that cannot be read or parsed is an
    /// error: silently falling back would run with settings the user did not
    /// ask for.
    #[instrument(level = "debug")]
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Config::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ScrapeError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml(&raw)
            .map_err(|e| ScrapeError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> std::result::Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(raw)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory the links files are written into.
    pub links_dir: PathBuf,
    /// Root of the per-category article directories.
    pub articles_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            links_dir: PathBuf::from("data/links"),
            articles_dir: PathBuf::from("data/articles"),
        }
    }
}

/// How the WebDriver session is obtained and which Chrome flags it gets.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// WebDriver endpoint to connect to.
    pub webdriver_url: String,
    /// When set, this `chromedriver` binary is spawned on the port of
    /// `webdriver_url` for the lifetime of the session.
    pub chromedriver_path: Option<PathBuf>,
    /// Time given to a spawned driver before connecting.
    pub driver_startup_ms: u64,
    pub headless: bool,
    pub disable_gpu: bool,
    pub no_sandbox: bool,
    pub window_size: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:9515".to_string(),
            chromedriver_path: None,
            driver_startup_ms: 1000,
            headless: true,
            disable_gpu: true,
            no_sandbox: true,
            window_size: Some("1920,1080".to_string()),
        }
    }
}

impl BrowserConfig {
    pub fn driver_startup(&self) -> Duration {
        Duration::from_millis(self.driver_startup_ms)
    }
}

/// Pauses, limits and defaults for both collecting and crawling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub scroll_pause_ms: u64,
    pub max_scrolls: usize,
    /// Pixels per scroll step while waiting for lazy images.
    pub scroll_amount: i64,
    pub image_load_scrolls: usize,
    pub image_scroll_pause_ms: u64,
    /// Wait after opening a category page with the `scroll` method.
    pub listing_load_pause_ms: u64,
    /// Wait after opening a category page with the `article` method.
    pub article_listing_load_pause_ms: u64,
    /// Wait after opening an article page.
    pub article_load_pause_ms: u64,
    pub target_year: i32,
    pub max_links: usize,
    pub max_articles: usize,
    pub start_count: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            scroll_pause_ms: 2000,
            max_scrolls: 50,
            scroll_amount: 600,
            image_load_scrolls: 10,
            image_scroll_pause_ms: 300,
            listing_load_pause_ms: 5000,
            article_listing_load_pause_ms: 3000,
            article_load_pause_ms: 2000,
            target_year: 2024,
            max_links: 200,
            max_articles: 200,
            start_count: 0,
        }
    }
}

impl CrawlConfig {
    pub fn scroll_pause(&self) -> Duration {
        Duration::from_millis(self.scroll_pause_ms)
    }

    pub fn image_scroll_pause(&self) -> Duration {
        Duration::from_millis(self.image_scroll_pause_ms)
    }

    pub fn listing_load_pause(&self) -> Duration {
        Duration::from_millis(self.listing_load_pause_ms)
    }

    pub fn article_listing_load_pause(&self) -> Duration {
        Duration::from_millis(self.article_listing_load_pause_ms)
    }

    pub fn article_load_pause(&self) -> Duration {
        Duration::from_millis(self.article_load_pause_ms)
    }
}

/// Category name to listing URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Categories(pub BTreeMap<String, String>);

impl Default for Categories {
    fn default() -> Self {
        let map = [
            ("bong_da", "https://znews.vn/bong-da-viet-nam.html"),
            ("giao_duc", "https://lifestyle.znews.vn/giao-duc.html"),
            ("phap_luat", "https://zingnews.vn/phap-luat.html"),
        ]
        .into_iter()
        .map(|(name, url)| (name.to_string(), url.to_string()))
        .collect();
        Categories(map)
    }
}

impl Categories {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Class and id names the extraction relies on.
///
/// Plain names, not CSS selectors: `article_title = "the-article-title"` is
/// matched as `.the-article-title`, `news_latest` as `#news-latest`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Selectors {
    pub article_summary: String,
    pub article_title: String,
    pub article_body: String,
    pub photo_wrapper: String,
    pub photo_pic: String,
    pub news_latest: String,
    pub section_content: String,
    pub article_item: String,
    pub date: String,
    pub thumbnail: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            article_summary: "the-article-summary".to_string(),
            article_title: "the-article-title".to_string(),
            article_body: "the-article-body".to_string(),
            photo_wrapper: "z-photoviewer-wrapper".to_string(),
            photo_pic: "pic".to_string(),
            news_latest: "news-latest".to_string(),
            section_content: "section-content".to_string(),
            article_item: "article-item".to_string(),
            date: "date".to_string(),
            thumbnail: "article-thumbnail".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Indentation width of saved article JSON.
    pub json_indent: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { json_indent: 4 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter directive when `RUST_LOG` is unset.
    pub level: String,
    /// Log file appended to in addition to the console; `null` disables it.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: Some(PathBuf::from("logs/crawler.log")),
        }
    }
}
