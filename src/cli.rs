//! Command-line interface definitions for the ZNews scraper.
//!
//! This module defines the two subcommands, `collect` and `crawl`, using the
//! `clap` crate. Values left out on the command line fall back to the
//! configuration file, then to built-in defaults.

use crate::config::Config;
use crate::error::{Result, ScrapeError};
use crate::models::CollectMethod;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use url::Url;

/// Command-line arguments for the ZNews scraper.
///
/// # Examples
///
/// ```sh
/// # Collect 2024 football links into data/links/links_bong_da.txt
/// znews_scraper collect --category bong_da --output links_bong_da.txt
///
/// # Collect from a literal URL with the <article>-based method
/// znews_scraper collect --url https://znews.vn/the-thao.html --output links.txt --method article
///
/// # Crawl the collected links into data/articles/bong_da/
/// znews_scraper crawl data/links/links_bong_da.txt --category bong_da --max 50
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true, env = "ZNEWS_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collect article links from a category page
    Collect(CollectArgs),
    /// Crawl articles listed in a links file
    Crawl(CrawlArgs),
}

#[derive(Args, Debug)]
pub struct CollectArgs {
    /// Category page URL
    #[arg(long, required_unless_present = "category", conflicts_with = "category")]
    pub url: Option<String>,

    /// Named category from the configuration (e.g. bong_da, giao_duc, phap_luat)
    #[arg(long)]
    pub category: Option<String>,

    /// Output filename inside the links directory (e.g. links_bong_da.txt)
    #[arg(short, long)]
    pub output: String,

    /// Target publication year [default: crawl.target_year]
    #[arg(long)]
    pub year: Option<i32>,

    /// Maximum number of links to collect [default: crawl.max_links]
    #[arg(long)]
    pub max_links: Option<usize>,

    /// Listing layout to walk
    #[arg(long, value_enum, default_value_t = CollectMethod::Scroll)]
    pub method: CollectMethod,

    /// Run the browser with a visible window
    #[arg(long)]
    pub no_headless: bool,
}

impl CollectArgs {
    /// Resolve `--url`/`--category` to the page to collect from.
    ///
    /// This runs before any browser work: an unknown category or an invalid
    /// URL ends the run here.
    pub fn target_url(&self, config: &Config) -> Result<String> {
        let url = match (&self.category, &self.url) {
            (Some(name), _) => config.categories.get(name).ok_or_else(|| {
                ScrapeError::NoUsableUrl(format!(
                    "unknown category `{}` (known: {})",
                    name,
                    config.categories.names().collect::<Vec<_>>().join(", ")
                ))
            })?,
            (None, Some(url)) => url.as_str(),
            (None, None) => {
                return Err(ScrapeError::NoUsableUrl(
                    "specify either --url or --category".to_string(),
                ));
            }
        };
        Url::parse(url).map_err(|e| ScrapeError::NoUsableUrl(format!("{}: {}", url, e)))?;
        Ok(url.to_string())
    }
}

#[derive(Args, Debug)]
pub struct CrawlArgs {
    /// Path to the links file
    pub links_file: PathBuf,

    /// Category name used as the output subdirectory
    #[arg(long, default_value = "general")]
    pub category: String,

    /// First file number [default: crawl.start_count]
    #[arg(long)]
    pub start: Option<usize>,

    /// Stop before file number reaches this value [default: crawl.max_articles]
    #[arg(long)]
    pub max: Option<usize>,

    /// Run the browser with a visible window
    #[arg(long)]
    pub no_headless: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_parsing() {
        let cli = Cli::parse_from([
            "znews_scraper",
            "collect",
            "--category",
            "bong_da",
            "--output",
            "links_bong_da.txt",
            "--year",
            "2023",
            "--method",
            "article",
            "--no-headless",
        ]);
        let Command::Collect(args) = cli.command else {
            panic!("expected collect");
        };
        assert_eq!(args.category.as_deref(), Some("bong_da"));
        assert_eq!(args.output, "links_bong_da.txt");
        assert_eq!(args.year, Some(2023));
        assert_eq!(args.max_links, None);
        assert_eq!(args.method, CollectMethod::Article);
        assert!(args.no_headless);
    }

    #[test]
    fn test_collect_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["znews_scraper", "collect", "-o", "x.txt"]).is_err());
        assert!(
            Cli::try_parse_from([
                "znews_scraper",
                "collect",
                "-o",
                "x.txt",
                "--url",
                "https://znews.vn/a.html",
                "--category",
                "bong_da",
            ])
            .is_err()
        );
    }

    #[test]
    fn test_crawl_parsing_with_global_config() {
        let cli = Cli::parse_from([
            "znews_scraper",
            "crawl",
            "data/links/links.txt",
            "--max",
            "3",
            "-c",
            "znews.yaml",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("znews.yaml")));
        let Command::Crawl(args) = cli.command else {
            panic!("expected crawl");
        };
        assert_eq!(args.links_file, PathBuf::from("data/links/links.txt"));
        assert_eq!(args.category, "general");
        assert_eq!(args.start, None);
        assert_eq!(args.max, Some(3));
        assert!(!args.no_headless);
    }

    fn collect_args(url: Option<&str>, category: Option<&str>) -> CollectArgs {
        CollectArgs {
            url: url.map(str::to_string),
            category: category.map(str::to_string),
            output: "links.txt".to_string(),
            year: None,
            max_links: None,
            method: CollectMethod::Scroll,
            no_headless: false,
        }
    }

    #[test]
    fn test_target_url_from_category() {
        let config = Config::default();
        let url = collect_args(None, Some("giao_duc")).target_url(&config).unwrap();
        assert_eq!(url, "https://lifestyle.znews.vn/giao-duc.html");
    }

    #[test]
    fn test_target_url_rejects_unknown_category_and_bad_url() {
        let config = Config::default();
        let err = collect_args(None, Some("the_thao")).target_url(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::NoUsableUrl(_)));
        assert!(err.to_string().contains("bong_da"));

        let err = collect_args(Some("not a url"), None).target_url(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::NoUsableUrl(_)));

        let err = collect_args(None, None).target_url(&config).unwrap_err();
        assert!(matches!(err, ScrapeError::NoUsableUrl(_)));
    }
}
