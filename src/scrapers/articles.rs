//! Article crawling.
//!
//! Each link from a links file is opened in the browser and checked for a
//! title and body. It is then scrolled a fixed number of steps so lazily
//! loaded photos get their real sources, and read from a fresh DOM snapshot:
//!
//! - **title**: `.the-article-title` (required)
//! - **body**: `.the-article-body` (required)
//! - **content**: the `.the-article-summary` text, if any, followed by every
//!   non-empty `<p>` that is a direct child of the body, one per line
//! - **images**: one entry per `.z-photoviewer-wrapper` inside the body; all
//!   `img` sources under its `.pic` elements joined with `", "`, captioned
//!   with the wrapper's text
//!
//! A page missing its title or body is skipped. Failures never stop the run;
//! crawling continues with the next link.

use crate::browser::Browser;
use crate::config::{Config, Selectors};
use crate::error::{Result, ScrapeError};
use crate::models::{ArticleMetadata, ArticleRecord, CrawlSummary, ImageRecord};
use crate::outputs::json::write_article;
use crate::outputs::links_file::read_links;
use crate::scrapers::{class_selector, css};
use crate::utils::{element_text, ensure_writable_dir, pause, resolve_url, truncate_for_log};
use itertools::Itertools;
use scraper::{ElementRef, Html};
use std::path::Path;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Extract an article from a DOM snapshot.
///
/// `url` is recorded as the article URL; `base` resolves relative image
/// sources (usually the URL the browser ended up on).
///
/// # Errors
///
/// [`ScrapeError::ElementNotFound`] when the title or body is missing.
pub fn extract_article(
    html: &str,
    url: &str,
    base: Option<&Url>,
    selectors: &Selectors,
) -> Result<ArticleRecord> {
    let document = Html::parse_document(html);

    let title_selector = class_selector(&selectors.article_title)?;
    let title = document
        .select(&title_selector)
        .next()
        .map(element_text)
        .ok_or_else(|| ScrapeError::ElementNotFound(format!("title .{}", selectors.article_title)))?;

    let body_selector = class_selector(&selectors.article_body)?;
    let body = document
        .select(&body_selector)
        .next()
        .ok_or_else(|| ScrapeError::ElementNotFound(format!("body .{}", selectors.article_body)))?;

    let content = article_content(&document, body, selectors)?;
    let images = article_images(body, base, selectors)?;

    Ok(ArticleRecord {
        url: url.to_string(),
        title,
        content,
        metadata: ArticleMetadata { images },
    })
}

/// Summary line plus the direct paragraph children of `body`, in order.
fn article_content(document: &Html, body: ElementRef<'_>, selectors: &Selectors) -> Result<String> {
    let summary_selector = class_selector(&selectors.article_summary)?;
    let summary = match document.select(&summary_selector).next() {
        Some(summary) => element_text(summary),
        None => {
            warn!("Summary not found");
            String::new()
        }
    };

    let paragraphs = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "p")
        .map(element_text)
        .filter(|text| !text.is_empty());

    Ok(Some(summary)
        .into_iter()
        .filter(|s| !s.is_empty())
        .chain(paragraphs)
        .join("\n"))
}

/// Captioned photo blocks inside `body`. Blocks without any image source are
/// dropped.
fn article_images(
    body: ElementRef<'_>,
    base: Option<&Url>,
    selectors: &Selectors,
) -> Result<Vec<ImageRecord>> {
    let wrapper_selector = class_selector(&selectors.photo_wrapper)?;
    let pic_selector = class_selector(&selectors.photo_pic)?;
    let img_selector = css("img")?;

    let mut images = Vec::new();
    for wrapper in body.select(&wrapper_selector) {
        let sources: Vec<String> = wrapper
            .select(&pic_selector)
            .flat_map(|pic| pic.select(&img_selector))
            .filter_map(|img| image_source(img, base))
            .collect();
        if sources.is_empty() {
            continue;
        }
        images.push(ImageRecord {
            url: sources.join(", "),
            caption: element_text(wrapper),
        });
    }
    Ok(images)
}

/// `src` of an image, or `data-src` while the lazy loader still shows an
/// inline placeholder.
fn image_source(img: ElementRef<'_>, base: Option<&Url>) -> Option<String> {
    let attrs = img.value();
    [attrs.attr("src"), attrs.attr("data-src")]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|src| !src.is_empty() && !src.starts_with("data:"))
        .and_then(|src| resolve_url(base, src))
}

/// Load one article and extract it.
///
/// The title and body are checked on a first snapshot, before any scrolling,
/// so pages that will be skipped do not pay for the lazy-image wait. A scroll
/// failure only costs images: the article is still extracted from what has
/// loaded.
#[instrument(level = "info", skip(browser, config))]
pub async fn crawl_article<B: Browser>(
    browser: &mut B,
    config: &Config,
    url: &str,
) -> Result<ArticleRecord> {
    browser.goto(url).await?;
    pause(config.crawl.article_load_pause()).await;

    let base = browser
        .current_url()
        .await
        .ok()
        .and_then(|current| Url::parse(&current).ok())
        .or_else(|| Url::parse(url).ok());

    let html = browser.page_source().await?;
    let mut record = extract_article(&html, url, base.as_ref(), &config.selectors)?;

    for step in 0..config.crawl.image_load_scrolls {
        if let Err(e) = browser.scroll_by(config.crawl.scroll_amount).await {
            warn!(step, error = %e, "Scrolling for images failed; using what has loaded");
            break;
        }
        pause(config.crawl.image_scroll_pause()).await;
    }

    if config.crawl.image_load_scrolls > 0 {
        match browser.page_source().await {
            Ok(html) => match extract_article(&html, url, base.as_ref(), &config.selectors) {
                Ok(scrolled) => record = scrolled,
                Err(e) => warn!(error = %e, "Page changed after scrolling; keeping first snapshot"),
            },
            Err(e) => warn!(error = %e, "Could not re-read page after scrolling"),
        }
    }

    debug!(
        images = record.metadata.images.len(),
        content = %truncate_for_log(&record.content, 200),
        "Extracted article"
    );
    Ok(record)
}

/// Crawl the links in `links_file` into `articles_dir/<category>/<n>.json`.
///
/// Files are numbered from `start_count`; crawling stops once the next number
/// would reach `max_articles`. Only successfully extracted articles consume a
/// number.
///
/// # Errors
///
/// Only when the links file cannot be read or the output directory cannot
/// be prepared. Per-article failures are logged and skipped.
#[instrument(level = "info", skip(browser, config), fields(links_file = %links_file.display()))]
pub async fn crawl_from_file<B: Browser>(
    browser: &mut B,
    config: &Config,
    links_file: &Path,
    category: &str,
    start_count: usize,
    max_articles: usize,
) -> Result<CrawlSummary> {
    let links = read_links(links_file).await?;
    info!(count = links.len(), "Found links to crawl");

    let output_dir = config.paths.articles_dir.join(category);
    ensure_writable_dir(&output_dir).await?;

    let mut summary = CrawlSummary::default();
    let mut count = start_count;

    for link in &links {
        if count >= max_articles {
            info!(max_articles, "Reached maximum articles limit");
            break;
        }
        summary.attempted += 1;
        info!(number = count + 1, max_articles, %link, "Crawling article");

        let record = match crawl_article(browser, config, link).await {
            Ok(record) => record,
            Err(e) if e.is_not_found() => {
                error!(%link, error = %e, "Required element missing; skipping article");
                continue;
            }
            Err(e) => {
                error!(%link, error = %e, "Error crawling article");
                continue;
            }
        };
        summary.crawled += 1;
        info!(title = %record.title, "Successfully crawled");

        match write_article(&record, &output_dir, count, config.output.json_indent).await {
            Ok(_) => summary.saved += 1,
            Err(e) => error!(%link, error = %e, "Error saving article"),
        }
        count += 1;
    }

    info!(
        attempted = summary.attempted,
        crawled = summary.crawled,
        saved = summary.saved,
        "Crawling complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::scripted::ScriptedBrowser;
    use crate::outputs::links_file::save_links;

    fn article_html(title: &str) -> String {
        format!(
            r#"<html><body>
              <h1 class="the-article-title">{title}</h1>
              <p class="the-article-summary">Tóm tắt một dòng.</p>
              <div class="the-article-body">
                <p>Đoạn thứ nhất.</p>
                <p>   </p>
                <table class="picture"><tr><td class="pic"><p>nested, not direct</p></td></tr></table>
                <p>Đoạn   thứ <em>hai</em>.</p>
              </div>
            </body></html>"#
        )
    }

    fn fast_config(articles_dir: &Path) -> Config {
        let mut config = Config::default();
        config.paths.articles_dir = articles_dir.to_path_buf();
        config.crawl.article_load_pause_ms = 0;
        config.crawl.image_scroll_pause_ms = 0;
        config.crawl.image_load_scrolls = 2;
        config
    }

    #[test]
    fn test_content_is_summary_then_direct_paragraphs() {
        let record = extract_article(
            &article_html("Tiêu đề"),
            "https://znews.vn/a.html",
            None,
            &Selectors::default(),
        )
        .unwrap();
        assert_eq!(record.title, "Tiêu đề");
        assert_eq!(record.url, "https://znews.vn/a.html");
        assert_eq!(record.content, "Tóm tắt một dòng.\nĐoạn thứ nhất.\nĐoạn thứ hai.");
        assert!(record.metadata.images.is_empty());
    }

    #[test]
    fn test_content_without_summary() {
        let html = r#"<h1 class="the-article-title">T</h1>
            <div class="the-article-body"><p>Một.</p><div><p>skip</p></div><p>Hai.</p></div>"#;
        let record = extract_article(html, "u", None, &Selectors::default()).unwrap();
        assert_eq!(record.content, "Một.\nHai.");
    }

    #[test]
    fn test_missing_title_or_body_is_not_found() {
        let no_title = r#"<div class="the-article-body"><p>x</p></div>"#;
        let err = extract_article(no_title, "u", None, &Selectors::default()).unwrap_err();
        assert!(err.is_not_found());

        let no_body = r#"<h1 class="the-article-title">T</h1><p>x</p>"#;
        let err = extract_article(no_body, "u", None, &Selectors::default()).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_images_grouped_per_wrapper() {
        let html = r#"<h1 class="the-article-title">T</h1>
            <div class="the-article-body">
              <table class="z-photoviewer-wrapper">
                <tr><td class="pic"><img src="/img/1.jpg"><img src="https://photo.znews.vn/2.jpg"></td></tr>
                <tr><td class="pic-caption">  Cầu thủ   ăn mừng. </td></tr>
              </table>
              <table class="z-photoviewer-wrapper">
                <tr><td class="pic"><img src="data:image/gif;base64,R0lG" data-src="/img/3.jpg"></td></tr>
                <tr><td>Ảnh: ZNews</td></tr>
              </table>
              <table class="z-photoviewer-wrapper">
                <tr><td class="pic"><img src=""></td></tr>
                <tr><td>no source</td></tr>
              </table>
            </div>"#;
        let base = Url::parse("https://znews.vn/a-post1.html").unwrap();
        let record = extract_article(html, "u", Some(&base), &Selectors::default()).unwrap();
        assert_eq!(
            record.metadata.images,
            vec![
                ImageRecord {
                    url: "https://znews.vn/img/1.jpg, https://photo.znews.vn/2.jpg".into(),
                    caption: "Cầu thủ ăn mừng.".into(),
                },
                ImageRecord {
                    url: "https://znews.vn/img/3.jpg".into(),
                    caption: "Ảnh: ZNews".into(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_crawl_article_scrolls_for_images() {
        let mut browser =
            ScriptedBrowser::new().with_page("https://znews.vn/a.html", vec![article_html("A")]);
        let dir = tempfile::tempdir().unwrap();
        let record = crawl_article(&mut browser, &fast_config(dir.path()), "https://znews.vn/a.html")
            .await
            .unwrap();
        assert_eq!(record.title, "A");
        assert_eq!(browser.pixel_scrolls, 2);
    }

    #[tokio::test]
    async fn test_crawl_article_keeps_article_when_scrolling_fails() {
        let mut browser =
            ScriptedBrowser::new().with_page("https://znews.vn/a.html", vec![article_html("A")]);
        browser.fail_pixel_scrolls = true;
        let dir = tempfile::tempdir().unwrap();
        let record = crawl_article(&mut browser, &fast_config(dir.path()), "https://znews.vn/a.html")
            .await
            .unwrap();
        assert_eq!(record.title, "A");
        assert_eq!(record.content, "Tóm tắt một dòng.\nĐoạn thứ nhất.\nĐoạn thứ hai.");
        assert!(record.metadata.images.is_empty());
        assert_eq!(browser.pixel_scrolls, 1);
    }

    #[tokio::test]
    async fn test_crawl_article_skips_scrolling_without_title() {
        let mut browser = ScriptedBrowser::new().with_page(
            "https://znews.vn/no-title.html",
            vec![r#"<div class="the-article-body"><p>x</p></div>"#.to_string()],
        );
        let dir = tempfile::tempdir().unwrap();
        let err = crawl_article(&mut browser, &fast_config(dir.path()), "https://znews.vn/no-title.html")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(browser.pixel_scrolls, 0);
    }

    #[tokio::test]
    async fn test_crawl_from_file_stops_at_max_articles() {
        let dir = tempfile::tempdir().unwrap();
        let links: Vec<String> = (1..=5).map(|i| format!("https://znews.vn/a{}.html", i)).collect();
        let links_path = dir.path().join("links.txt");
        save_links(&links, &links_path).await.unwrap();

        let mut browser = links.iter().fold(ScriptedBrowser::new(), |b, link| {
            b.with_page(link, vec![article_html(link)])
        });
        let config = fast_config(&dir.path().join("articles"));

        let summary = crawl_from_file(&mut browser, &config, &links_path, "bong_da", 0, 3)
            .await
            .unwrap();
        assert_eq!(summary, CrawlSummary { attempted: 3, crawled: 3, saved: 3 });
        assert_eq!(browser.visited.len(), 3);

        let out = dir.path().join("articles").join("bong_da");
        let mut files: Vec<String> = std::fs::read_dir(&out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        assert_eq!(files, vec!["0.json", "1.json", "2.json"]);

        let saved: ArticleRecord =
            serde_json::from_str(&std::fs::read_to_string(out.join("1.json")).unwrap()).unwrap();
        assert_eq!(saved.url, "https://znews.vn/a2.html");
    }

    #[tokio::test]
    async fn test_crawl_from_file_skips_failures_without_consuming_numbers() {
        let dir = tempfile::tempdir().unwrap();
        let links = vec![
            "https://znews.vn/ok1.html".to_string(),
            "https://znews.vn/no-title.html".to_string(),
            "https://znews.vn/unreachable.html".to_string(),
            "https://znews.vn/ok2.html".to_string(),
        ];
        let links_path = dir.path().join("links.txt");
        save_links(&links, &links_path).await.unwrap();

        let mut browser = ScriptedBrowser::new()
            .with_page("https://znews.vn/ok1.html", vec![article_html("Một")])
            .with_page(
                "https://znews.vn/no-title.html",
                vec![r#"<div class="the-article-body"><p>x</p></div>"#.to_string()],
            )
            .with_page("https://znews.vn/ok2.html", vec![article_html("Hai")]);
        let config = fast_config(dir.path());

        let summary = crawl_from_file(&mut browser, &config, &links_path, "phap_luat", 10, 200)
            .await
            .unwrap();
        assert_eq!(summary, CrawlSummary { attempted: 4, crawled: 2, saved: 2 });

        let out = dir.path().join("phap_luat");
        let second: ArticleRecord =
            serde_json::from_str(&std::fs::read_to_string(out.join("11.json")).unwrap()).unwrap();
        assert_eq!(second.title, "Hai");
        assert!(!out.join("12.json").exists());
    }

    #[tokio::test]
    async fn test_crawl_from_file_missing_links_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut browser = ScriptedBrowser::new();
        let result = crawl_from_file(
            &mut browser,
            &fast_config(dir.path()),
            &dir.path().join("missing.txt"),
            "general",
            0,
            10,
        )
        .await;
        assert!(matches!(result, Err(ScrapeError::Io(_))));
        assert!(browser.visited.is_empty());
    }
}
