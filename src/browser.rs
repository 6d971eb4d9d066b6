//! Browser session abstraction.
//!
//! Scrapers talk to the browser through the small [`Browser`] trait: load a
//! page, scroll, measure the page height and take a DOM snapshot. Element
//! lookup happens locally on the snapshot with the `scraper` crate, so the
//! trait stays narrow and the collector and crawler can be driven by an
//! in-memory implementation in tests.
//!
//! [`WebDriverBrowser`] is the real implementation, backed by a `fantoccini`
//! WebDriver client talking to `chromedriver`.
//!
//! # Session scope
//!
//! A session is acquired at the start of a run and must be released with
//! [`Browser::close`] on every path; callers hold the run's result until
//! `close` has completed. A driver process spawned by
//! [`WebDriverBrowser::launch`] is additionally killed on drop.

use crate::config::BrowserConfig;
use crate::error::{Result, ScrapeError};
use crate::utils::pause;
use fantoccini::{Client, ClientBuilder};
use serde_json::{Map, Value, json};
use tokio::process::{Child, Command};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Page-level browser operations used by the scrapers.
pub trait Browser {
    /// Navigate to `url` and wait for the browser to report the load.
    async fn goto(&mut self, url: &str) -> Result<()>;

    /// URL of the page currently loaded.
    async fn current_url(&mut self) -> Result<String>;

    /// Serialized DOM of the current page.
    async fn page_source(&mut self) -> Result<String>;

    /// `document.body.scrollHeight` of the current page.
    async fn scroll_height(&mut self) -> Result<i64>;

    /// Scroll the window to the bottom of the page.
    async fn scroll_to_bottom(&mut self) -> Result<()>;

    /// Scroll the window down by `pixels`.
    async fn scroll_by(&mut self, pixels: i64) -> Result<()>;

    /// End the session. Failures are logged, not returned.
    async fn close(self);
}

/// A `fantoccini` WebDriver session, optionally owning the driver process.
pub struct WebDriverBrowser {
    client: Client,
    driver: Option<Child>,
}

impl WebDriverBrowser {
    /// Start a Chrome session.
    ///
    /// When `config.chromedriver_path` is set the driver is spawned first on
    /// the port of `config.webdriver_url`; otherwise a driver must already be
    /// listening there. `headless` comes from the command line and overrides
    /// `config.headless`.
    #[instrument(level = "info", skip(config), fields(webdriver_url = %config.webdriver_url))]
    pub async fn launch(config: &BrowserConfig, headless: bool) -> Result<Self> {
        let mut driver = match &config.chromedriver_path {
            Some(path) => {
                let port = Url::parse(&config.webdriver_url)
                    .ok()
                    .and_then(|u| u.port_or_known_default())
                    .ok_or_else(|| {
                        ScrapeError::Config(format!(
                            "webdriver_url has no port: {}",
                            config.webdriver_url
                        ))
                    })?;
                info!(path = %path.display(), port, "Spawning chromedriver");
                let child = Command::new(path)
                    .arg(format!("--port={}", port))
                    .kill_on_drop(true)
                    .spawn()?;
                pause(config.driver_startup()).await;
                Some(child)
            }
            None => None,
        };

        let mut builder = ClientBuilder::native();
        builder.capabilities(chrome_capabilities(config, headless));
        let client = match builder.connect(&config.webdriver_url).await {
            Ok(client) => client,
            Err(e) => {
                if let Some(child) = driver.as_mut() {
                    let _ = child.kill().await;
                }
                return Err(e.into());
            }
        };

        info!("Browser session started");
        Ok(Self { client, driver })
    }
}

/// WebDriver capabilities for Chrome with the configured flags.
fn chrome_capabilities(config: &BrowserConfig, headless: bool) -> Map<String, Value> {
    let mut args = Vec::new();
    if headless {
        args.push("--headless".to_string());
    }
    if config.disable_gpu {
        args.push("--disable-gpu".to_string());
    }
    if config.no_sandbox {
        args.push("--no-sandbox".to_string());
    }
    if let Some(size) = &config.window_size {
        args.push(format!("--window-size={}", size));
    }

    let mut caps = Map::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
    caps
}

impl Browser for WebDriverBrowser {
    async fn goto(&mut self, url: &str) -> Result<()> {
        debug!(%url, "Navigating");
        self.client
            .goto(url)
            .await
            .map_err(|e| ScrapeError::PageLoad {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn current_url(&mut self) -> Result<String> {
        Ok(self.client.current_url().await?.to_string())
    }

    async fn page_source(&mut self) -> Result<String> {
        Ok(self.client.source().await?)
    }

    async fn scroll_height(&mut self) -> Result<i64> {
        let value = self
            .client
            .execute("return document.body.scrollHeight", vec![])
            .await?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
            .ok_or_else(|| ScrapeError::Script(format!("scrollHeight was {}", value)))
    }

    async fn scroll_to_bottom(&mut self) -> Result<()> {
        self.client
            .execute("window.scrollTo(0, document.body.scrollHeight);", vec![])
            .await?;
        Ok(())
    }

    async fn scroll_by(&mut self, pixels: i64) -> Result<()> {
        self.client
            .execute("window.scrollBy(0, arguments[0]);", vec![json!(pixels)])
            .await?;
        Ok(())
    }

    async fn close(self) {
        let Self { client, driver } = self;
        if let Err(e) = client.close().await {
            warn!(error = %e, "Failed to close browser session cleanly");
        }
        if let Some(mut child) = driver {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to stop chromedriver");
            }
        }
        info!("Browser session closed");
    }
}
