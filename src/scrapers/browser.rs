use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use super::traits::Driver;

/// Launch settings for the Chrome session
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    /// Wait after each navigation before the page is read
    pub settle: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            settle: Duration::from_secs(2),
        }
    }
}

/// Driver backed by a single headless Chrome tab
pub struct ChromeDriver {
    // Dropping the browser kills the Chrome process.
    _browser: Browser,
    tab: Arc<Tab>,
    settle: Duration,
}

impl ChromeDriver {
    /// Launch Chrome and open the tab every listing is loaded into
    pub fn launch(options: &BrowserOptions) -> Result<Self> {
        info!("Launching {} Chrome...", if options.headless { "headless" } else { "headed" });

        let launch = LaunchOptions::default_builder()
            .headless(options.headless)
            .window_size(Some((1920, 1080)))
            .build()
            .context("Failed to build launch options")?;

        let browser = Browser::new(launch).context("Failed to launch Chrome browser")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        Ok(Self {
            _browser: browser,
            tab,
            settle: options.settle,
        })
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let tab = Arc::clone(&self.tab);
        let target = url.to_string();
        tokio::task::spawn_blocking(move || -> Result<()> {
            tab.navigate_to(&target)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await?
        .with_context(|| format!("Failed to load {}", url))?;

        debug!("Loaded {}, waiting {:?} for scripts to settle", url, self.settle);
        tokio::time::sleep(self.settle).await;
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> Result<Value> {
        let tab = Arc::clone(&self.tab);
        // Serialize in the page so arrays and objects come back by value.
        let script = format!("JSON.stringify({})", expression);
        let result = tokio::task::spawn_blocking(move || tab.evaluate(&script, false)).await??;

        match result.value {
            Some(Value::String(json)) => serde_json::from_str(&json)
                .with_context(|| format!("Unexpected value for {}", expression)),
            Some(other) => Ok(other),
            None => Ok(Value::Null),
        }
    }

    async fn select_text(&self, selector: &str) -> Result<String> {
        let html = match self.evaluate("document.documentElement.outerHTML").await? {
            Value::String(html) => html,
            _ => return Err(anyhow!("Could not get HTML from page")),
        };
        text_of(&html, selector)
    }

    async fn quit(&self) -> Result<()> {
        info!("Closing Chrome...");
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || tab.close(true)).await??;
        Ok(())
    }
}

/// Text of the first element in `html` matching `selector`
fn text_of(html: &str, selector: &str) -> Result<String> {
    let parsed =
        Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {}: {:?}", selector, e))?;
    let document = Html::parse_document(html);

    document
        .select(&parsed)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or_else(|| anyhow!("No element matches {}", selector))
}
