//! Headless-Chrome page fetcher.
//!
//! One isolated browser session per fetch: launch, navigate, wait for the
//! page to settle, read `document.body.innerText`, tear everything down.
//! Every failure path collapses into `ScrapeResult::Failed`; nothing leaks
//! past this crate's boundary, and no session outlives a fetch.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::time::Duration;

use seatwatch_core::config::BrowserConfig as BrowserSettings;
use seatwatch_core::error::{Result, SeatwatchError};
use seatwatch_core::traits::Fetcher;
use seatwatch_core::types::ScrapeResult;

/// Fetches one page's rendered visible text through headless Chrome.
pub struct PageFetcher {
    settings: BrowserSettings,
}

impl PageFetcher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn fetch_inner(&self, url: &str) -> Result<String> {
        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg(format!("--user-agent={}", self.settings.user_agent))
            .build()
            .map_err(SeatwatchError::Browser)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SeatwatchError::Browser(format!("launch failed: {e}")))?;

        // The handler must be polled for the CDP connection to make progress.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let timeout = Duration::from_secs(self.settings.navigation_timeout_secs);
        let result = tokio::time::timeout(timeout, load_and_extract(&browser, url)).await;

        // Teardown on every exit path: success, timeout, extraction error.
        browser.close().await.ok();
        browser.wait().await.ok();
        handler_task.abort();

        match result {
            Ok(Ok(text)) => Ok(normalize_whitespace(&text)),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(SeatwatchError::Fetch(format!(
                "navigation timed out after {}s",
                self.settings.navigation_timeout_secs
            ))),
        }
    }
}

async fn load_and_extract(browser: &Browser, url: &str) -> Result<String> {
    let page: Page = browser
        .new_page(url)
        .await
        .map_err(|e| SeatwatchError::Fetch(format!("navigation to {url}: {e}")))?;

    page.wait_for_navigation()
        .await
        .map_err(|e| SeatwatchError::Fetch(format!("page load: {e}")))?;

    let text: String = page
        .evaluate("document.body ? document.body.innerText : ''")
        .await
        .map_err(|e| SeatwatchError::Fetch(format!("text extraction: {e}")))?
        .into_value()
        .map_err(|e| SeatwatchError::Fetch(format!("text extraction: {e}")))?;

    page.close().await.ok();
    Ok(text)
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub fn normalize_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl Fetcher for PageFetcher {
    async fn fetch(&self, url: &str) -> ScrapeResult {
        match self.fetch_inner(url).await {
            Ok(text) => {
                tracing::debug!("fetched {} chars of visible text from {url}", text.len());
                ScrapeResult::Text(text)
            }
            Err(e) => {
                tracing::warn!("scrape failed for {url}: {e}");
                ScrapeResult::Failed
            }
        }
    }
}
