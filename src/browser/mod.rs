//! Browser automation seam.
//!
//! Scrapers only talk to a page through [`Browser`]. Elements are returned as
//! text snapshots tagged with the selector and position they were found at;
//! every interaction re-locates the element by `(selector, index)` when it
//! runs, so a handle can never point into a page that has since changed.

pub mod chrome;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::Instant;

use crate::config::WaitPolicy;

pub use chrome::ChromeBrowser;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("browser launch failed")]
    Launch(#[source] anyhow::Error),

    #[error("navigation to {url} failed")]
    Navigation {
        url: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("interaction with '{selector}' failed")]
    Interaction {
        selector: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("no element #{index} matches '{selector}'")]
    MissingElement { selector: String, index: usize },

    #[error("timed out after {waited_ms}ms waiting for '{selector}'")]
    Timeout { selector: String, waited_ms: u64 },

    #[error("timed out after {waited_ms}ms on {url} waiting for the page to change")]
    UrlTimeout { url: String, waited_ms: u64 },
}

/// Snapshot of one matched element: where it was found and its visible text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub selector: String,
    pub index: usize,
    pub text: String,
}

impl Element {
    pub fn new(selector: &str, index: usize, text: impl Into<String>) -> Self {
        Self {
            selector: selector.to_string(),
            index,
            text: text.into(),
        }
    }

    /// Visible text split on line breaks.
    pub fn lines(&self) -> Vec<&str> {
        self.text.lines().collect()
    }
}

#[async_trait]
pub trait Browser: Send {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    async fn current_url(&mut self) -> Result<String, BrowserError>;

    async fn go_back(&mut self) -> Result<(), BrowserError>;

    /// All elements matching `selector`, in document order. No match is an
    /// empty list, not an error.
    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError>;

    async fn click(&mut self, element: &Element) -> Result<(), BrowserError>;

    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), BrowserError>;

    /// Re-query `selector` and return the `index`-th match.
    async fn find_nth(&mut self, selector: &str, index: usize) -> Result<Element, BrowserError> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .nth(index)
            .ok_or_else(|| BrowserError::MissingElement {
                selector: selector.to_string(),
                index,
            })
    }
}

/// Poll until `selector` matches at least one element or the policy's timeout
/// elapses. Replaces fixed sleeps after navigation.
pub async fn wait_for_elements<B: Browser + ?Sized>(
    browser: &mut B,
    selector: &str,
    policy: WaitPolicy,
) -> Result<Vec<Element>, BrowserError> {
    let start = Instant::now();
    loop {
        let found = browser.find_elements(selector).await?;
        if !found.is_empty() {
            return Ok(found);
        }
        let waited = start.elapsed();
        if waited >= policy.timeout {
            return Err(BrowserError::Timeout {
                selector: selector.to_string(),
                waited_ms: waited.as_millis() as u64,
            });
        }
        tokio::time::sleep(policy.poll_interval.min(policy.timeout - waited)).await;
    }
}

/// Poll until `selector` matches more than `baseline` elements. On timeout
/// the last read is returned as is, since sections that add nothing are not
/// an error.
pub async fn wait_for_more<B: Browser + ?Sized>(
    browser: &mut B,
    selector: &str,
    baseline: usize,
    policy: WaitPolicy,
) -> Result<Vec<Element>, BrowserError> {
    let start = Instant::now();
    loop {
        let found = browser.find_elements(selector).await?;
        let waited = start.elapsed();
        if found.len() > baseline || waited >= policy.timeout {
            return Ok(found);
        }
        tokio::time::sleep(policy.poll_interval.min(policy.timeout - waited)).await;
    }
}

/// Poll the page URL until `done` accepts it. Clicks that route client-side
/// return before the address bar changes.
pub async fn wait_for_url<B, F>(
    browser: &mut B,
    policy: WaitPolicy,
    mut done: F,
) -> Result<String, BrowserError>
where
    B: Browser + ?Sized,
    F: FnMut(&str) -> bool,
{
    let start = Instant::now();
    loop {
        let url = browser.current_url().await?;
        if done(&url) {
            return Ok(url);
        }
        let waited = start.elapsed();
        if waited >= policy.timeout {
            return Err(BrowserError::UrlTimeout {
                url,
                waited_ms: waited.as_millis() as u64,
            });
        }
        tokio::time::sleep(policy.poll_interval.min(policy.timeout - waited)).await;
    }
}

/// Click every element matching `selector`, re-querying before each click.
/// Returns how many clicks landed; individual failures are logged and skipped.
pub async fn click_all<B: Browser + ?Sized>(
    browser: &mut B,
    selector: &str,
) -> Result<usize, BrowserError> {
    let total = browser.find_elements(selector).await?.len();
    let mut clicked = 0;
    for index in 0..total {
        let outcome = match browser.find_nth(selector, index).await {
            Ok(element) => browser.click(&element).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(()) => clicked += 1,
            Err(e) => tracing::debug!(selector, index, error = %e, "expand click skipped"),
        }
    }
    Ok(clicked)
}
