//! Chrome DevTools backend built on `headless_chrome`.
//!
//! `headless_chrome` is a blocking client, so every call runs on tokio's
//! blocking pool against a shared `Arc<Tab>`.

use super::{Browser, BrowserError, Element};
use crate::config::LaunchConfig;
use anyhow::Context;
use async_trait::async_trait;
use headless_chrome::{LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;

/// Chrome kills itself after this long without DevTools traffic; long pages
/// with several settle waits need more than the library default.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

/// Returns `innerText` for every match of a selector, JSON-encoded.
fn inner_text_script(selector: &str) -> String {
    // serde_json string encoding doubles as JS string-literal escaping
    let quoted = serde_json::Value::String(selector.to_string()).to_string();
    format!(
        "JSON.stringify(Array.from(document.querySelectorAll({}), e => e.innerText || ''))",
        quoted
    )
}

pub struct ChromeBrowser {
    // Dropping the browser closes the Chrome process.
    _browser: headless_chrome::Browser,
    tab: Arc<Tab>,
}

impl ChromeBrowser {
    /// Driver factory: start Chrome with an explicit launch configuration.
    pub fn launch(config: &LaunchConfig) -> Result<Self, BrowserError> {
        let mut args: Vec<&OsStr> = Vec::new();
        if config.disable_dev_shm {
            args.push(OsStr::new("--disable-dev-shm-usage"));
        }

        let options = LaunchOptions::default_builder()
            .headless(config.headless)
            .sandbox(config.sandbox)
            .window_size(Some((config.window_width, config.window_height)))
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .args(args)
            .build()
            .map_err(|e| BrowserError::Launch(anyhow::anyhow!("invalid launch options: {}", e)))?;

        let browser = headless_chrome::Browser::new(options).map_err(BrowserError::Launch)?;
        let tab = browser.new_tab().map_err(BrowserError::Launch)?;
        tracing::info!(headless = config.headless, "chrome launched");

        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    async fn run<T, F>(&self, op: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || op(&tab))
            .await
            .context("browser task panicked")?
    }

    /// Re-locate the `index`-th match of `selector` and act on it.
    async fn with_element<F>(&self, element: &Element, op: F) -> Result<(), BrowserError>
    where
        F: FnOnce(&headless_chrome::Element<'_>) -> anyhow::Result<()> + Send + 'static,
    {
        let selector = element.selector.clone();
        let index = element.index;
        let found = self
            .run(move |tab| {
                let matches = tab.find_elements(&selector).unwrap_or_default();
                match matches.get(index) {
                    Some(el) => op(el).map(|_| true),
                    None => Ok(false),
                }
            })
            .await
            .map_err(|source| BrowserError::Interaction {
                selector: element.selector.clone(),
                source,
            })?;

        if found {
            Ok(())
        } else {
            Err(BrowserError::MissingElement {
                selector: element.selector.clone(),
                index: element.index,
            })
        }
    }
}

#[async_trait]
impl Browser for ChromeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        let target = url.to_string();
        self.run(move |tab| {
            tab.navigate_to(&target)?.wait_until_navigated()?;
            Ok(())
        })
        .await
        .map_err(|source| BrowserError::Navigation {
            url: url.to_string(),
            source,
        })
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.run(|tab| Ok(tab.get_url()))
            .await
            .map_err(|source| BrowserError::Navigation {
                url: "<current>".to_string(),
                source,
            })
    }

    async fn go_back(&mut self) -> Result<(), BrowserError> {
        self.run(|tab| {
            tab.evaluate("window.history.back()", false)?;
            tab.wait_until_navigated()?;
            Ok(())
        })
        .await
        .map_err(|source| BrowserError::Navigation {
            url: "<history back>".to_string(),
            source,
        })
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        let script = inner_text_script(selector);
        let texts: Vec<String> = self
            .run(move |tab| {
                let result = tab.evaluate(&script, false)?;
                let encoded = match result.value {
                    Some(serde_json::Value::String(s)) => s,
                    _ => return Ok(Vec::new()),
                };
                Ok(serde_json::from_str(&encoded)?)
            })
            .await
            .map_err(|source| BrowserError::Interaction {
                selector: selector.to_string(),
                source,
            })?;

        Ok(texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Element::new(selector, index, text))
            .collect())
    }

    async fn click(&mut self, element: &Element) -> Result<(), BrowserError> {
        self.with_element(element, |el| {
            el.click()?;
            Ok(())
        })
        .await
    }

    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), BrowserError> {
        let text = text.to_string();
        self.with_element(element, move |el| {
            el.click()?;
            el.type_into(&text)?;
            Ok(())
        })
        .await
    }
}
