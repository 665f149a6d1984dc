// Scripted in-memory browser for driving the scrapers in tests

#![allow(dead_code)]

use async_trait::async_trait;
use sportsbook_scraper::browser::{Browser, BrowserError, Element};
use sportsbook_scraper::config::WaitPolicy;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Short enough that waiting on content that never renders stays cheap.
pub fn fast_wait() -> WaitPolicy {
    WaitPolicy {
        timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(1),
    }
}

#[derive(Debug, Default)]
pub struct Page {
    elements: HashMap<String, Vec<String>>,
    links: HashMap<(String, usize), (String, Duration)>,
    expansions: HashMap<String, (String, Vec<String>, Duration)>,
}

impl Page {
    pub fn with(&mut self, selector: &str, texts: &[&str]) -> &mut Self {
        self.elements.insert(
            selector.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Clicking the `index`-th match of `selector` loads `url`.
    pub fn link(&mut self, selector: &str, index: usize, url: &str) -> &mut Self {
        self.slow_link(selector, index, url, Duration::ZERO)
    }

    /// Like `link`, but the address changes only `delay` after the click.
    pub fn slow_link(&mut self, selector: &str, index: usize, url: &str, delay: Duration) -> &mut Self {
        self.links
            .insert((selector.to_string(), index), (url.to_string(), delay));
        self
    }

    /// Clicking any match of `toggle` adds `texts` to `target` after `delay`.
    pub fn expands(&mut self, toggle: &str, target: &str, texts: &[&str], delay: Duration) -> &mut Self {
        self.expansions.insert(
            toggle.to_string(),
            (
                target.to_string(),
                texts.iter().map(|t| t.to_string()).collect(),
                delay,
            ),
        );
        self
    }
}

#[derive(Debug)]
enum Effect {
    Load(String),
    Append {
        url: String,
        selector: String,
        texts: Vec<String>,
    },
}

#[derive(Debug, Default)]
pub struct ScriptedBrowser {
    pages: HashMap<String, Page>,
    failing: HashSet<String>,
    history: Vec<String>,
    pending: Vec<(Instant, Effect)>,
    pub navigations: Vec<String>,
    pub clicks: Vec<(String, usize)>,
    pub typed: Vec<(String, usize, String)>,
}

impl ScriptedBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&mut self, url: &str) -> &mut Page {
        self.pages.entry(url.to_string()).or_default()
    }

    pub fn fail_navigation(&mut self, url: &str) {
        self.failing.insert(url.to_string());
    }

    pub fn clicks_on(&self, selector: &str) -> usize {
        self.clicks.iter().filter(|(s, _)| s == selector).count()
    }

    fn load(&mut self, url: &str) -> Result<(), BrowserError> {
        self.navigations.push(url.to_string());
        if self.failing.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                source: anyhow::anyhow!("net::ERR_CONNECTION_REFUSED"),
            });
        }
        self.history.push(url.to_string());
        Ok(())
    }

    fn apply(&mut self, effect: Effect) -> Result<(), BrowserError> {
        match effect {
            Effect::Load(url) => self.load(&url),
            Effect::Append { url, selector, texts } => {
                self.page(&url)
                    .elements
                    .entry(selector)
                    .or_default()
                    .extend(texts);
                Ok(())
            }
        }
    }

    fn schedule(&mut self, delay: Duration, effect: Effect) -> Result<(), BrowserError> {
        if delay.is_zero() {
            self.apply(effect)
        } else {
            self.pending.push((Instant::now() + delay, effect));
            Ok(())
        }
    }

    /// Apply every delayed effect whose time has come.
    fn settle(&mut self) -> Result<(), BrowserError> {
        let now = Instant::now();
        let (due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|(at, _)| *at <= now);
        self.pending = waiting;
        for (_, effect) in due {
            self.apply(effect)?;
        }
        Ok(())
    }

    fn current(&self) -> Option<&Page> {
        self.history.last().and_then(|url| self.pages.get(url))
    }

    fn ensure_present(&self, element: &Element) -> Result<(), BrowserError> {
        let present = self
            .current()
            .and_then(|p| p.elements.get(&element.selector))
            .is_some_and(|matches| element.index < matches.len());
        if present {
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
impl Browser for ScriptedBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.pending.clear();
        self.load(url)
    }

    async fn current_url(&mut self) -> Result<String, BrowserError> {
        self.settle()?;
        Ok(self
            .history
            .last()
            .cloned()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn go_back(&mut self) -> Result<(), BrowserError> {
        if self.history.len() > 1 {
            self.history.pop();
        }
        Ok(())
    }

    async fn find_elements(&mut self, selector: &str) -> Result<Vec<Element>, BrowserError> {
        self.settle()?;
        Ok(self
            .current()
            .and_then(|p| p.elements.get(selector))
            .map(|texts| {
                texts
                    .iter()
                    .enumerate()
                    .map(|(i, t)| Element::new(selector, i, t.as_str()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn click(&mut self, element: &Element) -> Result<(), BrowserError> {
        self.ensure_present(element)?;
        self.clicks.push((element.selector.clone(), element.index));
        let Some(here) = self.history.last().cloned() else {
            return Ok(());
        };
        let link = self
            .current()
            .and_then(|p| p.links.get(&(element.selector.clone(), element.index)))
            .cloned();
        let expansion = self
            .current()
            .and_then(|p| p.expansions.get(&element.selector))
            .cloned();
        if let Some((url, delay)) = link {
            self.schedule(delay, Effect::Load(url))?;
        }
        if let Some((selector, texts, delay)) = expansion {
            let effect = Effect::Append { url: here, selector, texts };
            self.schedule(delay, effect)?;
        }
        Ok(())
    }

    async fn type_text(&mut self, element: &Element, text: &str) -> Result<(), BrowserError> {
        self.ensure_present(element)?;
        self.typed
            .push((element.selector.clone(), element.index, text.to_string()));
        Ok(())
    }
}
