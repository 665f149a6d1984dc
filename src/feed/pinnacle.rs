//! Pinnacle player props, scraped from the rendered matchup pages.
//!
//! Listing: {base}/{sport}/matchups/ with one metadata row per game. Each game
//! row opens the event page, whose `#player-props` tab lists one cell per prop.

use async_trait::async_trait;

use super::table::SportOddsTable;
use super::types::OddsRecord;
use super::{settle_sport, SportsbookScraper};
use crate::browser::{wait_for_elements, wait_for_url, Browser, BrowserError, Element};
use crate::config::{PinnacleConfig, WaitPolicy};
use crate::diagnostic::SportSummary;
use crate::engine::parser::collect_props;

pub const PLATFORM: &str = "Pinnacle";

const ODDS_FORMAT_BUTTON: &str = ".style_button__2bncQ";
const AMERICAN_ODDS_OPTION: &str = ".style_not-selected__1pD9N";
const GAME_ROW: &str = ".style_metadata__3MrIC";
const PROP_CELL: &str = ".style_primary__uMCOh";

/// Each game visit leaves the event page and its props tab in history.
const MAX_BACK_STEPS: usize = 3;

const ALL_MARKETS_FRAGMENT: &str = "#all";
const PLAYER_PROPS_FRAGMENT: &str = "#player-props";

/// Event URL for the player-props tab of the event page at `url`.
fn player_props_url(url: &str) -> String {
    if url.contains(ALL_MARKETS_FRAGMENT) {
        url.replace(ALL_MARKETS_FRAGMENT, PLAYER_PROPS_FRAGMENT)
    } else {
        let base = url.split('#').next().unwrap_or(url);
        format!("{}{}", base, PLAYER_PROPS_FRAGMENT)
    }
}

fn same_page(a: &str, b: &str) -> bool {
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

/// "<away> @ <home>" from a metadata row, or None for single-line rows
/// (section headers, not games).
fn game_label(row: &Element) -> Option<String> {
    match row.lines().as_slice() {
        [away, home, ..] => Some(format!("{} @ {}", away.trim(), home.trim())),
        _ => None,
    }
}

pub struct PinnacleScraper<B> {
    browser: B,
    base_url: String,
    wait: WaitPolicy,
    odds_data: SportOddsTable<OddsRecord>,
    converted_odds: bool,
}

impl<B: Browser> PinnacleScraper<B> {
    pub fn new(browser: B, config: &PinnacleConfig, wait: WaitPolicy) -> Self {
        Self {
            browser,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            wait,
            odds_data: SportOddsTable::new(),
            converted_odds: false,
        }
    }

    pub fn sport_url(&self, sport: &str) -> String {
        format!("{}/{}/matchups/", self.base_url, sport.trim_matches('/'))
    }

    pub fn converted_odds(&self) -> bool {
        self.converted_odds
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    /// Load a sport's listing and wait for its game rows to render.
    pub async fn navigate_to_page(&mut self, sport: &str) -> Result<Vec<Element>, BrowserError> {
        let url = self.sport_url(sport);
        self.browser.navigate(&url).await?;
        wait_for_elements(&mut self.browser, GAME_ROW, self.wait).await
    }

    /// Switch the site to American odds. Runs the clicks at most once per
    /// scraper; returns whether they ran this call.
    pub async fn ensure_american_odds(&mut self) -> Result<bool, BrowserError> {
        if self.converted_odds {
            return Ok(false);
        }
        let button = self.browser.find_nth(ODDS_FORMAT_BUTTON, 0).await?;
        self.browser.click(&button).await?;
        let options = wait_for_elements(&mut self.browser, AMERICAN_ODDS_OPTION, self.wait).await?;
        self.browser.click(&options[0]).await?;
        self.converted_odds = true;
        tracing::debug!("switched odds format to American");
        Ok(true)
    }

    async fn scrape_sport(&mut self, sport: &str) -> Result<Vec<OddsRecord>, BrowserError> {
        let listing = self.sport_url(sport);
        let game_count = self.navigate_to_page(sport).await?.len();

        if let Err(e) = self.ensure_american_odds().await {
            tracing::warn!(error = %e, "could not switch to American odds");
        }

        let mut records = Vec::new();
        for index in 0..game_count {
            // Re-find rows every pass; the previous pass left the page.
            let row = match self.browser.find_nth(GAME_ROW, index).await {
                Ok(row) => row,
                Err(e) => {
                    tracing::debug!(sport, index, error = %e, "game row gone");
                    continue;
                }
            };
            let Some(game) = game_label(&row) else {
                continue;
            };

            match self.scrape_game(&row, &game).await {
                Ok(props) => {
                    tracing::info!(sport, game = %game, count = props.len(), "scraped player props");
                    records.extend(props);
                }
                Err(e) => tracing::info!(sport, game = %game, error = %e, "no player props found"),
            }

            if let Err(e) = self.return_to_listing(&listing).await {
                tracing::warn!(sport, error = %e, "lost the game listing, stopping early");
                break;
            }
        }
        Ok(records)
    }

    /// Open a game's player-props tab and parse every prop cell.
    async fn scrape_game(&mut self, row: &Element, game: &str) -> Result<Vec<OddsRecord>, BrowserError> {
        let listing = self.browser.current_url().await?;
        self.browser.click(row).await?;
        let event_url = wait_for_url(&mut self.browser, self.wait, |url| !same_page(url, &listing)).await?;
        self.browser.navigate(&player_props_url(&event_url)).await?;
        let cells = wait_for_elements(&mut self.browser, PROP_CELL, self.wait).await?;

        Ok(collect_props(cells.iter().map(|c| c.text.as_str()))
            .into_iter()
            .map(|prop| OddsRecord::from_prop(prop, game))
            .collect())
    }

    /// History back to the listing; reload it directly if back lands elsewhere.
    async fn return_to_listing(&mut self, listing: &str) -> Result<(), BrowserError> {
        match self.back_to(listing).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("history back missed the listing, reloading");
                self.browser.navigate(listing).await?;
            }
            Err(e) => {
                tracing::debug!(error = %e, "history back failed, reloading the listing");
                self.browser.navigate(listing).await?;
            }
        }
        wait_for_elements(&mut self.browser, GAME_ROW, self.wait).await?;
        Ok(())
    }

    /// Step back through history until `listing` is the current page.
    async fn back_to(&mut self, listing: &str) -> Result<bool, BrowserError> {
        let mut url = self.browser.current_url().await?;
        for _ in 0..MAX_BACK_STEPS {
            if same_page(&url, listing) {
                return Ok(true);
            }
            self.browser.go_back().await?;
            let left = url;
            url = wait_for_url(&mut self.browser, self.wait, |u| u != left).await?;
        }
        Ok(same_page(&url, listing))
    }
}

#[async_trait]
impl<B: Browser> SportsbookScraper for PinnacleScraper<B> {
    type Record = OddsRecord;

    fn platform(&self) -> &'static str {
        PLATFORM
    }

    async fn scrape_odds(&mut self, sports: &[String]) -> Vec<SportSummary> {
        let mut summaries = Vec::with_capacity(sports.len());
        for sport in sports {
            let outcome = self.scrape_sport(sport).await;
            summaries.push(settle_sport(&mut self.odds_data, PLATFORM, sport, outcome));
        }
        summaries
    }

    fn odds_table(&self) -> &SportOddsTable<OddsRecord> {
        &self.odds_data
    }
}
