//! Underdog Fantasy pick'em lines and open bets.
//!
//! The higher/lower listing interleaves player header rows with line cells;
//! both are read with one comma selector so document order is preserved.

use async_trait::async_trait;

use super::table::{SportOddsTable, Table};
use super::types::{BetRecord, GameLineRecord};
use super::{settle_sport, SportsbookScraper};
use crate::browser::{click_all, wait_for_elements, wait_for_more, Browser, BrowserError, Element};
use crate::config::{Credentials, UnderdogConfig, WaitPolicy};
use crate::diagnostic::SportSummary;
use crate::engine::parser::{parse_bet_block, GameLineParser, Parsed};

pub const PLATFORM: &str = "Underdog Fantasy";

const LOGIN_FIELD: &str = ".styles__field__OeiFa";
const SIGN_IN_BUTTON: &str = r#"button[data-testid="sign-in-button"]"#;
const SECTION_TOGGLE: &str = ".styles__toggleButton__jrfS7";
const PICK_ROWS: &str = ".styles__actualTopRow__qe0VJ, .styles__overUnderListCell__tbRod";
const LIVE_SECTION: &str = ".styles__topRow__q6gER";
const LIVE_RESULT_CELL: &str = ".styles__overUnderLiveResultCell__PXEQT";

pub struct UnderdogScraper<B> {
    browser: B,
    base_url: String,
    live_url: String,
    wait: WaitPolicy,
    odds_data: SportOddsTable<GameLineRecord>,
    authenticated: bool,
    current_bets: Option<Table<BetRecord>>,
}

impl<B: Browser> UnderdogScraper<B> {
    /// Take ownership of a browser and load the pick'em landing page, where
    /// the sign-in form lives.
    pub async fn open(browser: B, config: &UnderdogConfig, wait: WaitPolicy) -> Result<Self, BrowserError> {
        let mut scraper = Self {
            browser,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            live_url: config.live_url.clone(),
            wait,
            odds_data: SportOddsTable::new(),
            authenticated: false,
            current_bets: None,
        };
        scraper.browser.navigate(&scraper.base_url).await?;
        Ok(scraper)
    }

    pub fn sport_url(&self, sport: &str) -> String {
        format!("{}/{}", self.base_url, sport.trim_matches('/'))
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn browser(&self) -> &B {
        &self.browser
    }

    pub fn browser_mut(&mut self) -> &mut B {
        &mut self.browser
    }

    /// Latest open-bets snapshot, if one has been fetched.
    pub fn current_bets(&self) -> Option<&Table<BetRecord>> {
        self.current_bets.as_ref()
    }

    /// Sign in through the landing-page form. No-op once authenticated.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<(), BrowserError> {
        if self.authenticated {
            return Ok(());
        }
        wait_for_elements(&mut self.browser, LOGIN_FIELD, self.wait).await?;
        let username = self.browser.find_nth(LOGIN_FIELD, 0).await?;
        self.browser.type_text(&username, &credentials.username).await?;
        let password = self.browser.find_nth(LOGIN_FIELD, 1).await?;
        self.browser.type_text(&password, &credentials.password).await?;
        let submit = self.browser.find_nth(SIGN_IN_BUTTON, 0).await?;
        self.browser.click(&submit).await?;
        self.authenticated = true;
        tracing::info!("signed in to {}", PLATFORM);
        Ok(())
    }

    /// Load a sport's pick'em listing and wait for its rows to render.
    pub async fn navigate_to_page(&mut self, sport: &str) -> Result<Vec<Element>, BrowserError> {
        let url = self.sport_url(sport);
        self.browser.navigate(&url).await?;
        wait_for_elements(&mut self.browser, PICK_ROWS, self.wait).await
    }

    async fn scrape_sport(&mut self, sport: &str) -> Result<Vec<GameLineRecord>, BrowserError> {
        let collapsed = self.navigate_to_page(sport).await?.len();
        let expanded = click_all(&mut self.browser, SECTION_TOGGLE).await?;
        tracing::debug!(sport, expanded, "expanded pick'em sections");

        let rows = if expanded > 0 {
            wait_for_more(&mut self.browser, PICK_ROWS, collapsed, self.wait).await?
        } else {
            self.browser.find_elements(PICK_ROWS).await?
        };
        let mut parser = GameLineParser::new();
        Ok(parser.parse_all(rows.iter().map(|r| r.text.as_str())))
    }

    /// Replace the open-bets snapshot with what the live page shows now.
    pub async fn fetch_current_bets(&mut self) -> Result<&Table<BetRecord>, BrowserError> {
        let live_url = self.live_url.clone();
        self.browser.navigate(&live_url).await?;
        let cells = match wait_for_elements(&mut self.browser, LIVE_SECTION, self.wait).await {
            Ok(_) => {
                let shown = self.browser.find_elements(LIVE_RESULT_CELL).await?.len();
                if click_all(&mut self.browser, LIVE_SECTION).await? > 0 {
                    wait_for_more(&mut self.browser, LIVE_RESULT_CELL, shown, self.wait).await?
                } else {
                    self.browser.find_elements(LIVE_RESULT_CELL).await?
                }
            }
            Err(BrowserError::Timeout { .. }) => {
                tracing::info!("no open bets rendered");
                self.browser.find_elements(LIVE_RESULT_CELL).await?
            }
            Err(e) => return Err(e),
        };
        let mut bets = Vec::with_capacity(cells.len());
        for cell in &cells {
            match parse_bet_block(&cell.text) {
                Parsed::Record(bet) => bets.push(bet),
                Parsed::ToggleArtifact => {}
                Parsed::Unrecognized(e) => {
                    tracing::debug!(index = cell.index, error = %e, "skipping open-bet cell")
                }
            }
        }
        tracing::info!(count = bets.len(), "fetched open bets from {}", PLATFORM);
        Ok(&*self.current_bets.insert(Table::new(bets)))
    }
}

#[async_trait]
impl<B: Browser> SportsbookScraper for UnderdogScraper<B> {
    type Record = GameLineRecord;

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

    fn odds_table(&self) -> &SportOddsTable<GameLineRecord> {
        &self.odds_data
    }
}
