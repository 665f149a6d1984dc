pub mod pinnacle;
pub mod table;
pub mod types;
pub mod underdog;

use async_trait::async_trait;

use crate::browser::BrowserError;
use crate::diagnostic::SportSummary;
use table::SportOddsTable;

#[async_trait]
pub trait SportsbookScraper: Send {
    type Record: Send;

    fn platform(&self) -> &'static str;

    /// Scrape each sport in order, replacing its entry in [`Self::odds_table`].
    /// A sport that fails is recorded as checked-with-nothing and the loop moves on.
    async fn scrape_odds(&mut self, sports: &[String]) -> Vec<SportSummary>;

    fn odds_table(&self) -> &SportOddsTable<Self::Record>;
}

/// Fold one sport's scrape outcome into the session table.
///
/// Content that never rendered counts as "no events"; any other browser
/// failure is reported as a failed sport.
pub(crate) fn settle_sport<R>(
    table: &mut SportOddsTable<R>,
    platform: &str,
    sport: &str,
    outcome: Result<Vec<R>, BrowserError>,
) -> SportSummary {
    match outcome {
        Ok(rows) => table.record(platform, sport, rows),
        Err(BrowserError::Timeout { selector, waited_ms }) => {
            tracing::info!(platform, sport, selector = %selector, waited_ms, "no content rendered");
            table.record(platform, sport, Vec::new())
        }
        Err(e) => table.mark_failed(platform, sport, &format!("{:#}", anyhow::Error::from(e))),
    }
}
