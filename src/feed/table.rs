use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use tabled::Tabled;

use crate::diagnostic::{SportStatus, SportSummary};

/// Like-shaped records from one scrape, in page order.
#[derive(Debug, Clone, Serialize)]
pub struct Table<R> {
    pub rows: Vec<R>,
    pub scraped_at: DateTime<Utc>,
}

impl<R> Table<R> {
    pub fn new(rows: Vec<R>) -> Self {
        Self {
            rows,
            scraped_at: Utc::now(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.rows.iter()
    }
}

impl<R: Tabled> Table<R> {
    pub fn render(&self) -> String {
        tabled::Table::new(&self.rows).to_string()
    }
}

/// Per-sport results for one scraper session.
///
/// A sport maps to `None` once it has been checked and nothing was found;
/// sports that were never checked have no entry. Each scrape replaces the
/// sport's entry wholesale.
#[derive(Debug, Clone)]
pub struct SportOddsTable<R> {
    entries: BTreeMap<String, Option<Table<R>>>,
}

impl<R> Default for SportOddsTable<R> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<R> SportOddsTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a sport's records and describe the result.
    pub fn record(&mut self, platform: &str, sport: &str, rows: Vec<R>) -> SportSummary {
        let status = if rows.is_empty() {
            self.entries.insert(sport.to_string(), None);
            SportStatus::NoEvents
        } else {
            let count = rows.len();
            self.entries.insert(sport.to_string(), Some(Table::new(rows)));
            SportStatus::Found(count)
        };
        let summary = SportSummary::new(platform, sport, status);
        tracing::info!(platform, sport, "{}", summary);
        summary
    }

    /// Mark a sport checked after its page could not be scraped.
    pub fn mark_failed(&mut self, platform: &str, sport: &str, reason: &str) -> SportSummary {
        self.entries.insert(sport.to_string(), None);
        let summary = SportSummary::new(platform, sport, SportStatus::Failed(reason.to_string()));
        tracing::warn!(platform, sport, "{}", summary);
        summary
    }

    /// `None`: never checked. `Some(None)`: checked, nothing found.
    pub fn get(&self, sport: &str) -> Option<Option<&Table<R>>> {
        self.entries.get(sport).map(Option::as_ref)
    }

    pub fn was_checked(&self, sport: &str) -> bool {
        self.entries.contains_key(sport)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&Table<R>>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rows_stores_none() {
        let mut table: SportOddsTable<u32> = SportOddsTable::new();
        let summary = table.record("Pinnacle", "basketball/nba", Vec::new());
        assert_eq!(summary.status, SportStatus::NoEvents);
        assert!(table.was_checked("basketball/nba"));
        assert!(matches!(table.get("basketball/nba"), Some(None)));
    }

    #[test]
    fn test_unchecked_sport_is_absent() {
        let table: SportOddsTable<u32> = SportOddsTable::new();
        assert!(table.get("hockey/nhl").is_none());
        assert!(!table.was_checked("hockey/nhl"));
    }

    #[test]
    fn test_record_overwrites_previous_scrape() {
        let mut table = SportOddsTable::new();
        table.record("Pinnacle", "nba", vec![1, 2, 3]);
        assert_eq!(table.get("nba").unwrap().unwrap().len(), 3);

        let summary = table.record("Pinnacle", "nba", vec![9]);
        assert_eq!(summary.status, SportStatus::Found(1));
        assert_eq!(table.get("nba").unwrap().unwrap().rows, vec![9]);

        table.record("Pinnacle", "nba", Vec::new());
        assert!(matches!(table.get("nba"), Some(None)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_duplicates_kept() {
        let mut table = SportOddsTable::new();
        table.record("Underdog Fantasy", "nba", vec!["a", "a"]);
        assert_eq!(table.get("nba").unwrap().unwrap().len(), 2);
    }

    #[test]
    fn test_mark_failed() {
        let mut table: SportOddsTable<u32> = SportOddsTable::new();
        table.record("Pinnacle", "nba", vec![1]);
        let summary = table.mark_failed("Pinnacle", "nba", "navigation failed");
        assert!(matches!(summary.status, SportStatus::Failed(_)));
        assert!(matches!(table.get("nba"), Some(None)));
    }

    #[derive(Tabled)]
    struct Row {
        player: &'static str,
        line: f64,
    }

    #[test]
    fn test_render() {
        let table = Table::new(vec![Row { player: "Player A", line: 24.5 }]);
        let text = table.render();
        assert!(text.contains("player"));
        assert!(text.contains("Player A"));
        assert!(text.contains("24.5"));
    }
}
