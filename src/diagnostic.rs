// Per-sport diagnostics and result printing

use serde::Serialize;
use std::fmt;
use tabled::Tabled;

use crate::feed::table::{SportOddsTable, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SportStatus {
    Found(usize),
    NoEvents,
    Failed(String),
}

/// One diagnostic line per scraped sport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SportSummary {
    pub platform: String,
    pub sport: String,
    pub status: SportStatus,
}

impl SportSummary {
    pub fn new(platform: &str, sport: &str, status: SportStatus) -> Self {
        Self {
            platform: platform.to_string(),
            sport: sport.to_string(),
            status,
        }
    }
}

impl fmt::Display for SportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.status {
            SportStatus::Found(n) => write!(
                f,
                "Found {} upcoming {} events on {}.",
                n, self.sport, self.platform
            ),
            SportStatus::NoEvents => write!(
                f,
                "Couldn't find any upcoming {} events on {}",
                self.sport, self.platform
            ),
            SportStatus::Failed(reason) => write!(
                f,
                "No data found for {} on {}: {}",
                self.sport, self.platform, reason
            ),
        }
    }
}

/// Output mode for scrape results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

/// Format one table in the chosen mode.
pub fn format_table<R: Tabled + Serialize>(table: &Table<R>, mode: OutputMode) -> anyhow::Result<String> {
    match mode {
        OutputMode::Table => {
            if table.is_empty() {
                Ok("(no results)".to_string())
            } else {
                Ok(table.render())
            }
        }
        OutputMode::Json => Ok(serde_json::to_string_pretty(&table.rows)?),
    }
}

/// Print every checked sport of a session, with a heading per sport.
pub fn print_sports<R: Tabled + Serialize>(
    platform: &str,
    odds: &SportOddsTable<R>,
    mode: OutputMode,
) -> anyhow::Result<()> {
    for (sport, entry) in odds.iter() {
        println!();
        println!("  {} / {}", platform, sport);
        match entry {
            Some(table) => println!("{}", format_table(table, mode)?),
            None => println!("(no events)"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::types::{GameLineRecord, LineType};

    #[test]
    fn test_summary_lines() {
        let found = SportSummary::new("Pinnacle", "basketball/nba", SportStatus::Found(12));
        assert_eq!(found.to_string(), "Found 12 upcoming basketball/nba events on Pinnacle.");

        let none = SportSummary::new("Underdog Fantasy", "nhl", SportStatus::NoEvents);
        assert_eq!(
            none.to_string(),
            "Couldn't find any upcoming nhl events on Underdog Fantasy"
        );

        let failed = SportSummary::new("Pinnacle", "nba", SportStatus::Failed("timed out".into()));
        assert!(failed.to_string().ends_with(": timed out"));
    }

    #[test]
    fn test_format_table_json() {
        let table = Table::new(vec![GameLineRecord {
            player: "Player A".to_string(),
            game: "LAL @ BOS".to_string(),
            time: "7:00 PM".to_string(),
            line: "24.5".to_string(),
            event: "Points".to_string(),
            kind: LineType::Scorcher,
        }]);
        let json = format_table(&table, OutputMode::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["type"], "scorcher");
        assert_eq!(parsed[0]["player"], "Player A");
    }

    #[test]
    fn test_format_empty_table() {
        let table: Table<GameLineRecord> = Table::new(Vec::new());
        assert_eq!(format_table(&table, OutputMode::Table).unwrap(), "(no results)");
    }

    #[test]
    fn test_output_mode_flag() {
        assert_eq!(OutputMode::from_json_flag(true), OutputMode::Json);
        assert_eq!(OutputMode::from_json_flag(false), OutputMode::Table);
    }
}
