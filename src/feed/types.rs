use serde::Serialize;
use std::fmt;
use tabled::Tabled;

use crate::engine::odds_to_probability;

/// Implied probability in [0, 1]. Serializes as a bare float.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Probability(pub f64);

impl Probability {
    pub fn from_american(odds: i32) -> Self {
        Self(odds_to_probability(odds))
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Whether a pick offers only one direction or both over and under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Scorcher,
    Both,
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineType::Scorcher => f.write_str("scorcher"),
            LineType::Both => f.write_str("both"),
        }
    }
}

/// One player-prop line as parsed from a props cell, before it is tied to a game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropLine {
    pub player: String,
    pub event: String,
    pub line: String,
    pub over: i32,
    pub under: i32,
}

/// Pinnacle player prop with implied probabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct OddsRecord {
    pub player: String,
    pub game: String,
    pub event: String,
    pub line: String,
    pub over: i32,
    pub under: i32,
    pub over_prob: Probability,
    pub under_prob: Probability,
}

impl OddsRecord {
    pub fn from_prop(prop: PropLine, game: &str) -> Self {
        Self {
            over_prob: Probability::from_american(prop.over),
            under_prob: Probability::from_american(prop.under),
            player: prop.player,
            game: game.to_string(),
            event: prop.event,
            line: prop.line,
            over: prop.over,
            under: prop.under,
        }
    }
}

/// Underdog pick'em line for a scheduled or live game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct GameLineRecord {
    pub player: String,
    pub game: String,
    pub time: String,
    pub line: String,
    pub event: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub kind: LineType,
}

/// An open Underdog bet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct BetRecord {
    pub player: String,
    pub game: String,
    pub time: String,
    pub line: String,
    pub event: String,
    #[serde(rename = "type")]
    #[tabled(rename = "type")]
    pub kind: LineType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_odds_record_from_prop() {
        let prop = PropLine {
            player: "LeBron James".to_string(),
            event: "Points".to_string(),
            line: "25.5".to_string(),
            over: 150,
            under: -150,
        };
        let rec = OddsRecord::from_prop(prop, "Lakers @ Celtics");
        assert_eq!(rec.game, "Lakers @ Celtics");
        assert!((rec.over_prob.0 - 0.4).abs() < 1e-12);
        assert!((rec.under_prob.0 - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_line_type_display_and_json() {
        assert_eq!(LineType::Scorcher.to_string(), "scorcher");
        assert_eq!(serde_json::to_string(&LineType::Both).unwrap(), "\"both\"");
    }

    #[test]
    fn test_game_line_serializes_type_key() {
        let rec = GameLineRecord {
            player: "Player A".to_string(),
            game: "Lakers vs Celtics".to_string(),
            time: "LIVE".to_string(),
            line: "24.5".to_string(),
            event: "Points".to_string(),
            kind: LineType::Both,
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["type"], "both");
        assert_eq!(json["time"], "LIVE");
    }

    #[test]
    fn test_probability_display() {
        assert_eq!(Probability(0.52381).to_string(), "0.524");
        assert_eq!(serde_json::to_string(&Probability(0.5)).unwrap(), "0.5");
    }
}
