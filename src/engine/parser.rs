//! Record reconstruction from rendered sportsbook text.
//!
//! Each element's visible text arrives as one newline-delimited block. The
//! parsers here turn blocks into records by recognizable tokens (a "Hide"
//! marker, "Yes"/"No" toggle labels, digit-leading rows) and report every
//! block's outcome as a [`Parsed`] variant, so callers can log what was
//! dropped instead of losing it silently.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

use super::odds::parse_american_odds;
use crate::feed::types::{BetRecord, GameLineRecord, LineType, PropLine};

static PARENTHESIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\((.*?)\)").expect("static regex"));

const TOGGLE_LABELS: [&str; 2] = ["Yes", "No"];
const HIDE_MARKER: &str = "Hide";
const LIVE: &str = "LIVE";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("empty text block")]
    Empty,
    #[error("missing field {index}")]
    MissingField { index: usize },
    #[error("no parenthesized event")]
    MissingEvent,
    #[error("invalid odds '{0}'")]
    InvalidOdds(String),
    #[error("line row before any header row")]
    NoContext,
    #[error("malformed line text '{0}'")]
    MalformedLine(String),
    #[error("malformed game info '{0}'")]
    MalformedGame(String),
}

/// Outcome of parsing one text block.
#[derive(Debug, Clone, PartialEq)]
pub enum Parsed<T> {
    Record(T),
    /// A Yes/No toggle control rendered in the same cell style as a line.
    ToggleArtifact,
    Unrecognized(ParseError),
}

impl<T> Parsed<T> {
    pub fn record(self) -> Option<T> {
        match self {
            Parsed::Record(r) => Some(r),
            _ => None,
        }
    }
}

impl<T> From<Result<T, ParseError>> for Parsed<T> {
    fn from(result: Result<T, ParseError>) -> Self {
        match result {
            Ok(r) => Parsed::Record(r),
            Err(e) => Parsed::Unrecognized(e),
        }
    }
}

fn field<'a>(fields: &[&'a str], index: usize) -> Result<&'a str, ParseError> {
    fields
        .get(index)
        .copied()
        .ok_or(ParseError::MissingField { index })
}

fn trimmed_lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).collect()
}

fn starts_with_digit(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_digit())
}

fn without_last_char(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next_back();
    chars.as_str()
}

// ── Player props ──────────────────────────────────────────────────────

/// Parse one Pinnacle player-prop cell.
///
/// Without a "Hide" control the cell reads
/// `player (event)` / `Over <line> <event>` / over price / `Under ...` / under price.
/// A "Hide" control adds one line after the player, shifting everything by one.
pub fn parse_prop_block(text: &str) -> Parsed<PropLine> {
    let paren_event = PARENTHESIZED
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    let stripped = PARENTHESIZED.replace_all(text, "");
    let raw: Vec<&str> = stripped.lines().collect();
    let fields: Vec<&str> = raw.iter().map(|f| f.trim()).collect();

    let is_toggle = [1, 2]
        .iter()
        .filter_map(|&i| fields.get(i))
        .any(|f| TOGGLE_LABELS.contains(f));
    if is_toggle {
        return Parsed::ToggleArtifact;
    }

    build_prop(&stripped, &raw, &fields, paren_event).into()
}

fn build_prop(
    stripped: &str,
    raw: &[&str],
    fields: &[&str],
    paren_event: Option<String>,
) -> Result<PropLine, ParseError> {
    let first = raw.first().copied().filter(|f| !f.trim().is_empty()).ok_or(ParseError::Empty)?;
    // trailing char is the ':' or the space left where "(event)" was cut
    let player = without_last_char(first).trim().to_string();
    let mut event = paren_event.ok_or(ParseError::MissingEvent)?;

    let (line_at, over_at, under_at) = if stripped.contains(HIDE_MARKER) {
        (2, 3, 5)
    } else {
        (1, 2, 4)
    };

    let line_text = field(fields, line_at)?;
    let parts: Vec<&str> = line_text.splitn(3, ' ').collect();
    let line = parts
        .get(1)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ParseError::MalformedLine(line_text.to_string()))?
        .to_string();
    if let Some(partial) = parts.get(2).map(|p| p.trim()).filter(|p| !p.is_empty()) {
        event = partial.to_string();
    }

    let over_text = field(fields, over_at)?;
    let under_text = field(fields, under_at)?;
    let over = parse_american_odds(over_text)
        .ok_or_else(|| ParseError::InvalidOdds(over_text.to_string()))?;
    let under = parse_american_odds(under_text)
        .ok_or_else(|| ParseError::InvalidOdds(under_text.to_string()))?;

    Ok(PropLine {
        player,
        event,
        line,
        over,
        under,
    })
}

/// Parse a batch of prop cells, logging and dropping everything that is not a line.
pub fn collect_props<'a, I>(blocks: I) -> Vec<PropLine>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut props = Vec::new();
    for (index, text) in blocks.into_iter().enumerate() {
        match parse_prop_block(text) {
            Parsed::Record(prop) => props.push(prop),
            Parsed::ToggleArtifact => tracing::trace!(index, "skipping toggle control"),
            Parsed::Unrecognized(e @ ParseError::InvalidOdds(_)) => {
                tracing::warn!(index, error = %e, "dropping prop with unreadable odds")
            }
            Parsed::Unrecognized(e) => tracing::debug!(index, error = %e, "not a prop line"),
        }
    }
    props
}

// ── Pick'em game lines ────────────────────────────────────────────────

/// Player/game/time from the most recent header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderContext {
    pub player: String,
    pub game: String,
    pub time: String,
}

/// Outcome of feeding one block to a [`GameLineParser`].
#[derive(Debug, Clone, PartialEq)]
pub enum GameRow {
    /// Header replaced the carried context; nothing emitted.
    Header,
    Line(GameLineRecord),
    Unrecognized(ParseError),
}

/// State machine over alternating header and cell rows.
///
/// Text-leading blocks are headers and set the carried context; digit-leading
/// blocks are cells and emit one record under the current context.
#[derive(Debug, Default)]
pub struct GameLineParser {
    context: Option<HeaderContext>,
}

impl GameLineParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(&self) -> Option<&HeaderContext> {
        self.context.as_ref()
    }

    pub fn feed(&mut self, text: &str) -> GameRow {
        let fields = trimmed_lines(text);
        let Some(&first) = fields.first().filter(|f| !f.is_empty()) else {
            return GameRow::Unrecognized(ParseError::Empty);
        };

        if starts_with_digit(first) {
            match self.cell(&fields) {
                Ok(record) => GameRow::Line(record),
                Err(e) => GameRow::Unrecognized(e),
            }
        } else {
            match header(&fields) {
                Ok(ctx) => {
                    self.context = Some(ctx);
                    GameRow::Header
                }
                Err(e) => GameRow::Unrecognized(e),
            }
        }
    }

    fn cell(&self, fields: &[&str]) -> Result<GameLineRecord, ParseError> {
        let ctx = self.context.as_ref().ok_or(ParseError::NoContext)?;
        let (line, event) = fields[0]
            .split_once(' ')
            .map(|(l, e)| (l, e.trim()))
            .filter(|(_, e)| !e.is_empty())
            .ok_or_else(|| ParseError::MalformedLine(fields[0].to_string()))?;

        // A single-line cell has no option buttons; judge by its event text.
        let last = if fields.len() > 1 { fields[fields.len() - 1] } else { event };
        let kind = if starts_with_digit(last) {
            LineType::Scorcher
        } else {
            LineType::Both
        };

        Ok(GameLineRecord {
            player: ctx.player.clone(),
            game: ctx.game.clone(),
            time: ctx.time.clone(),
            line: line.to_string(),
            event: event.to_string(),
            kind,
        })
    }

    /// Feed every block in order and return the emitted records.
    pub fn parse_all<'a, I>(&mut self, blocks: I) -> Vec<GameLineRecord>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut lines = Vec::new();
        for (index, text) in blocks.into_iter().enumerate() {
            match self.feed(text) {
                GameRow::Line(record) => lines.push(record),
                GameRow::Header => {}
                GameRow::Unrecognized(e) => tracing::debug!(index, error = %e, "skipping pick'em row"),
            }
        }
        lines
    }
}

fn header(fields: &[&str]) -> Result<HeaderContext, ParseError> {
    let player = field(fields, 0)?;
    let game = field(fields, 1)?;
    // live games show no start time
    let time = if fields.len() == 2 { LIVE } else { fields[2] };
    Ok(HeaderContext {
        player: player.to_string(),
        game: game.to_string(),
        time: time.to_string(),
    })
}

// ── Open bets ─────────────────────────────────────────────────────────

/// Parse one open-bet cell: player / `<pick> <line> <event...>` / `<game> - <time>`.
pub fn parse_bet_block(text: &str) -> Parsed<BetRecord> {
    build_bet(&trimmed_lines(text)).into()
}

fn build_bet(fields: &[&str]) -> Result<BetRecord, ParseError> {
    if fields.first().map_or(true, |f| f.is_empty()) {
        return Err(ParseError::Empty);
    }
    let player = field(fields, 0)?;
    let line_text = field(fields, 1)?;
    let game_info = field(fields, 2)?;

    let tokens: Vec<&str> = line_text.split(' ').collect();
    let line = tokens
        .get(1)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ParseError::MalformedLine(line_text.to_string()))?;
    let event = tokens[2..].join(" ");

    let (game, time) = game_info
        .split_once(" - ")
        .ok_or_else(|| ParseError::MalformedGame(game_info.to_string()))?;

    Ok(BetRecord {
        player: player.to_string(),
        game: game.trim().to_string(),
        time: time.trim().to_string(),
        line: line.to_string(),
        event,
        kind: LineType::Both,
    })
}
