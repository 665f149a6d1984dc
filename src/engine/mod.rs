pub mod odds;
pub mod parser;

pub use odds::{odds_to_probability, parse_american_odds};
pub use parser::{GameLineParser, ParseError, Parsed};
