/// Convert American odds to implied probability.
///
/// The book's margin is left in: the two sides of a market will usually sum
/// to more than 1.
pub fn odds_to_probability(odds: i32) -> f64 {
    let odds = f64::from(odds);
    if odds > 0.0 {
        100.0 / (odds + 100.0)
    } else {
        let abs = odds.abs();
        abs / (abs + 100.0)
    }
}

/// Parse an American odds string: "-150", "+130", "EVEN" (= +100).
/// Zero is not a valid price and is rejected.
pub fn parse_american_odds(s: &str) -> Option<i32> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("EVEN") {
        return Some(100);
    }
    // Books render the minus sign as U+2212 on some pages
    let normalized = s.replace('\u{2212}', "-");
    match normalized.parse::<i32>() {
        Ok(0) | Err(_) => None,
        Ok(v) => Some(v),
    }
}
