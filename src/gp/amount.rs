//! Parsing of GP amounts typed by moderators.
//!
//! An amount is either a plain decimal number (`12`, `-1.25`, `1e4`) or a
//! compound sum such as `2da + 6p + 45`, where each suffix converts a count of
//! contributions into Guild Points.

use crate::error::ParseError;
use regex::Regex;
use std::sync::LazyLock;

pub const DUNGEON_SPRITE_ANIMATION_GP: f64 = 12 as f64 / 10.0;
pub const STARTER_SPRITE_ANIMATION_GP: f64 = 12 as f64 / 22.0;
pub const OTHER_SPRITE_ANIMATION_GP: f64 = 1.0;
pub const PORTRAIT_EMOTION_GP: f64 = 6 as f64 / 20.0;
pub const ASYM_PORTRAIT_EMOTION_GP: f64 = 2 as f64 / 20.0;
pub const SHINY_OR_RECOLOR_SPRITE_GP: f64 = 1.0;

static TERM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?<amount>[0-9]+)(?<suffix>da|sa|oa|p|ap|sr)?$")
        .expect("term regex is valid")
});

/// Parses a GP amount written in simple or compound syntax.
pub fn parse_gp_amount(text: &str) -> Result<f64, ParseError> {
    // Simple syntax. Non-finite values ("inf", "NaN") are not amounts.
    if let Ok(value) = text.trim().parse::<f64>() {
        if value.is_finite() {
            return Ok(value);
        }
    }

    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(ParseError::Empty);
    }
    if compact.ends_with('+') {
        return Err(ParseError::TrailingPlus);
    }

    let mut amount = 0.0;
    for term in compact.split('+') {
        amount += parse_term(term)?;
    }
    Ok(amount)
}

fn parse_term(term: &str) -> Result<f64, ParseError> {
    let captures = TERM_REGEX
        .captures(term)
        .ok_or_else(|| ParseError::InvalidTerm(term.to_string()))?;

    let count: i32 = captures["amount"]
        .parse()
        .map_err(|_| ParseError::OutOfRange(term.to_string()))?;
    let count = f64::from(count);

    let multiplier = match captures.name("suffix").map(|m| m.as_str()) {
        None => return Ok(count),
        Some("da") => DUNGEON_SPRITE_ANIMATION_GP,
        Some("sa") => STARTER_SPRITE_ANIMATION_GP,
        Some("oa") => OTHER_SPRITE_ANIMATION_GP,
        Some("p") => PORTRAIT_EMOTION_GP,
        Some("ap") => ASYM_PORTRAIT_EMOTION_GP,
        Some("sr") => SHINY_OR_RECOLOR_SPRITE_GP,
        Some(_) => return Err(ParseError::InvalidTerm(term.to_string())),
    };
    Ok(count * multiplier)
}
