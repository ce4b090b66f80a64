use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::profanity::{CensorOptions, ProfanityFilter};

/// Reasons a username is rejected. Messages are the exact strings returned
/// to clients.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UsernameError {
    #[error("Invalid symbols in username")]
    InvalidSymbols,
    #[error("Username is too short.")]
    TooShort,
    #[error("Username is too long.")]
    TooLong,
    #[error("Username cannot have profanity.")]
    Profanity,
}

/// Validates a username. Checks run in a fixed order and the first failure
/// wins: symbols, then length bounds (6..=20 chars), then profanity
/// (whole-word, case-insensitive).
pub fn validate_username(
    username: &str,
    filter: &ProfanityFilter,
) -> Result<(), UsernameError> {
    lazy_static! {
        static ref INVALID_SYMBOLS: Regex = Regex::new(r"[\s_]").unwrap();
    }
    if INVALID_SYMBOLS.is_match(username) {
        return Err(UsernameError::InvalidSymbols);
    }
    let len = username.chars().count();
    if len < 6 {
        return Err(UsernameError::TooShort);
    }
    if len > 20 {
        return Err(UsernameError::TooLong);
    }
    if filter.is_profane(username, &CensorOptions::default()) {
        return Err(UsernameError::Profanity);
    }
    Ok(())
}
