use ebrokerdj_api::{Market, Side};

use crate::error::NetflowError;
use crate::overlap::{Direction, OverlapMode, SortBy, DEFAULT_MIN_APPEAR};

pub const MAX_LOOKBACK_DAY: u32 = 60;
pub const MAX_BRANCH_ID_LENGTH: usize = 6;
pub const MAX_DESTINATION_LENGTH: usize = 64;
pub const MAX_PRESET_NAME_LENGTH: usize = 64;

/// Strip ASCII control characters (0x00-0x1F except space 0x20), trim whitespace,
/// and enforce a byte-length limit.
pub fn sanitize_text(input: &str, max_len: usize) -> Result<String, NetflowError> {
    if input.len() > max_len {
        return Err(NetflowError::InvalidInput(format!(
            "input exceeds maximum length of {} bytes",
            max_len
        )));
    }
    let sanitized: String = input
        .chars()
        .filter(|c| !c.is_ascii_control() || *c == ' ')
        .collect::<String>()
        .trim()
        .to_string();
    if sanitized.is_empty() {
        return Err(NetflowError::InvalidInput(
            "input is empty after sanitization".to_string(),
        ));
    }
    Ok(sanitized)
}

/// Validate a lookback day count (1..=60).
pub fn validate_day(day: u32) -> Result<u32, NetflowError> {
    if !(1..=MAX_LOOKBACK_DAY).contains(&day) {
        return Err(NetflowError::InvalidInput(format!(
            "day must be between 1 and {}, got {}",
            MAX_LOOKBACK_DAY, day
        )));
    }
    Ok(day)
}

/// Parse a comma-separated list of lookback days, e.g. `1,5`.
///
/// Order is kept and repeated days are dropped.
pub fn parse_days(input: &str) -> Result<Vec<u32>, NetflowError> {
    let mut days = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let day: u32 = part.parse().map_err(|_| {
            NetflowError::InvalidInput(format!("invalid day '{}'. Expected a number such as 1 or 5", part))
        })?;
        let day = validate_day(day)?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    if days.is_empty() {
        return Err(NetflowError::InvalidInput(
            "at least one day is required (e.g., 1,5)".to_string(),
        ));
    }
    Ok(days)
}

/// Validate a broker branch id: 1-6 ASCII alphanumerics.
pub fn validate_branch_id(input: &str) -> Result<String, NetflowError> {
    let trimmed = input.trim();
    if trimmed.is_empty()
        || trimmed.len() > MAX_BRANCH_ID_LENGTH
        || !trimmed.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(NetflowError::InvalidInput(format!(
            "invalid branch id '{}'. Expected 1-{} letters or digits (e.g., 1470)",
            input, MAX_BRANCH_ID_LENGTH
        )));
    }
    Ok(trimmed.to_string())
}

/// Validate a side string: B/S, case-insensitive, also buy/sell.
pub fn validate_side(input: &str) -> Result<Side, NetflowError> {
    match input.trim().to_lowercase().as_str() {
        "b" | "buy" => Ok(Side::Buy),
        "s" | "sell" => Ok(Side::Sell),
        _ => Err(NetflowError::InvalidInput(format!(
            "unknown side '{}'. Valid values: B (buy), S (sell)",
            input
        ))),
    }
}

pub fn validate_market(input: &str) -> Result<Market, NetflowError> {
    input.parse::<Market>().map_err(NetflowError::InvalidInput)
}

pub fn validate_min_appear(min_appear: usize) -> Result<usize, NetflowError> {
    if min_appear < DEFAULT_MIN_APPEAR {
        return Err(NetflowError::InvalidInput(format!(
            "min_appear must be at least {}, got {}",
            DEFAULT_MIN_APPEAR, min_appear
        )));
    }
    Ok(min_appear)
}

pub fn validate_mode(input: &str) -> Result<OverlapMode, NetflowError> {
    input.parse::<OverlapMode>().map_err(NetflowError::InvalidInput)
}

pub fn validate_sort(input: &str) -> Result<SortBy, NetflowError> {
    input.parse::<SortBy>().map_err(NetflowError::InvalidInput)
}

pub fn validate_direction(input: &str) -> Result<Direction, NetflowError> {
    input.parse::<Direction>().map_err(NetflowError::InvalidInput)
}

/// Validate a push destination (group, room or user id).
pub fn validate_destination(input: &str) -> Result<String, NetflowError> {
    let sanitized = sanitize_text(input, MAX_DESTINATION_LENGTH)?;
    if sanitized.contains(char::is_whitespace) {
        return Err(NetflowError::InvalidInput(format!(
            "destination '{}' must not contain whitespace",
            sanitized
        )));
    }
    Ok(sanitized)
}

pub fn validate_preset_name(input: &str) -> Result<String, NetflowError> {
    sanitize_text(input, MAX_PRESET_NAME_LENGTH)
}
