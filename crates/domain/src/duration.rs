//! Parsing of timer durations such as `"10s"`, `"1m30s"` or `"1.5h"`.
//!
//! The accepted grammar is a sequence of decimal numbers, each followed by
//! a unit (`ns`, `us`, `µs`, `ms`, `s`, `m`, `h`). A bare `"0"` is also
//! accepted. Negative durations are rejected.

use std::time::Duration;

use crate::error::ValidationError;

const UNITS: &[(&str, f64)] = &[
    ("ns", 1e-9),
    ("us", 1e-6),
    ("µs", 1e-6),
    ("ms", 1e-3),
    ("s", 1.0),
    ("m", 60.0),
    ("h", 3600.0),
];

/// Parse a timer duration string.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDuration`] if the string is empty,
/// negative, missing a unit, or uses an unknown unit.
pub fn parse(input: &str) -> Result<Duration, ValidationError> {
    let invalid = || ValidationError::InvalidDuration(input.to_string());
    let text = input.trim();
    if text.is_empty() || text.starts_with('-') {
        return Err(invalid());
    }
    let text = text.strip_prefix('+').unwrap_or(text);
    if text == "0" {
        return Ok(Duration::ZERO);
    }

    let mut rest = text;
    let mut total = 0.0_f64;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .ok_or_else(invalid)?;
        if number_len == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_len].parse().map_err(|_| invalid())?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        let scale = UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, scale)| *scale)
            .ok_or_else(invalid)?;
        total += value * scale;
        rest = &rest[unit_len..];
    }

    Duration::try_from_secs_f64(total).map_err(|_| invalid())
}
