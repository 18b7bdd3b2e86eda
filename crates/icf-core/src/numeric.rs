//! Locale-aware number parsing for user-entered hours and durations.
//!
//! Coaches paste values from spreadsheets in both EU (`1.234,5`) and
//! US (`1,234.5`) formats. `NumberLocale::Auto` guesses from the separators.

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Which decimal convention to assume when parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberLocale {
    /// Infer from the separators present.
    #[default]
    Auto,
    /// `.` groups thousands, `,` is the decimal separator.
    Eu,
    /// `,` groups thousands, `.` is the decimal separator.
    Us,
}

/// Parse a decimal number written in EU or US notation.
///
/// Whitespace, non-breaking spaces and apostrophes (Swiss grouping) are
/// ignored. With [`NumberLocale::Auto`]:
/// - both separators present: the last one is the decimal separator
/// - a separator that repeats is a grouping separator
/// - a single comma followed by exactly three digits groups (`1,500` → 1500)
/// - any other single separator is decimal (`1,5` → 1.5, `0,500` → 0.5)
///
/// # Errors
///
/// Returns `CoreError::Validation` for empty or non-numeric input.
pub fn parse_locale_decimal(input: &str, locale: NumberLocale) -> Result<f64, CoreError> {
    let cleaned: String = input
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\'' | '\u{2019}' | '\u{a0}'))
        .collect();
    if cleaned.is_empty() {
        return Err(CoreError::Validation("empty number".into()));
    }

    let (negative, body) = match cleaned.as_bytes()[0] {
        b'-' => (true, &cleaned[1..]),
        b'+' => (false, &cleaned[1..]),
        _ => (false, cleaned.as_str()),
    };

    let (group, decimal) = match locale {
        NumberLocale::Eu => ('.', ','),
        NumberLocale::Us => (',', '.'),
        NumberLocale::Auto => detect_separators(body),
    };

    let mut normalized = String::with_capacity(body.len() + 1);
    if negative {
        normalized.push('-');
    }
    let mut seen_decimal = false;
    let mut seen_digit = false;
    for c in body.chars() {
        if c == group {
            continue;
        }
        if c == decimal {
            if seen_decimal {
                return Err(invalid(input));
            }
            seen_decimal = true;
            normalized.push('.');
        } else if c.is_ascii_digit() {
            seen_digit = true;
            normalized.push(c);
        } else {
            return Err(invalid(input));
        }
    }
    if !seen_digit {
        return Err(invalid(input));
    }

    normalized.parse::<f64>().map_err(|_| invalid(input))
}

/// Returns `(grouping, decimal)` separators for `Auto` mode.
fn detect_separators(body: &str) -> (char, char) {
    const US: (char, char) = (',', '.');
    const EU: (char, char) = ('.', ',');

    match (body.rfind(','), body.rfind('.')) {
        (Some(comma), Some(dot)) => {
            if comma > dot {
                EU
            } else {
                US
            }
        }
        (Some(comma), None) => {
            if body.matches(',').count() > 1 {
                return US;
            }
            let (int_part, frac_part) = (&body[..comma], &body[comma + 1..]);
            let looks_grouped = frac_part.len() == 3
                && frac_part.chars().all(|c| c.is_ascii_digit())
                && !int_part.is_empty()
                && int_part.chars().any(|c| c != '0');
            if looks_grouped { US } else { EU }
        }
        (None, Some(_)) => {
            if body.matches('.').count() > 1 {
                EU
            } else {
                US
            }
        }
        (None, None) => US,
    }
}

/// Longest session length accepted, in minutes.
pub const MAX_SESSION_MINUTES: i64 = 24 * 60;

/// Parse a session duration into whole minutes.
///
/// Accepted forms:
/// - `"90"`, `"90 min"` : minutes
/// - `"1:30"` : hours and minutes
/// - `"1,5h"`, `"1.5 hours"`, `"1,5"` : decimal hours (a bare number with a
///   decimal separator is read as hours)
///
/// # Errors
///
/// Returns `CoreError::Validation` if the input cannot be parsed, is not
/// positive, or exceeds [`MAX_SESSION_MINUTES`].
pub fn parse_duration_minutes(input: &str, locale: NumberLocale) -> Result<i64, CoreError> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return Err(CoreError::Validation("empty duration".into()));
    }

    let minutes = if let Some((hours, mins)) = lowered.split_once(':') {
        let hours: i64 = hours.trim().parse().map_err(|_| invalid(input))?;
        let mins: i64 = mins.trim().parse().map_err(|_| invalid(input))?;
        if !(0..60).contains(&mins) || hours < 0 {
            return Err(invalid(input));
        }
        let total = hours
            .checked_mul(60)
            .and_then(|h| h.checked_add(mins))
            .ok_or_else(|| too_long(input))?;
        f64_minutes(total)
    } else if let Some(number) = strip_unit(&lowered, &["hours", "hour", "hrs", "hr", "h"]) {
        parse_locale_decimal(number, locale)? * 60.0
    } else if let Some(number) = strip_unit(&lowered, &["minutes", "minute", "mins", "min", "m"])
    {
        parse_locale_decimal(number, locale)?
    } else if lowered.contains([',', '.']) {
        parse_locale_decimal(&lowered, locale)? * 60.0
    } else {
        parse_locale_decimal(&lowered, locale)?
    };

    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(CoreError::Validation(format!(
            "duration must be positive: '{input}'"
        )));
    }

    if minutes.round() > f64_minutes(MAX_SESSION_MINUTES) {
        return Err(too_long(input));
    }

    #[allow(clippy::cast_possible_truncation)]
    Ok(minutes.round() as i64)
}

/// Check a duration given directly in minutes.
///
/// # Errors
///
/// Returns `CoreError::Validation` outside `1..=MAX_SESSION_MINUTES`.
pub fn check_duration_minutes(minutes: i64) -> Result<i64, CoreError> {
    if minutes <= 0 {
        return Err(CoreError::Validation(format!(
            "duration must be positive: {minutes}"
        )));
    }
    if minutes > MAX_SESSION_MINUTES {
        return Err(too_long(&minutes.to_string()));
    }
    Ok(minutes)
}

fn too_long(input: &str) -> CoreError {
    CoreError::Validation(format!("duration must be at most 24 hours: '{input}'"))
}

fn strip_unit<'a>(value: &'a str, units: &[&str]) -> Option<&'a str> {
    units
        .iter()
        .find_map(|unit| value.strip_suffix(unit))
        .map(str::trim_end)
        .filter(|rest| !rest.is_empty() && rest.chars().last().is_some_and(|c| c.is_ascii_digit()))
}

#[allow(clippy::cast_precision_loss)]
fn f64_minutes(minutes: i64) -> f64 {
    minutes as f64
}

fn invalid(input: &str) -> CoreError {
    CoreError::Validation(format!("not a number: '{input}'"))
}
