//! Canonical forms for user-supplied event and booking fields.
//!
//! Every function here is pure and idempotent: feeding a canonical value back
//! in returns it unchanged.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use evently_result::Result;
use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is not a lowercase ASCII word character, whitespace or hyphen
static RE_SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9_\s-]").unwrap());

/// Runs of whitespace
static RE_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Runs of hyphens
static RE_HYPHENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+").unwrap());

/// Ordinal suffix on a day number, e.g. `5th`
static RE_ORDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})(st|nd|rd|th)\b").unwrap());

/// Strict 24-hour `HH:MM`
static RE_TIME_CANONICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):[0-5]\d$").unwrap());

/// Loose time of day: `9:05`, `9.05pm`, `9 PM`, `21:30:00`, `9:05 a.m.`
static RE_TIME_LOOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2})(?:[:.](\d{2}))?(?::(\d{2}))?\s*(?:([ap])\.?\s*m\.?)?$").unwrap()
});

/// Simple email address shape
static RE_EMAIL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Calendar date layouts accepted after ordinal suffixes are removed
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%A, %B %d, %Y",
    "%A %B %d %Y",
    "%a, %d %B %Y",
];

/// Date-time layouts from which only the calendar date is kept
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Derive a URL-safe slug from a title
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let stripped = RE_SLUG_STRIP.replace_all(lowered.trim(), "");
    let hyphenated = RE_WHITESPACE.replace_all(&stripped, "-");
    RE_HYPHENS.replace_all(&hyphenated, "-").into_owned()
}

/// Parse a calendar date in any accepted layout and emit `YYYY-MM-DD`
pub fn normalise_date(field: &str, input: &str) -> Result<String> {
    parse_date(input)
        .map(|date| date.format("%Y-%m-%d").to_string())
        .ok_or_else(|| {
            create_error!(InvalidDateFormat {
                field: field.to_string(),
                value: input.to_string()
            })
        })
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.date_naive());
    }

    if let Some(date) = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
    {
        return Some(date.date());
    }

    let cleaned = RE_ORDINAL.replace_all(input, "$1");
    let cleaned = RE_WHITESPACE.replace_all(&cleaned, " ");
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(&cleaned, format).ok())
}

/// Parse a time of day and emit 24-hour `HH:MM`
pub fn normalise_time(field: &str, input: &str) -> Result<String> {
    let invalid = || {
        create_error!(InvalidTimeFormat {
            field: field.to_string(),
            value: input.to_string()
        })
    };

    let trimmed = input.trim();
    if RE_TIME_CANONICAL.is_match(trimmed) {
        return Ok(trimmed.to_string());
    }

    let captures = RE_TIME_LOOSE.captures(trimmed).ok_or_else(invalid)?;
    let number = |index: usize| -> Option<u32> {
        captures.get(index).and_then(|m| m.as_str().parse().ok())
    };

    let hours = number(1).ok_or_else(invalid)?;
    let minutes = number(2);
    let seconds = number(3).unwrap_or(0);
    let period = captures.get(4).map(|m| m.as_str().to_ascii_lowercase());

    // A bare number is not a time of day
    if minutes.is_none() && period.is_none() {
        return Err(invalid());
    }

    let minutes = minutes.unwrap_or(0);
    if minutes > 59 || seconds > 59 {
        return Err(invalid());
    }

    let hours = match period.as_deref() {
        Some(period) => {
            if !(1..=12).contains(&hours) {
                return Err(invalid());
            }

            match (period, hours) {
                ("a", 12) => 0,
                ("p", 12) => 12,
                ("p", hours) => hours + 12,
                (_, hours) => hours,
            }
        }
        None if hours > 23 => return Err(invalid()),
        None => hours,
    };

    Ok(format!("{hours:02}:{minutes:02}"))
}

/// Trim and lowercase an email address, rejecting anything not shaped like one
pub fn normalise_email(input: &str) -> Result<String> {
    let email = input.trim().to_lowercase();
    if RE_EMAIL.is_match(&email) {
        Ok(email)
    } else {
        Err(create_error!(InvalidEmailFormat {
            value: input.to_string()
        }))
    }
}

/// Trim every entry and drop blank ones
pub fn normalise_list(entries: Vec<String>) -> Vec<String> {
    entries
        .into_iter()
        .map(|entry| entry.trim().to_string())
        .filter(|entry| !entry.is_empty())
        .collect()
}

/// Trim every entry, drop blank ones and keep only the first of any duplicates
pub fn normalise_set(entries: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    normalise_list(entries)
        .into_iter()
        .filter(|entry| seen.insert(entry.clone()))
        .collect()
}
