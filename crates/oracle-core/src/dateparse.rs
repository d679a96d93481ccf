//! Date Parser: free-text birth dates to validated calendar dates.
//!
//! Four patterns are tried in strict order, first match wins:
//! month-name first ("March 15, 1990"), day first ("15 March 1990"),
//! US numeric MM/DD/YYYY, then ISO YYYY-MM-DD. Failures carry a distinct
//! error code plus an in-character suggestion for the redirect layer.

use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sept", 9),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

const MONTH_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// Alternation lists long names first so "sept" wins over "sep".
const MONTH_ALT: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";

static MONTH_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^({MONTH_ALT})\s+(\d{{1,2}})(?:st|nd|rd|th)?,?\s+(\d{{2,4}})$"
    ))
    .expect("month-first pattern")
});

static DAY_FIRST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"(?i)^(\d{{1,2}})(?:st|nd|rd|th)?\s+({MONTH_ALT}),?\s+(\d{{2,4}})$"
    ))
    .expect("day-first pattern")
});

static US_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{2,4})$").expect("US numeric pattern"));

static ISO_NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})[/-](\d{1,2})[/-](\d{1,2})$").expect("ISO pattern"));

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    MONTH_NAMES
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, m)| *m)
}

/// 00-29 land in the 2000s, 30-99 in the 1900s. Four-digit years pass through.
fn normalize_year(raw: u32) -> i32 {
    if raw < 30 {
        2000 + raw as i32
    } else if raw < 100 {
        1900 + raw as i32
    } else {
        raw as i32
    }
}

/// Error codes for date parsing, in validation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DateErrorCode {
    EmptyInput,
    InvalidFormat,
    InvalidMonth,
    InvalidDay,
    InvalidYear,
    ImpossibleDate,
    FutureDate,
}

impl DateErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyInput => "EMPTY_INPUT",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::InvalidMonth => "INVALID_MONTH",
            Self::InvalidDay => "INVALID_DAY",
            Self::InvalidYear => "INVALID_YEAR",
            Self::ImpossibleDate => "IMPOSSIBLE_DATE",
            Self::FutureDate => "FUTURE_DATE",
        }
    }
}

/// A parse failure: code, operator-facing message, and in-character
/// suggestion text for the redirect layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DateParseError {
    pub code: DateErrorCode,
    pub message: String,
    pub suggestion: String,
}

impl DateParseError {
    fn new(code: DateErrorCode, message: impl Into<String>) -> Self {
        let suggestion = match code {
            DateErrorCode::EmptyInput => {
                "The stars await your birth date. Share it as you would speak it: March 15, 1990."
            }
            DateErrorCode::InvalidFormat => {
                "The Oracle reads dates in many tongues: March 15, 1990 — or 3/15/1990."
            }
            DateErrorCode::InvalidMonth => {
                "No such month exists under these stars. There are but twelve."
            }
            DateErrorCode::InvalidDay => "No month holds so many days. Look again at your scroll.",
            DateErrorCode::InvalidYear => {
                "The Oracle reads lives begun in this era. Offer a year after 1900."
            }
            DateErrorCode::ImpossibleDate => {
                "That day never dawned in that month. The calendar itself refuses it."
            }
            DateErrorCode::FutureDate => {
                "You have not yet been born on that day. The Oracle reads the past, not the unborn."
            }
        };
        Self {
            code,
            message: message.into(),
            suggestion: suggestion.to_string(),
        }
    }
}

/// A successfully parsed birth date plus its long-form rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedDate {
    pub date: NaiveDate,
    /// Long-form locale string, e.g. "March 15, 1990".
    pub formatted: String,
}

/// Long-form "March 15, 1990" rendering.
pub fn format_long(date: NaiveDate) -> String {
    format!(
        "{} {}, {}",
        MONTH_LONG[date.month0() as usize],
        date.day(),
        date.year()
    )
}

/// Parse free-text date input against today's calendar.
///
/// The year-range check runs before the future check, so a year beyond the
/// current one reports `INVALID_YEAR`; `FUTURE_DATE` fires only for dates
/// later this year.
pub fn parse_date_string(input: &str) -> Result<ParsedDate, DateParseError> {
    parse_date_string_at(input, Local::now().date_naive())
}

/// Parse with an explicit "today", so year-range and future checks are
/// reproducible in tests.
pub fn parse_date_string_at(input: &str, today: NaiveDate) -> Result<ParsedDate, DateParseError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(DateParseError::new(
            DateErrorCode::EmptyInput,
            "empty date input",
        ));
    }

    let (month, day, year) = extract_components(input).ok_or_else(|| {
        DateParseError::new(
            DateErrorCode::InvalidFormat,
            format!("unrecognized date format: {input:?}"),
        )
    })?;

    validate_components(month, day, year, today)?;

    let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        DateParseError::new(
            DateErrorCode::ImpossibleDate,
            format!("no such date: {year}-{month:02}-{day:02}"),
        )
    })?;
    if date > today {
        return Err(DateParseError::new(
            DateErrorCode::FutureDate,
            format!("date is in the future: {date}"),
        ));
    }

    Ok(ParsedDate {
        formatted: format_long(date),
        date,
    })
}

/// Strict try-order over the four patterns; first match wins.
fn extract_components(input: &str) -> Option<(u32, u32, i32)> {
    if let Some(c) = MONTH_FIRST.captures(input) {
        let month = month_from_name(&c[1])?;
        let day: u32 = c[2].parse().ok()?;
        let year = normalize_year(c[3].parse().ok()?);
        return Some((month, day, year));
    }
    if let Some(c) = DAY_FIRST.captures(input) {
        let day: u32 = c[1].parse().ok()?;
        let month = month_from_name(&c[2])?;
        let year = normalize_year(c[3].parse().ok()?);
        return Some((month, day, year));
    }
    if let Some(c) = US_NUMERIC.captures(input) {
        let month: u32 = c[1].parse().ok()?;
        let day: u32 = c[2].parse().ok()?;
        let year = normalize_year(c[3].parse().ok()?);
        return Some((month, day, year));
    }
    if let Some(c) = ISO_NUMERIC.captures(input) {
        let year: i32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let day: u32 = c[3].parse().ok()?;
        return Some((month, day, year));
    }
    None
}

fn validate_components(month: u32, day: u32, year: i32, today: NaiveDate) -> Result<(), DateParseError> {
    if !(1..=12).contains(&month) {
        return Err(DateParseError::new(
            DateErrorCode::InvalidMonth,
            format!("month out of range: {month}"),
        ));
    }
    if !(1..=31).contains(&day) {
        return Err(DateParseError::new(
            DateErrorCode::InvalidDay,
            format!("day out of range: {day}"),
        ));
    }
    if year < 1900 || year > today.year() {
        return Err(DateParseError::new(
            DateErrorCode::InvalidYear,
            format!("year out of range: {year}"),
        ));
    }
    Ok(())
}
