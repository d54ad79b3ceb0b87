//! Date extraction.
//!
//! Receipts from delivery and ride apps print "Aug 29 10:53PM" without a
//! year, so the current year is assumed. Anything unparseable resolves to
//! today; the output is always a valid calendar date.

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

// Full names first so "August" is not cut to "Aug".
const MONTHS: &str = "january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sep|oct|nov|dec";

// Tried in order: a time-stamped date, then a delivered/ordered-on date,
// then any bare month-day.
static TIMESTAMPED_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\s+(\d{{1,2}}),?\s+\d{{1,2}}:\d{{2}}\s*(?:AM|PM)"
    ))
    .expect("timestamped pattern")
});

static DELIVERED_ON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:delivered|ordered|order)\s+on\s+([A-Za-z]+)\s+(\d{1,2})\b")
        .expect("delivered-on pattern")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({MONTHS})\s+(\d{{1,2}})\b")).expect("month-day pattern")
});

/// Month number for an English month name or abbreviation.
pub fn month_number(name: &str) -> Option<u32> {
    let m = match name.to_lowercase().as_str() {
        "jan" | "january" => 1,
        "feb" | "february" => 2,
        "mar" | "march" => 3,
        "apr" | "april" => 4,
        "may" => 5,
        "jun" | "june" => 6,
        "jul" | "july" => 7,
        "aug" | "august" => 8,
        "sep" | "september" => 9,
        "oct" | "october" => 10,
        "nov" | "november" => 11,
        "dec" | "december" => 12,
        _ => return None,
    };
    Some(m)
}

/// Extract the receipt date, using `today` for the year and as the fallback.
pub fn extract_date(text: &str, today: NaiveDate) -> NaiveDate {
    find_date(text, today.year()).unwrap_or(today)
}

/// Like [`extract_date`] but reports whether anything was found.
pub fn find_date(text: &str, year: i32) -> Option<NaiveDate> {
    for re in [&*TIMESTAMPED_RE, &*DELIVERED_ON_RE, &*MONTH_DAY_RE] {
        for caps in re.captures_iter(text) {
            if let Some(d) = build_date(year, &caps[1], &caps[2]) {
                return Some(d);
            }
        }
    }
    None
}

fn build_date(year: i32, month: &str, day: &str) -> Option<NaiveDate> {
    let month = month_number(month)?;
    let day: u32 = day.parse().ok()?;
    if !(1..=31).contains(&day) {
        return None;
    }
    NaiveDate::from_ymd_opt(year, month, day)
}
