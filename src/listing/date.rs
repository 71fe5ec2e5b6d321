// src/listing/date.rs
// =============================================================================
// Modification-date heuristics.
//
// Index pages print dates in whatever format the server likes. We try the
// three formats that cover Apache, Nginx, Caddy and IIS, in this order:
//
//   (a) 2024-03-01 12:05[:SS]   ISO-ish (Caddy, lighttpd, Apache fancy index)
//   (b) 08-Oct-2023 05:44       Apache / Nginx autoindex
//   (c) 1/2/2022 3:04 PM        IIS
//
// Everything is read as UTC. Servers do not say which zone they print in.
// =============================================================================

use crate::error::{soft, SoftKind};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use regex::Regex;
use std::sync::OnceLock;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

struct DatePatterns {
    iso: Regex,
    day_month_year: Regex,
    us_meridiem: Regex,
    loose_numeric: Regex,
}

fn patterns() -> &'static DatePatterns {
    static PATTERNS: OnceLock<DatePatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| DatePatterns {
        iso: Regex::new(r"(\d{4})-(\d{2})-(\d{2})[ T](\d{2}):(\d{2})(?::(\d{2}))?")
            .expect("static regex"),
        day_month_year: Regex::new(r"(\d{2})-(\w{3})-(\d{4})\s(\d{2}):(\d{2})")
            .expect("static regex"),
        us_meridiem: Regex::new(r"(?i)(\d{1,2})/(\d{1,2})/(\d{4})\s(\d{1,2}):(\d{2})\s?(AM|PM)")
            .expect("static regex"),
        loose_numeric: Regex::new(r"\b\d{1,2}[-/]\d{1,2}[-/]\d{2,4}\b").expect("static regex"),
    })
}

/// Finds the first recognizable date in `text`.
///
/// When nothing matches but the text holds a numeric date we cannot read
/// unambiguously (like `12/13/2024 12:00` without AM/PM), a `date:` soft
/// error is pushed to `errors` and None is returned.
pub fn parse_date(text: &str, errors: &mut Vec<String>) -> Option<DateTime<Utc>> {
    let p = patterns();

    if let Some(c) = p.iso.captures(text) {
        let second = c.get(6).map_or("0", |m| m.as_str());
        if let Some(date) = build(&c[1], &c[2], &c[3], &c[4], &c[5], second) {
            return Some(date);
        }
    }

    if let Some(c) = p.day_month_year.captures(text) {
        if let Some(month) = month_number(&c[2]) {
            let month = month.to_string();
            if let Some(date) = build(&c[3], &month, &c[1], &c[4], &c[5], "0") {
                return Some(date);
            }
        }
    }

    if let Some(c) = p.us_meridiem.captures(text) {
        let hour: u32 = c[4].parse().ok()?;
        let hour = to_24_hour(hour, &c[6]).to_string();
        if let Some(date) = build(&c[3], &c[1], &c[2], &hour, &c[5], "0") {
            return Some(date);
        }
    }

    if p.loose_numeric.is_match(text) {
        errors.push(soft(
            SoftKind::Date,
            format!("ambiguous numeric date pattern in '{}'", text.trim()),
        ));
    }
    None
}

/// 12 AM is midnight, 12 PM is noon, other PM hours move up by 12.
fn to_24_hour(hour: u32, meridiem: &str) -> u32 {
    let pm = meridiem.eq_ignore_ascii_case("pm");
    match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    }
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == lower)
        .map(|i| i as u32 + 1)
}

// Calendar-invalid values (month 13, 25:00...) yield None.
fn build(year: &str, month: &str, day: &str, hour: &str, minute: &str, second: &str) -> Option<DateTime<Utc>> {
    let naive = NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)?
        .and_hms_opt(hour.parse().ok()?, minute.parse().ok()?, second.parse().ok()?)?;
    Some(Utc.from_utc_datetime(&naive))
}
