//! Date extraction from scraped text.
//!
//! Event pages write dates in many ways. [`extract_start`] finds the first
//! date-like span in a string and returns it as ISO 8601: unchanged if it
//! already carried an offset, otherwise as a naive `YYYY-MM-DDTHH:MM:SS`
//! for the normalizer to localize.

use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

static ISO_DATETIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(\d{4}-\d{2}-\d{2})(?:[T ](\d{2}:\d{2}(?::\d{2}(?:\.\d+)?)?)(Z|[+-]\d{2}:?\d{2})?)?",
    )
    .expect("ISO datetime regex should be valid")
});

static MONTH_NAME_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        \b(?P<month>jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|
           aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?
        \s+(?P<day>\d{1,2})(?:st|nd|rd|th)?,?
        \s+(?P<year>\d{4})
        (?:\s*(?:@|at|,|-)?\s*(?P<hour>\d{1,2})(?::(?P<minute>\d{2}))?\s*(?P<ampm>[ap])\.?m\.?)?",
    )
    .expect("month-name date regex should be valid")
});

static NUMERIC_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?P<month>\d{1,2})/(?P<day>\d{1,2})/(?P<year>\d{4})(?:\s+(?P<hour>\d{1,2}):(?P<minute>\d{2})\s*(?P<ampm>[ap])\.?m\.?)?",
    )
    .expect("numeric date regex should be valid")
});

/// Finds the first recognizable date/time in `text`.
pub fn extract_start(text: &str) -> Option<String> {
    if let Some(caps) = ISO_DATETIME.captures(text) {
        return from_iso(&caps);
    }
    if let Some(caps) = MONTH_NAME_DATE.captures(text) {
        let month = month_number(caps.name("month")?.as_str())?;
        return from_parts(&caps, month);
    }
    if let Some(caps) = NUMERIC_DATE.captures(text) {
        let month = caps.name("month")?.as_str().parse().ok()?;
        return from_parts(&caps, month);
    }
    None
}

fn from_iso(caps: &Captures<'_>) -> Option<String> {
    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;
    let Some(time) = caps.get(2) else {
        return Some(date.format("%Y-%m-%d").to_string());
    };
    let time = time.as_str();
    let time = if time.len() == 5 {
        format!("{time}:00")
    } else {
        time.to_string()
    };
    match caps.get(3) {
        Some(offset) => Some(format!("{date}T{time}{}", offset.as_str())),
        None => Some(format!("{date}T{time}")),
    }
}

fn from_parts(caps: &Captures<'_>, month: u32) -> Option<String> {
    let day: u32 = caps.name("day")?.as_str().parse().ok()?;
    let year: i32 = caps.name("year")?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let Some(hour) = caps.name("hour") else {
        return Some(date.format("%Y-%m-%d").to_string());
    };
    let hour: u32 = hour.as_str().parse().ok()?;
    let minute: u32 = caps
        .name("minute")
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    let pm = caps
        .name("ampm")
        .is_some_and(|m| m.as_str().eq_ignore_ascii_case("p"));
    let hour = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;
    Some(
        NaiveDateTime::new(date, time)
            .format("%Y-%m-%dT%H:%M:%S")
            .to_string(),
    )
}

fn month_number(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let prefix = name.get(..3)?.to_ascii_lowercase();
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|idx| u32::try_from(idx + 1).ok())
}
