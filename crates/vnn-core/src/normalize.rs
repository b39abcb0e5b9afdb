//! RawEvent to EventRecord conversion.
//!
//! The normalizer is the only admission gate of the pipeline. A candidate
//! becomes an [`EventRecord`] when it has a non-empty title, a parsable start
//! and a recognized region code; everything else is repaired, defaulted or
//! dropped field by field and never causes a rejection.
//!
//! Accepted start/end forms:
//! - RFC 3339 / ISO 8601 with an offset or `Z`
//! - ISO 8601 without an offset, read as local time in the record's zone
//! - a bare `YYYY-MM-DD` date, read as local midnight

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::debug;

use crate::raw::RawEvent;
use crate::record::{DEFAULT_COUNTRY, DEFAULT_TAG, EventRecord, RecordParts};
use crate::region::StateCode;

/// Zone used when a candidate carries no usable timezone.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::Denver;

const UNKNOWN_SOURCE: &str = "unknown";

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%d %H:%M:%S%:z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Why a candidate was not admitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidRecord {
    #[error("title is missing or blank")]
    MissingTitle,
    #[error("start is missing")]
    MissingStart,
    #[error("start {0:?} is not a recognized timestamp")]
    UnparsableStart(String),
    #[error("state is missing")]
    MissingState,
    #[error("state {0:?} is not a recognized region code")]
    UnknownState(String),
}

/// Converts candidates into records using a fallback timezone for naive
/// timestamps.
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    default_timezone: Tz,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE)
    }
}

impl Normalizer {
    pub fn new(default_timezone: Tz) -> Self {
        Self { default_timezone }
    }

    /// Validates and repairs one candidate.
    pub fn normalize(&self, raw: &RawEvent) -> Result<EventRecord, InvalidRecord> {
        let title = clean(raw.title.as_deref()).ok_or(InvalidRecord::MissingTitle)?;

        let timezone = clean(raw.timezone.as_deref())
            .and_then(|tz| tz.parse::<Tz>().ok())
            .unwrap_or(self.default_timezone);

        let start_text = clean(raw.start.as_deref()).ok_or(InvalidRecord::MissingStart)?;
        let start = parse_timestamp(&start_text, timezone)
            .ok_or(InvalidRecord::UnparsableStart(start_text))?;

        let state_text = clean(raw.state.as_deref()).ok_or(InvalidRecord::MissingState)?;
        let state = state_text
            .parse::<StateCode>()
            .map_err(|_| InvalidRecord::UnknownState(state_text))?;

        let end = clean(raw.end.as_deref()).and_then(|end| parse_timestamp(&end, timezone));

        let mut tags: BTreeSet<String> = raw.tags.iter().filter_map(|t| clean(Some(t))).collect();
        if tags.is_empty() {
            tags.insert(DEFAULT_TAG.to_string());
        }

        Ok(EventRecord::from_parts(RecordParts {
            title,
            start,
            end,
            timezone,
            venue_name: clean(raw.venue_name.as_deref()),
            address: clean(raw.address.as_deref()),
            city: clean(raw.city.as_deref()),
            state,
            postal_code: clean(raw.postal_code.as_deref()),
            country: clean(raw.country.as_deref()).unwrap_or_else(|| DEFAULT_COUNTRY.to_string()),
            cost: clean(raw.cost.as_deref()),
            registration_url: raw.registration_url.as_deref().and_then(repair_url),
            source: clean(raw.source.as_deref()).unwrap_or_else(|| UNKNOWN_SOURCE.to_string()),
            description: clean(raw.description.as_deref()),
            tags,
            lat: raw.lat.filter(|v| v.is_finite()),
            lon: raw.lon.filter(|v| v.is_finite()),
        }))
    }

    /// Normalizes a batch, dropping candidates that are not admitted.
    pub fn normalize_all(&self, raws: &[RawEvent]) -> Vec<EventRecord> {
        raws.iter()
            .filter_map(|raw| match self.normalize(raw) {
                Ok(record) => Some(record),
                Err(reason) => {
                    debug!(
                        source = raw.source.as_deref().unwrap_or(UNKNOWN_SOURCE),
                        title = ?raw.title,
                        %reason,
                        "Dropped invalid event candidate"
                    );
                    None
                }
            })
            .collect()
    }
}

/// Normalizes one candidate with the default timezone.
pub fn normalize(raw: &RawEvent) -> Result<EventRecord, InvalidRecord> {
    Normalizer::default().normalize(raw)
}

/// Normalizes a batch with the default timezone.
pub fn normalize_events(raws: &[RawEvent]) -> Vec<EventRecord> {
    Normalizer::default().normalize_all(raws)
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Parses a timestamp, interpreting naive values in `tz`.
pub fn parse_timestamp(value: &str, tz: Tz) -> Option<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt);
    }
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(value, fmt).ok())
    {
        return Some(dt);
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    localize(naive, tz)
}

/// Attaches `tz` to a wall-clock time. Times inside a DST gap move forward
/// by one hour.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            naive
                .checked_add_signed(Duration::hours(1))
                .and_then(|shifted| tz.from_local_datetime(&shifted).earliest())
        })
        .map(|dt| dt.fixed_offset())
}

/// Accepts absolute http(s) URLs. Scheme-relative `//host/path` links get
/// `https:`.
fn repair_url(value: &str) -> Option<String> {
    let value = value.trim();
    let candidate = if value.starts_with("//") {
        format!("https:{value}")
    } else {
        value.to_string()
    };
    let parsed = url::Url::parse(&candidate).ok()?;
    matches!(parsed.scheme(), "http" | "https").then_some(candidate)
}
