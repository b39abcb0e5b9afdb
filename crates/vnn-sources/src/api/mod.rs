//! Event search APIs: Eventbrite, Meetup and Google Events (via SerpAPI).
//!
//! Each API source searches once per configured area and needs a token
//! from the environment. Without one it logs and returns nothing.

pub mod eventbrite;
pub mod google_events;
pub mod meetup;

use chrono::{DateTime, Duration, NaiveDate, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use vnn_core::{DEFAULT_TIMEZONE, RawEvent, StateCode};

use crate::error::SourceResult;

pub use eventbrite::{EventbriteConfig, EventbriteSource};
pub use google_events::{GoogleEventsConfig, GoogleEventsSource};
pub use meetup::{MeetupConfig, MeetupSource};

/// Search terms used when a source does not set its own.
pub const VETERAN_KEYWORDS: &[&str] = &["veteran", "veterans", "military", "VFW", "American Legion"];

/// A latitude/longitude box: south, west, north, east.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingBox {
    pub const MONTANA: BoundingBox = BoundingBox {
        south: 44.36,
        west: -116.05,
        north: 49.0,
        east: -104.04,
    };

    pub const WYOMING: BoundingBox = BoundingBox {
        south: 40.99,
        west: -111.06,
        north: 45.0,
        east: -104.05,
    };

    pub fn center(&self) -> (f64, f64) {
        (
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }
}

/// One region searched by an API source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchArea {
    pub state: StateCode,
    pub bbox: BoundingBox,
}

impl SearchArea {
    pub fn new(state: StateCode, bbox: BoundingBox) -> Self {
        Self { state, bbox }
    }
}

/// Montana and Wyoming.
pub fn default_areas() -> Vec<SearchArea> {
    vec![
        SearchArea::new(StateCode::Mt, BoundingBox::MONTANA),
        SearchArea::new(StateCode::Wy, BoundingBox::WYOMING),
    ]
}

pub(crate) fn default_keywords() -> Vec<String> {
    VETERAN_KEYWORDS.iter().map(|k| k.to_string()).collect()
}

/// Which events an API search asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    /// Only events matching the keywords.
    #[default]
    Veterans,
    /// Everything in the area.
    All,
}

impl EventScope {
    /// The keyword query for this scope, or `None` when unfiltered.
    pub fn query(&self, keywords: &[String], separator: &str) -> Option<String> {
        match self {
            EventScope::All => None,
            EventScope::Veterans if keywords.is_empty() => None,
            EventScope::Veterans => Some(keywords.join(separator)),
        }
    }
}

/// Merges per-area search results.
///
/// Failed areas are logged and skipped. The source only fails when every
/// area failed.
pub(crate) fn merge_area_results(
    source: &str,
    results: Vec<(StateCode, SourceResult<Vec<RawEvent>>)>,
) -> SourceResult<Vec<RawEvent>> {
    let total = results.len();
    let mut failed = 0usize;
    let mut events = Vec::new();
    let mut last_error = None;
    for (area, result) in results {
        match result {
            Ok(found) => events.extend(found),
            Err(e) => {
                warn!(source = %source, area = %area, error = %e, "Area search failed, skipping");
                failed += 1;
                last_error = Some(e);
            }
        }
    }
    match last_error {
        Some(e) if failed == total => Err(e.with_source_name(source)),
        _ => Ok(events),
    }
}

/// A non-empty string at a JSON pointer.
pub(crate) fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// The date range an API search covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchWindow {
    pub lookahead_days: u32,
    pub timezone: Tz,
}

impl SearchWindow {
    pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 60;

    pub fn new(lookahead_days: u32, timezone: Tz) -> Self {
        Self {
            lookahead_days,
            timezone,
        }
    }

    /// First and last calendar day of the window, in the window's zone.
    pub fn dates<Z: TimeZone>(&self, now: &DateTime<Z>) -> (NaiveDate, NaiveDate) {
        let local = now.with_timezone(&self.timezone);
        let start = local.date_naive();
        let end = local
            .checked_add_signed(Duration::days(i64::from(self.lookahead_days)))
            .map_or(NaiveDate::MAX, |end| end.date_naive());
        (start, end)
    }
}

impl Default for SearchWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOOKAHEAD_DAYS, DEFAULT_TIMEZONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn bbox_center() {
        let (lat, lon) = BoundingBox::MONTANA.center();
        assert!((lat - 46.68).abs() < 1e-9);
        assert!((lon - -110.045).abs() < 1e-9);
    }

    #[test]
    fn window_dates_use_reference_zone() {
        // 03:00 UTC on March 2 is still March 1 in Denver.
        let now = Utc.with_ymd_and_hms(2025, 3, 2, 3, 0, 0).unwrap();
        let (start, end) = SearchWindow::new(10, chrono_tz::America::Denver).dates(&now);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    }

    #[test]
    fn scope_query() {
        let keywords = default_keywords();
        assert_eq!(
            EventScope::Veterans.query(&keywords, " OR ").as_deref(),
            Some("veteran OR veterans OR military OR VFW OR American Legion")
        );
        assert_eq!(EventScope::All.query(&keywords, " OR "), None);
        assert_eq!(EventScope::Veterans.query(&[], " "), None);
    }

    mod merge {
        use super::*;
        use crate::error::{SourceError, SourceErrorCode};

        #[test]
        fn one_failed_area_is_skipped() {
            let merged = merge_area_results(
                "eventbrite",
                vec![
                    (StateCode::Mt, Ok(vec![RawEvent::new("eventbrite")])),
                    (StateCode::Wy, Err(SourceError::rate_limited("slow down"))),
                ],
            )
            .unwrap();
            assert_eq!(merged.len(), 1);
        }

        #[test]
        fn all_failed_areas_fail_the_source() {
            let err = merge_area_results(
                "meetup",
                vec![
                    (StateCode::Mt, Err(SourceError::authentication("bad token"))),
                    (StateCode::Wy, Err(SourceError::authentication("bad token"))),
                ],
            )
            .unwrap_err();
            assert_eq!(err.code(), SourceErrorCode::AuthenticationFailed);
            assert_eq!(err.source_name(), Some("meetup"));
        }

        #[test]
        fn empty_results_are_ok() {
            assert!(merge_area_results("x", Vec::new()).unwrap().is_empty());
            let empty = merge_area_results("x", vec![(StateCode::Mt, Ok(Vec::new()))]).unwrap();
            assert!(empty.is_empty());
        }
    }

    #[test]
    fn defaults() {
        let areas = default_areas();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].state, StateCode::Mt);
        assert_eq!(SearchWindow::default().lookahead_days, 60);
        assert!(default_keywords().contains(&"VFW".to_string()));
    }
}
