//! iCalendar (RFC 5545) feeds.
//!
//! One source can read several feed URLs. A feed that fails is logged and
//! skipped; the fetch only fails when every feed failed.

use chrono::SecondsFormat;
use icalendar::{Calendar, CalendarComponent, CalendarDateTime, Component, DatePerhapsTime, Event, EventLike};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;

use vnn_core::{RawEvent, StateCode};

use crate::error::{SourceError, SourceResult};
use crate::http::{HttpConfig, HttpFetcher, redact};
use crate::location::resolve_place;
use crate::source::{BoxFuture, EventSource};

/// Configuration for an iCalendar source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IcsSourceConfig {
    pub name: String,

    /// Feed URLs.
    #[serde(default)]
    pub urls: Vec<String>,

    /// Environment variable holding extra comma-separated feed URLs.
    #[serde(default)]
    pub urls_env: Option<String>,

    /// Title for events without a SUMMARY.
    #[serde(default)]
    pub title_fallback: Option<String>,

    /// State used when LOCATION names no known region.
    #[serde(default)]
    pub default_state: Option<StateCode>,
}

impl IcsSourceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            urls: Vec::new(),
            urls_env: None,
            title_fallback: None,
            default_state: None,
        }
    }

    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_urls_env(mut self, var: impl Into<String>) -> Self {
        self.urls_env = Some(var.into());
        self
    }

    pub fn with_title_fallback(mut self, title: impl Into<String>) -> Self {
        self.title_fallback = Some(title.into());
        self
    }

    pub fn with_default_state(mut self, state: StateCode) -> Self {
        self.default_state = Some(state);
        self
    }

    /// Configured URLs followed by the ones from `urls_env`, split on commas.
    pub fn resolve_urls(&self, env: impl Fn(&str) -> Option<String>) -> SourceResult<Vec<Url>> {
        let from_env = self
            .urls_env
            .as_deref()
            .and_then(env)
            .unwrap_or_default();

        self.urls
            .iter()
            .map(String::as_str)
            .chain(from_env.split(','))
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(|u| {
                Url::parse(u).map_err(|e| {
                    SourceError::configuration(format!("invalid feed URL {:?}: {}", u, e))
                })
            })
            .collect()
    }
}

/// Reads one or more iCalendar feeds.
pub struct IcsSource {
    config: IcsSourceConfig,
    urls: Vec<Url>,
    regions: Vec<StateCode>,
    fetcher: HttpFetcher,
}

impl IcsSource {
    pub fn new(
        config: IcsSourceConfig,
        urls: Vec<Url>,
        regions: Vec<StateCode>,
        http: &HttpConfig,
    ) -> SourceResult<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(http)?,
            config,
            urls,
            regions,
        })
    }
}

impl EventSource for IcsSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>> {
        Box::pin(async move {
            if self.urls.is_empty() {
                info!(source = %self.config.name, "No feed URLs configured, skipping");
                return Ok(Vec::new());
            }

            let mut events = Vec::new();
            let mut last_error = None;
            let mut succeeded = 0usize;
            for url in &self.urls {
                match self.fetcher.get_text(url, None).await {
                    Ok(body) => {
                        succeeded += 1;
                        events.extend(parse_ics_events(&body, &self.config, &self.regions));
                    }
                    Err(e) => {
                        warn!(
                            source = %self.config.name,
                            url = %redact(url),
                            error = %e,
                            "Feed fetch failed, skipping"
                        );
                        last_error = Some(e);
                    }
                }
            }

            if succeeded == 0
                && let Some(e) = last_error
            {
                return Err(e.with_source_name(&self.config.name));
            }

            info!(
                source = %self.config.name,
                feeds = succeeded,
                event_count = events.len(),
                "Read iCalendar feeds"
            );
            Ok(events)
        })
    }
}

/// Converts every VEVENT of an iCalendar document into a candidate.
///
/// Unparsable documents yield nothing.
pub fn parse_ics_events(
    ics: &str,
    config: &IcsSourceConfig,
    regions: &[StateCode],
) -> Vec<RawEvent> {
    let calendar = match ics.parse::<Calendar>() {
        Ok(cal) => cal,
        Err(e) => {
            warn!(source = %config.name, error = %e, "Failed to parse iCalendar content");
            return Vec::new();
        }
    };

    calendar
        .iter()
        .filter_map(|component| match component {
            CalendarComponent::Event(event) => parse_event(event, config, regions),
            _ => None,
        })
        .collect()
}

fn parse_event(event: &Event, config: &IcsSourceConfig, regions: &[StateCode]) -> Option<RawEvent> {
    let Some((start, tzid)) = event.get_start().and_then(convert_date_time) else {
        debug!(source = %config.name, uid = ?event.get_uid(), "VEVENT without a start time");
        return None;
    };

    let mut raw = RawEvent::new(&config.name).with_start(start);

    let title = event
        .get_summary()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or_else(|| config.title_fallback.clone());
    if let Some(title) = title {
        raw = raw.with_title(title);
    }

    if let Some((end, _)) = event.get_end().and_then(convert_date_time) {
        raw = raw.with_end(end);
    }
    if let Some(tz) = tzid.filter(|t| t.parse::<chrono_tz::Tz>().is_ok()) {
        raw = raw.with_timezone(tz);
    }
    if let Some(description) = event.get_description() {
        raw = raw.with_description(description);
    }
    if let Some(url) = event.property_value("URL") {
        raw = raw.with_registration_url(url);
    }

    let location = event.get_location().map(str::trim).filter(|l| !l.is_empty());
    match location.and_then(|l| resolve_place(l, regions)) {
        Some(place) => {
            if let Some(city) = place.city {
                raw = raw.with_city(city);
            }
            raw = raw.with_state(place.state.as_str());
        }
        None => {
            if let Some(state) = config.default_state {
                raw = raw.with_state(state.as_str());
            }
        }
    }
    if let Some(location) = location {
        raw = raw.with_address(location);
    }

    Some(raw)
}

/// Renders a DTSTART/DTEND as a string the normalizer understands, plus the
/// TZID it was given in, if any. All-day values have no time and give `None`.
fn convert_date_time(dt: DatePerhapsTime) -> Option<(String, Option<String>)> {
    let DatePerhapsTime::DateTime(cdt) = dt else {
        return None;
    };
    Some(match cdt {
        CalendarDateTime::Utc(dt) => (dt.to_rfc3339_opts(SecondsFormat::Secs, true), None),
        CalendarDateTime::Floating(naive) => (naive.format("%Y-%m-%dT%H:%M:%S").to_string(), None),
        CalendarDateTime::WithTimezone { date_time, tzid } => (
            date_time.format("%Y-%m-%dT%H:%M:%S").to_string(),
            Some(tzid),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MT_WY: &[StateCode] = &[StateCode::Mt, StateCode::Wy];

    fn vub() -> IcsSourceConfig {
        IcsSourceConfig::new("veterans_upward_bound")
            .with_title_fallback("Veterans Upward Bound")
            .with_default_state(StateCode::Mt)
    }

    fn generic() -> IcsSourceConfig {
        IcsSourceConfig::new("ics").with_urls_env("PUBLIC_ICS_URLS")
    }

    fn feed() -> &'static str {
        "BEGIN:VCALENDAR\r\n\
         VERSION:2.0\r\n\
         PRODID:-//Test//Test//EN\r\n\
         BEGIN:VEVENT\r\n\
         UID:orientation-1@example.org\r\n\
         DTSTART:20250410T160000Z\r\n\
         DTEND:20250410T180000Z\r\n\
         SUMMARY:Student Orientation\r\n\
         LOCATION:MSU Billings, Billings, MT\r\n\
         URL:https://example.org/orientation\r\n\
         DESCRIPTION:Bring your DD-214.\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:casper-1@example.org\r\n\
         DTSTART;TZID=America/Denver:20250412T090000\r\n\
         LOCATION:Casper College, Casper, WY\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:allday-1@example.org\r\n\
         DTSTART;VALUE=DATE:20250501\r\n\
         SUMMARY:Memorial Ride\r\n\
         LOCATION:Somewhere in Wyoming\r\n\
         END:VEVENT\r\n\
         BEGIN:VEVENT\r\n\
         UID:nostart@example.org\r\n\
         SUMMARY:Broken\r\n\
         END:VEVENT\r\n\
         END:VCALENDAR"
    }

    #[test]
    fn utc_event_with_location() {
        let events = parse_ics_events(feed(), &vub(), MT_WY);
        assert_eq!(events.len(), 2);

        let first = &events[0];
        assert_eq!(first.title.as_deref(), Some("Student Orientation"));
        assert_eq!(first.start.as_deref(), Some("2025-04-10T16:00:00Z"));
        assert_eq!(first.end.as_deref(), Some("2025-04-10T18:00:00Z"));
        assert_eq!(first.city.as_deref(), Some("Billings"));
        assert_eq!(first.state.as_deref(), Some("MT"));
        assert_eq!(first.registration_url.as_deref(), Some("https://example.org/orientation"));
        assert_eq!(first.description.as_deref(), Some("Bring your DD-214."));
        assert_eq!(first.source.as_deref(), Some("veterans_upward_bound"));
    }

    #[test]
    fn tzid_and_title_fallback() {
        let events = parse_ics_events(feed(), &vub(), MT_WY);
        let casper = &events[1];
        assert_eq!(casper.title.as_deref(), Some("Veterans Upward Bound"));
        assert_eq!(casper.start.as_deref(), Some("2025-04-12T09:00:00"));
        assert_eq!(casper.timezone.as_deref(), Some("America/Denver"));
        assert_eq!(casper.state.as_deref(), Some("WY"));
        assert_eq!(casper.city.as_deref(), Some("Casper"));
    }

    #[test]
    fn all_day_events_are_skipped() {
        let events = parse_ics_events(feed(), &generic(), MT_WY);
        assert!(events.iter().all(|e| e.title.as_deref() != Some("Memorial Ride")));
    }

    #[test]
    fn state_from_state_name() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:ride@example.org\r\n\
                   DTSTART:20250501T150000Z\r\n\
                   SUMMARY:Memorial Ride\r\n\
                   LOCATION:Somewhere in Wyoming\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        let events = parse_ics_events(ics, &generic(), MT_WY);
        let ride = &events[0];
        assert_eq!(ride.state.as_deref(), Some("WY"));
        assert_eq!(ride.city, None);
        assert_eq!(ride.address.as_deref(), Some("Somewhere in Wyoming"));
    }

    #[test]
    fn generic_feed_without_region_has_no_state() {
        let ics = "BEGIN:VCALENDAR\r\n\
                   VERSION:2.0\r\n\
                   BEGIN:VEVENT\r\n\
                   UID:boise@example.org\r\n\
                   DTSTART:20250410T160000Z\r\n\
                   SUMMARY:Boise Meetup\r\n\
                   LOCATION:Boise, ID\r\n\
                   END:VEVENT\r\n\
                   END:VCALENDAR";
        let events = parse_ics_events(ics, &generic(), MT_WY);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].state, None);
        assert_eq!(events[0].title.as_deref(), Some("Boise Meetup"));
    }

    #[test]
    fn garbage_yields_nothing() {
        assert!(parse_ics_events("not a calendar", &generic(), MT_WY).is_empty());
    }

    #[test]
    fn urls_from_config_and_env() {
        let mut config = generic();
        config.urls = vec!["https://example.org/a.ics".to_string()];

        let urls = config
            .resolve_urls(|var| {
                (var == "PUBLIC_ICS_URLS")
                    .then(|| " https://example.org/b.ics, ,https://example.org/c.ics".to_string())
            })
            .unwrap();
        let urls: Vec<_> = urls.iter().map(Url::as_str).collect();
        assert_eq!(
            urls,
            vec![
                "https://example.org/a.ics",
                "https://example.org/b.ics",
                "https://example.org/c.ics"
            ]
        );

        assert!(generic().resolve_urls(|_| None).unwrap().is_empty());
        assert!(generic().resolve_urls(|_| Some("not a url".to_string())).is_err());
    }

    #[tokio::test]
    async fn no_urls_is_not_an_error() {
        let source = IcsSource::new(generic(), Vec::new(), MT_WY.to_vec(), &HttpConfig::default())
            .unwrap();
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
