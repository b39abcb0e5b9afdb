//! The canonical event record.
//!
//! An [`EventRecord`] can only be built by the normalizer, so every record in
//! the pipeline has a non-empty title, a parsed start and a known region.
//! Records are never mutated afterwards; dedupe replaces them wholesale.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::Serialize;

use crate::region::StateCode;

/// Country applied when a source does not say.
pub const DEFAULT_COUNTRY: &str = "US";

/// Tag applied when a source supplies none.
pub const DEFAULT_TAG: &str = "veterans";

/// A validated event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventRecord {
    title: String,
    start: DateTime<FixedOffset>,
    end: Option<DateTime<FixedOffset>>,
    timezone: Tz,
    venue_name: Option<String>,
    address: Option<String>,
    city: Option<String>,
    state: StateCode,
    postal_code: Option<String>,
    country: String,
    cost: Option<String>,
    registration_url: Option<String>,
    source: String,
    description: Option<String>,
    tags: BTreeSet<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Field bundle handed from the normalizer to [`EventRecord::from_parts`].
#[derive(Debug)]
pub(crate) struct RecordParts {
    pub title: String,
    pub start: DateTime<FixedOffset>,
    pub end: Option<DateTime<FixedOffset>>,
    pub timezone: Tz,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: StateCode,
    pub postal_code: Option<String>,
    pub country: String,
    pub cost: Option<String>,
    pub registration_url: Option<String>,
    pub source: String,
    pub description: Option<String>,
    pub tags: BTreeSet<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl EventRecord {
    pub(crate) fn from_parts(parts: RecordParts) -> Self {
        debug_assert!(!parts.title.is_empty());
        Self {
            title: parts.title,
            start: parts.start,
            end: parts.end,
            timezone: parts.timezone,
            venue_name: parts.venue_name,
            address: parts.address,
            city: parts.city,
            state: parts.state,
            postal_code: parts.postal_code,
            country: parts.country,
            cost: parts.cost,
            registration_url: parts.registration_url,
            source: parts.source,
            description: parts.description,
            tags: parts.tags,
            lat: parts.lat,
            lon: parts.lon,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> DateTime<FixedOffset> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<FixedOffset>> {
        self.end
    }

    /// Display zone for this event.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn venue_name(&self) -> Option<&str> {
        self.venue_name.as_deref()
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn state(&self) -> StateCode {
        self.state
    }

    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn cost(&self) -> Option<&str> {
        self.cost.as_deref()
    }

    pub fn registration_url(&self) -> Option<&str> {
        self.registration_url.as_deref()
    }

    /// Identifier of the adapter that produced this record.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn lat(&self) -> Option<f64> {
        self.lat
    }

    pub fn lon(&self) -> Option<f64> {
        self.lon
    }

    /// Venue, address, city, state and postal code joined with `", "`,
    /// skipping the parts that are absent.
    pub fn location_line(&self) -> String {
        [
            self.venue_name(),
            self.address(),
            self.city(),
            Some(self.state.as_str()),
            self.postal_code(),
        ]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use crate::normalize::normalize;
    use crate::raw::RawEvent;

    #[test]
    fn location_line_skips_missing_parts() {
        let record = normalize(
            &RawEvent::new("test")
                .with_title("Job Fair")
                .with_start("2025-04-02T10:00:00-06:00")
                .with_venue_name("MetraPark")
                .with_city("Billings")
                .with_state("MT")
                .with_postal_code("59105"),
        )
        .unwrap();

        assert_eq!(record.location_line(), "MetraPark, Billings, MT, 59105");
    }

    #[test]
    fn serializes_with_iso_timestamps() {
        let record = normalize(
            &RawEvent::new("test")
                .with_title("Job Fair")
                .with_start("2025-04-02T10:00:00-06:00")
                .with_state("WY"),
        )
        .unwrap();

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["start"], "2025-04-02T10:00:00-06:00");
        assert_eq!(value["state"], "WY");
        assert_eq!(value["timezone"], "America/Denver");
        assert_eq!(value["country"], "US");
        assert_eq!(value["tags"], serde_json::json!(["veterans"]));
        assert!(value["end"].is_null());
    }
}
