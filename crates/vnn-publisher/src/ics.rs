//! The iCalendar feed.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use icalendar::{Calendar, Component, Event, EventLike};
use sha2::{Digest, Sha256};
use tracing::info;

use vnn_core::EventRecord;

use crate::error::PublishResult;
use crate::json::sorted_for_feed;
use crate::write::write_atomically;

pub const ICS_FILE_NAME: &str = "events.ics";

const CALENDAR_NAME: &str = "VNN Events";

/// Producer identifier written as the calendar's PRODID.
const PRODUCT_ID: &str = "-//VNN Events//";

/// A stable UID: the same source, title and start always give the same UID,
/// so calendar clients update events instead of duplicating them.
pub fn event_uid(record: &EventRecord) -> String {
    let key = format!(
        "{}|{}|{}",
        record.source(),
        record.title(),
        record
            .start()
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    format!("{:x}@vnn-events", Sha256::digest(key.as_bytes()))
}

fn to_event(record: &EventRecord) -> Event {
    let mut event = Event::new();
    event
        .uid(&event_uid(record))
        .summary(record.title())
        .starts(record.start().with_timezone(&Utc));
    if let Some(end) = record.end() {
        event.ends(end.with_timezone(&Utc));
    }
    event.location(&record.location_line());
    if let Some(url) = record.registration_url() {
        event.add_property("URL", url);
    }
    if let Some(description) = record.description() {
        event.description(description);
    }
    event.done()
}

/// Renders the calendar document, events in feed order.
pub fn render_ics(records: &[EventRecord]) -> String {
    let mut calendar = Calendar::new();
    calendar.name(CALENDAR_NAME);
    for record in sorted_for_feed(records) {
        calendar.push(to_event(record));
    }
    with_product_id(&calendar.done().to_string())
}

/// Replaces whatever PRODID the renderer wrote with [`PRODUCT_ID`].
fn with_product_id(ics: &str) -> String {
    let product_line = format!("PRODID:{}", PRODUCT_ID);
    let mut lines: Vec<&str> = ics
        .split("\r\n")
        .filter(|line| !line.starts_with("PRODID:"))
        .collect();
    let after = lines
        .iter()
        .position(|line| *line == "BEGIN:VCALENDAR")
        .map_or(0, |i| i + 1);
    lines.insert(after, &product_line);
    lines.join("\r\n")
}

/// Writes `events.ics` into `out_dir` and returns its path.
pub fn publish_ics(records: &[EventRecord], out_dir: &Path) -> PublishResult<PathBuf> {
    let body = render_ics(records);
    let path = write_atomically(out_dir, ICS_FILE_NAME, &body)?;
    info!(path = %path.display(), event_count = records.len(), "Published iCalendar feed");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnn_core::{RawEvent, normalize};

    fn full_record() -> EventRecord {
        normalize(
            &RawEvent::new("eventbrite")
                .with_title("Veterans Resource Fair")
                .with_start("2025-04-10T10:00:00-06:00")
                .with_end("2025-04-10T14:00:00-06:00")
                .with_venue_name("MetraPark")
                .with_city("Billings")
                .with_state("MT")
                .with_postal_code("59105")
                .with_registration_url("https://www.eventbrite.com/e/123")
                .with_description("Benefits and jobs."),
        )
        .unwrap()
    }

    fn minimal_record() -> EventRecord {
        normalize(
            &RawEvent::new("ics")
                .with_title("Coffee")
                .with_start("2025-04-12T08:00:00-06:00")
                .with_state("WY"),
        )
        .unwrap()
    }

    /// Unfolded `NAME:value` lines of the first VEVENT.
    fn vevent_lines(ics: &str) -> Vec<String> {
        let unfolded = ics.replace("\r\n ", "");
        unfolded
            .lines()
            .skip_while(|l| *l != "BEGIN:VEVENT")
            .take_while(|l| *l != "END:VEVENT")
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn full_event_properties() {
        let ics = render_ics(&[full_record()]);
        let lines = vevent_lines(&ics);

        assert!(lines.contains(&"SUMMARY:Veterans Resource Fair".to_string()));
        assert!(lines.contains(&"DTSTART:20250410T160000Z".to_string()));
        assert!(lines.contains(&"DTEND:20250410T200000Z".to_string()));
        let location = lines.iter().find(|l| l.starts_with("LOCATION:")).unwrap();
        assert_eq!(location.replace('\\', ""), "LOCATION:MetraPark, Billings, MT, 59105");
        assert!(lines.contains(&"URL:https://www.eventbrite.com/e/123".to_string()));
        assert!(lines.contains(&"DESCRIPTION:Benefits and jobs.".to_string()));
        assert!(lines.contains(&format!("UID:{}", event_uid(&full_record()))));
    }

    #[test]
    fn optional_properties_are_omitted() {
        let ics = render_ics(&[minimal_record()]);
        let lines = vevent_lines(&ics);

        assert!(lines.contains(&"LOCATION:WY".to_string()));
        assert!(!lines.iter().any(|l| l.starts_with("DTEND")));
        assert!(!lines.iter().any(|l| l.starts_with("URL")));
        assert!(!lines.iter().any(|l| l.starts_with("DESCRIPTION")));
    }

    #[test]
    fn calendar_wrapper() {
        let ics = render_ics(&[full_record(), minimal_record()]);
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.contains("VERSION:2.0"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.trim_end().ends_with("END:VCALENDAR"));
    }

    #[test]
    fn calendar_carries_one_product_id() {
        let ics = render_ics(&[minimal_record()]);
        let product_lines: Vec<_> = ics.lines().filter(|l| l.starts_with("PRODID:")).collect();
        assert_eq!(product_lines, vec!["PRODID:-//VNN Events//"]);
        // PRODID stays in the calendar header, ahead of the events.
        let prodid_at = ics.find("PRODID:").unwrap();
        assert!(prodid_at < ics.find("BEGIN:VEVENT").unwrap());
        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
    }

    #[test]
    fn empty_calendar_is_valid() {
        let ics = render_ics(&[]);
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }

    mod uid {
        use super::*;

        #[test]
        fn stable_across_offsets() {
            let denver = full_record();
            let utc = normalize(
                &RawEvent::new("eventbrite")
                    .with_title("Veterans Resource Fair")
                    .with_start("2025-04-10T16:00:00Z")
                    .with_state("MT"),
            )
            .unwrap();
            assert_eq!(event_uid(&denver), event_uid(&utc));
        }

        #[test]
        fn differs_by_source() {
            let a = full_record();
            let b = normalize(
                &RawEvent::new("meetup")
                    .with_title("Veterans Resource Fair")
                    .with_start("2025-04-10T10:00:00-06:00")
                    .with_state("MT"),
            )
            .unwrap();
            assert_ne!(event_uid(&a), event_uid(&b));
        }

        #[test]
        fn shape() {
            let uid = event_uid(&minimal_record());
            let (hash, domain) = uid.split_once('@').unwrap();
            assert_eq!(hash.len(), 64);
            assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
            assert_eq!(domain, "vnn-events");
        }
    }

    #[test]
    fn publish_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = publish_ics(&[minimal_record()], dir.path()).unwrap();
        assert_eq!(path, dir.path().join("events.ics"));
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("SUMMARY:Coffee"));
    }
}
