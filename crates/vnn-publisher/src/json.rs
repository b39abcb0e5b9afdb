//! The JSON feed.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use vnn_core::EventRecord;

use crate::error::PublishResult;
use crate::write::write_atomically;

pub const JSON_FILE_NAME: &str = "events.json";

#[derive(Serialize)]
struct JsonFeed<'a> {
    generated: bool,
    events: Vec<&'a EventRecord>,
}

/// Records in feed order: start instant, then city (missing first), then
/// title.
pub fn sorted_for_feed(records: &[EventRecord]) -> Vec<&EventRecord> {
    let mut sorted: Vec<&EventRecord> = records.iter().collect();
    sorted.sort_by(|a, b| {
        a.start()
            .cmp(&b.start())
            .then_with(|| a.city().unwrap_or("").cmp(b.city().unwrap_or("")))
            .then_with(|| a.title().cmp(b.title()))
    });
    sorted
}

/// Renders the feed document.
pub fn render_json(records: &[EventRecord]) -> PublishResult<String> {
    let feed = JsonFeed {
        generated: true,
        events: sorted_for_feed(records),
    };
    Ok(serde_json::to_string(&feed)?)
}

/// Writes `events.json` into `out_dir` and returns its path.
///
/// `public_base_url` is only used to log where the feed will be served.
pub fn publish_json(
    records: &[EventRecord],
    out_dir: &Path,
    public_base_url: &str,
) -> PublishResult<PathBuf> {
    let body = render_json(records)?;
    let path = write_atomically(out_dir, JSON_FILE_NAME, &body)?;
    info!(
        path = %path.display(),
        public_url = %format!("{}/{}", public_base_url.trim_end_matches('/'), JSON_FILE_NAME),
        event_count = records.len(),
        "Published JSON feed"
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vnn_core::{RawEvent, normalize};

    fn record(title: &str, start: &str, city: Option<&str>) -> EventRecord {
        let mut raw = RawEvent::new("impact_montana")
            .with_title(title)
            .with_start(start)
            .with_state("MT");
        if let Some(city) = city {
            raw = raw.with_city(city);
        }
        normalize(&raw).unwrap()
    }

    #[test]
    fn feed_document_shape() {
        let records = vec![
            normalize(
                &RawEvent::new("impact_montana")
                    .with_title("Veterans Job Fair")
                    .with_start("2025-04-10T10:00:00-06:00")
                    .with_city("Billings")
                    .with_state("MT")
                    .with_registration_url("https://impactmontana.org/events/job-fair"),
            )
            .unwrap(),
        ];

        let output = render_json(&records).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        insta::assert_json_snapshot!(value, @r#"
        {
          "events": [
            {
              "address": null,
              "city": "Billings",
              "cost": null,
              "country": "US",
              "description": null,
              "end": null,
              "lat": null,
              "lon": null,
              "postal_code": null,
              "registration_url": "https://impactmontana.org/events/job-fair",
              "source": "impact_montana",
              "start": "2025-04-10T10:00:00-06:00",
              "state": "MT",
              "tags": [
                "veterans"
              ],
              "timezone": "America/Denver",
              "title": "Veterans Job Fair",
              "venue_name": null
            }
          ],
          "generated": true
        }
        "#);
    }

    #[test]
    fn empty_feed() {
        assert_eq!(render_json(&[]).unwrap(), r#"{"generated":true,"events":[]}"#);
    }

    mod ordering {
        use super::*;

        #[test]
        fn by_start_then_city_then_title() {
            let records = vec![
                record("Zumba for Vets", "2025-04-10T10:00:00-06:00", Some("Billings")),
                record("Later", "2025-04-11T09:00:00-06:00", None),
                record("Art Night", "2025-04-10T10:00:00-06:00", Some("Billings")),
                record("Coffee", "2025-04-10T10:00:00-06:00", Some("Bozeman")),
                record("No City", "2025-04-10T10:00:00-06:00", None),
            ];

            let titles: Vec<_> = sorted_for_feed(&records).iter().map(|r| r.title()).collect();
            assert_eq!(
                titles,
                vec!["No City", "Art Night", "Zumba for Vets", "Coffee", "Later"]
            );
        }

        #[test]
        fn start_compares_instants_across_offsets() {
            // 09:30 in Los Angeles is after 10:00 in Denver.
            let records = vec![
                record("Pacific", "2025-04-10T09:30:00-07:00", None),
                record("Mountain", "2025-04-10T10:00:00-06:00", None),
            ];
            let titles: Vec<_> = sorted_for_feed(&records).iter().map(|r| r.title()).collect();
            assert_eq!(titles, vec!["Mountain", "Pacific"]);
        }

        #[test]
        fn rendered_in_sorted_order() {
            let records = vec![
                record("Second", "2025-04-12T10:00:00-06:00", None),
                record("First", "2025-04-10T10:00:00-06:00", None),
            ];
            let value: serde_json::Value =
                serde_json::from_str(&render_json(&records).unwrap()).unwrap();
            assert_eq!(value["events"][0]["title"], "First");
            assert_eq!(value["events"][1]["title"], "Second");
        }
    }

    #[test]
    fn publish_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("docs");
        let records = vec![record("Honor Flight", "2025-05-01T08:00:00-06:00", Some("Helena"))];

        let path = publish_json(&records, &out, "https://example.github.io/vnn-events/").unwrap();
        assert_eq!(path, out.join("events.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written, render_json(&records).unwrap());
    }
}
