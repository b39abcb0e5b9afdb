//! Meetup upcoming-events search.

use chrono::{DateTime, SecondsFormat};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use vnn_core::{RawEvent, StateCode};

use super::{
    EventScope, SearchArea, SearchWindow, default_areas, default_keywords, merge_area_results,
    str_at,
};
use crate::error::{SourceError, SourceResult};
use crate::http::{HttpConfig, HttpFetcher};
use crate::source::{BoxFuture, EventSource};

const SEARCH_ENDPOINT: &str = "https://api.meetup.com/find/upcoming_events";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetupConfig {
    pub name: String,
    /// Environment variable holding the OAuth token.
    pub token_env: String,
    pub areas: Vec<SearchArea>,
    pub scope: EventScope,
    pub keywords: Vec<String>,
    pub radius_miles: u32,
    pub page_size: u32,
}

impl Default for MeetupConfig {
    fn default() -> Self {
        Self {
            name: "meetup".to_string(),
            token_env: "MEETUP_TOKEN".to_string(),
            areas: default_areas(),
            scope: EventScope::default(),
            keywords: default_keywords(),
            radius_miles: 300,
            page_size: 200,
        }
    }
}

/// Searches Meetup around each configured area.
pub struct MeetupSource {
    config: MeetupConfig,
    token: Option<String>,
    window: SearchWindow,
    fetcher: HttpFetcher,
}

impl MeetupSource {
    pub fn new(
        config: MeetupConfig,
        token: Option<String>,
        window: SearchWindow,
        http: &HttpConfig,
    ) -> SourceResult<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(http)?,
            config,
            token: token.filter(|t| !t.trim().is_empty()),
            window,
        })
    }
}

impl EventSource for MeetupSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let Some(ref token) = self.token else {
                info!(
                    source = %self.config.name,
                    env = %self.config.token_env,
                    "No API token set, skipping"
                );
                return Ok(Vec::new());
            };

            let mut results = Vec::with_capacity(self.config.areas.len());
            for area in &self.config.areas {
                let url = build_search_url(&self.config, area)?;
                let result = self
                    .fetcher
                    .get_json(&url, Some(token.as_str()))
                    .await
                    .map(|body| {
                        parse_meetup(&body, &self.config.name, area.state, self.window.timezone)
                    });
                results.push((area.state, result));
            }

            let events = merge_area_results(&self.config.name, results)?;
            info!(source = %self.config.name, event_count = events.len(), "Searched Meetup");
            Ok(events)
        })
    }
}

pub fn build_search_url(config: &MeetupConfig, area: &SearchArea) -> SourceResult<Url> {
    let (lat, lon) = area.bbox.center();
    let mut params = vec![
        ("lat", lat.to_string()),
        ("lon", lon.to_string()),
        ("radius", config.radius_miles.to_string()),
        ("page", config.page_size.to_string()),
    ];
    if let Some(text) = config.scope.query(&config.keywords, " ") {
        params.push(("text", text));
    }

    Url::parse_with_params(SEARCH_ENDPOINT, &params)
        .map_err(|e| SourceError::internal(format!("invalid search URL: {}", e)).with_cause(e))
}

/// Maps a Meetup response to candidates.
///
/// `time` is epoch milliseconds and is rendered in `timezone`. A venue
/// without a state is assumed to be in the searched area.
pub fn parse_meetup(body: &Value, source: &str, area: StateCode, timezone: Tz) -> Vec<RawEvent> {
    let Some(events) = body.get("events").and_then(Value::as_array) else {
        debug!(source = %source, "Response has no events array");
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|ev| {
            let title = str_at(ev, "/name")?;
            let millis = ev.get("time").and_then(Value::as_i64).filter(|t| *t != 0)?;
            let start = DateTime::from_timestamp_millis(millis)?
                .with_timezone(&timezone)
                .to_rfc3339_opts(SecondsFormat::Secs, false);

            let mut raw = RawEvent::new(source)
                .with_title(title)
                .with_start(start)
                .with_timezone(timezone.name());
            if let Some(link) = str_at(ev, "/link") {
                raw = raw.with_registration_url(link);
            }
            if let Some(venue) = str_at(ev, "/venue/name") {
                raw = raw.with_venue_name(venue);
            }
            if let Some(address) = str_at(ev, "/venue/address_1") {
                raw = raw.with_address(address);
            }
            if let Some(city) = str_at(ev, "/venue/city") {
                raw = raw.with_city(city);
            }
            if let Some(zip) = str_at(ev, "/venue/zip") {
                raw = raw.with_postal_code(zip);
            }
            let state = str_at(ev, "/venue/state").unwrap_or(area.as_str());
            raw = raw.with_state(state);

            let lat = ev.pointer("/venue/lat").and_then(Value::as_f64);
            let lon = ev.pointer("/venue/lon").and_then(Value::as_f64);
            if let (Some(lat), Some(lon)) = (lat, lon) {
                raw = raw.with_coordinates(lat, lon);
            }

            Some(raw)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const DENVER: Tz = chrono_tz::America::Denver;

    fn fixture() -> Value {
        json!({
            "city": {"city": "Helena"},
            "events": [
                {
                    "name": "Vets Coffee Hour",
                    "time": 1_744_300_800_000_i64,
                    "link": "https://www.meetup.com/helena-vets/events/1/",
                    "venue": {
                        "name": "Hub Coffee",
                        "address_1": "1 Last Chance Gulch",
                        "city": "Helena",
                        "state": "MT",
                        "zip": "59601",
                        "lat": 46.59,
                        "lon": -112.04
                    }
                },
                {
                    "name": "Online Support Group",
                    "time": 1_744_387_200_000_i64
                },
                {"name": "No time"},
                {"name": "Zero time", "time": 0},
                {
                    "name": "Boise Hike",
                    "time": 1_744_387_200_000_i64,
                    "venue": {"city": "Boise", "state": "ID"}
                }
            ]
        })
    }

    #[test]
    fn maps_events() {
        let events = parse_meetup(&fixture(), "meetup", StateCode::Mt, DENVER);
        assert_eq!(events.len(), 3);

        let coffee = &events[0];
        assert_eq!(coffee.title.as_deref(), Some("Vets Coffee Hour"));
        // 2025-04-10T16:00:00Z in Denver (MDT).
        assert_eq!(coffee.start.as_deref(), Some("2025-04-10T10:00:00-06:00"));
        assert_eq!(coffee.timezone.as_deref(), Some("America/Denver"));
        assert_eq!(coffee.city.as_deref(), Some("Helena"));
        assert_eq!(coffee.state.as_deref(), Some("MT"));
        assert_eq!(coffee.postal_code.as_deref(), Some("59601"));
        assert_eq!(coffee.venue_name.as_deref(), Some("Hub Coffee"));
        assert_eq!(coffee.lon, Some(-112.04));
        assert_eq!(
            coffee.registration_url.as_deref(),
            Some("https://www.meetup.com/helena-vets/events/1/")
        );
    }

    #[test]
    fn venue_state_wins_over_area() {
        let events = parse_meetup(&fixture(), "meetup", StateCode::Wy, DENVER);
        assert_eq!(events[1].state.as_deref(), Some("WY"));
        assert_eq!(events[2].state.as_deref(), Some("ID"));
    }

    #[test]
    fn search_url() {
        let url = build_search_url(&MeetupConfig::default(), &default_areas()[1]).unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(url.path(), "/find/upcoming_events");
        assert_eq!(pairs["radius"], "300");
        assert_eq!(pairs["page"], "200");
        assert_eq!(pairs["text"], "veteran veterans military VFW American Legion");
    }

    #[tokio::test]
    async fn missing_token_returns_nothing() {
        let source = MeetupSource::new(
            MeetupConfig::default(),
            None,
            SearchWindow::default(),
            &HttpConfig::default(),
        )
        .unwrap();
        assert!(source.fetch().await.unwrap().is_empty());
    }
}
