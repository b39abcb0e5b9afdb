//! Eventbrite event search.

use chrono::{DateTime, SecondsFormat, TimeZone};
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

const SEARCH_ENDPOINT: &str = "https://www.eventbriteapi.com/v3/events/search/";

/// Configuration for the Eventbrite source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventbriteConfig {
    pub name: String,
    /// Environment variable holding the OAuth token.
    pub token_env: String,
    pub areas: Vec<SearchArea>,
    pub scope: EventScope,
    pub keywords: Vec<String>,
    /// Search radius around each area centre, e.g. `300mi`.
    pub radius: String,
}

impl Default for EventbriteConfig {
    fn default() -> Self {
        Self {
            name: "eventbrite".to_string(),
            token_env: "EVENTBRITE_TOKEN".to_string(),
            areas: default_areas(),
            scope: EventScope::default(),
            keywords: default_keywords(),
            radius: "300mi".to_string(),
        }
    }
}

/// Searches Eventbrite around each configured area.
pub struct EventbriteSource {
    config: EventbriteConfig,
    token: Option<String>,
    window: SearchWindow,
    fetcher: HttpFetcher,
}

impl EventbriteSource {
    pub fn new(
        config: EventbriteConfig,
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

impl EventSource for EventbriteSource {
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

            let now = chrono::Utc::now();
            let mut results = Vec::with_capacity(self.config.areas.len());
            for area in &self.config.areas {
                let url = build_search_url(&self.config, area, &self.window, &now)?;
                let result = self
                    .fetcher
                    .get_json(&url, Some(token.as_str()))
                    .await
                    .map(|body| parse_eventbrite(&body, &self.config.name, area.state));
                results.push((area.state, result));
            }

            let events = merge_area_results(&self.config.name, results)?;
            info!(source = %self.config.name, event_count = events.len(), "Searched Eventbrite");
            Ok(events)
        })
    }
}

/// Builds the search request for one area.
pub fn build_search_url<Z: TimeZone>(
    config: &EventbriteConfig,
    area: &SearchArea,
    window: &SearchWindow,
    now: &DateTime<Z>,
) -> SourceResult<Url> {
    let (lat, lon) = area.bbox.center();
    let local_now = now.with_timezone(&window.timezone);
    let range_end = local_now
        .checked_add_signed(chrono::Duration::days(i64::from(window.lookahead_days)))
        .unwrap_or(local_now);

    let mut params = vec![
        ("expand", "venue".to_string()),
        ("sort_by", "date".to_string()),
        ("location.within", config.radius.clone()),
        ("location.latitude", lat.to_string()),
        ("location.longitude", lon.to_string()),
        (
            "start_date.range_start",
            local_now.to_rfc3339_opts(SecondsFormat::Secs, false),
        ),
        (
            "start_date.range_end",
            range_end.to_rfc3339_opts(SecondsFormat::Secs, false),
        ),
    ];
    if let Some(q) = config.scope.query(&config.keywords, " OR ") {
        params.push(("q", q));
    }

    Url::parse_with_params(SEARCH_ENDPOINT, &params)
        .map_err(|e| SourceError::internal(format!("invalid search URL: {}", e)).with_cause(e))
}

/// Maps an Eventbrite search response to candidates.
///
/// Events without a name or a UTC start are skipped. A venue without a
/// region is assumed to be in the searched area.
pub fn parse_eventbrite(body: &Value, source: &str, area: StateCode) -> Vec<RawEvent> {
    let Some(events) = body.get("events").and_then(Value::as_array) else {
        debug!(source = %source, "Response has no events array");
        return Vec::new();
    };

    events
        .iter()
        .filter_map(|ev| {
            let title = str_at(ev, "/name/text")?;
            let start = str_at(ev, "/start/utc")?;

            let mut raw = RawEvent::new(source).with_title(title).with_start(start);
            if let Some(end) = str_at(ev, "/end/utc") {
                raw = raw.with_end(end);
            }
            if let Some(tz) = str_at(ev, "/start/timezone") {
                raw = raw.with_timezone(tz);
            }
            if let Some(url) = str_at(ev, "/url") {
                raw = raw.with_registration_url(url);
            }
            if let Some(description) = str_at(ev, "/description/text") {
                raw = raw.with_description(description);
            }
            if ev.get("is_free").and_then(Value::as_bool) == Some(true) {
                raw = raw.with_cost("Free");
            }

            if let Some(venue) = str_at(ev, "/venue/name") {
                raw = raw.with_venue_name(venue);
            }
            if let Some(city) = str_at(ev, "/venue/address/city") {
                raw = raw.with_city(city);
            }
            if let Some(postal) = str_at(ev, "/venue/address/postal_code") {
                raw = raw.with_postal_code(postal);
            }
            if let Some(address) = str_at(ev, "/venue/address/localized_address_display") {
                raw = raw.with_address(address);
            }
            let state = match str_at(ev, "/venue/address/region") {
                Some(region) => StateCode::from_code_or_name(region)
                    .map(|s| s.as_str().to_string())
                    .unwrap_or_else(|| region.to_string()),
                None => area.as_str().to_string(),
            };
            raw = raw.with_state(state);

            let lat = str_at(ev, "/venue/latitude").and_then(|v| v.parse().ok());
            let lon = str_at(ev, "/venue/longitude").and_then(|v| v.parse().ok());
            if let (Some(lat), Some(lon)) = (lat, lon) {
                raw = raw.with_coordinates(lat, lon);
            }

            Some(raw)
        })
        .collect()
}
