//! Google Events results through SerpAPI.
//!
//! Searches are text queries per region name ("... events in Montana"),
//! restricted to the lookahead window with a `tbs` date range.

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use url::Url;

use vnn_core::{RawEvent, StateCode};

use super::{EventScope, SearchWindow, default_keywords, merge_area_results, str_at};
use crate::error::{SourceError, SourceResult};
use crate::http::{HttpConfig, HttpFetcher};
use crate::location::resolve_place;
use crate::source::{BoxFuture, EventSource};

const SEARCH_ENDPOINT: &str = "https://serpapi.com/search.json";

/// Offset given to date-only results.
const DATE_ONLY_SUFFIX: &str = "T00:00:00-06:00";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleEventsConfig {
    pub name: String,
    /// Environment variable holding the SerpAPI key.
    pub key_env: String,
    /// Regions searched, by full name.
    pub regions: Vec<StateCode>,
    pub scope: EventScope,
    pub keywords: Vec<String>,
}

impl Default for GoogleEventsConfig {
    fn default() -> Self {
        Self {
            name: "google_events".to_string(),
            key_env: "SERPAPI_KEY".to_string(),
            regions: vec![StateCode::Mt, StateCode::Wy],
            scope: EventScope::default(),
            keywords: default_keywords(),
        }
    }
}

pub struct GoogleEventsSource {
    config: GoogleEventsConfig,
    api_key: Option<String>,
    window: SearchWindow,
    fetcher: HttpFetcher,
}

impl GoogleEventsSource {
    pub fn new(
        config: GoogleEventsConfig,
        api_key: Option<String>,
        window: SearchWindow,
        http: &HttpConfig,
    ) -> SourceResult<Self> {
        Ok(Self {
            fetcher: HttpFetcher::new(http)?,
            config,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            window,
        })
    }
}

impl EventSource for GoogleEventsSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let Some(ref api_key) = self.api_key else {
                info!(
                    source = %self.config.name,
                    env = %self.config.key_env,
                    "No API key set, skipping"
                );
                return Ok(Vec::new());
            };

            let now = chrono::Utc::now();
            let mut results = Vec::with_capacity(self.config.regions.len());
            for &region in &self.config.regions {
                let url = build_search_url(&self.config, region, api_key, &self.window, &now)?;
                // SerpAPI takes the key as a query parameter.
                let result = self
                    .fetcher
                    .get_json(&url, None)
                    .await
                    .map(|body| parse_google_events(&body, &self.config.name, &self.config.regions));
                results.push((region, result));
            }

            let events = merge_area_results(&self.config.name, results)?;
            info!(source = %self.config.name, event_count = events.len(), "Searched Google Events");
            Ok(events)
        })
    }
}

/// The search text for one region.
pub fn search_query(config: &GoogleEventsConfig, region: StateCode) -> String {
    let quoted: Vec<String> = config.keywords.iter().map(|k| format!("\"{}\"", k)).collect();
    match config.scope.query(&quoted, " OR ") {
        Some(keywords) => format!("({}) events in {}", keywords, region.name()),
        None => format!("events in {}", region.name()),
    }
}

pub fn build_search_url<Z: TimeZone>(
    config: &GoogleEventsConfig,
    region: StateCode,
    api_key: &str,
    window: &SearchWindow,
    now: &DateTime<Z>,
) -> SourceResult<Url> {
    let (start, end) = window.dates(now);
    let params = [
        ("engine", "google_events".to_string()),
        ("q", search_query(config, region)),
        ("hl", "en".to_string()),
        ("api_key", api_key.to_string()),
        (
            "tbs",
            format!(
                "cdr:1,cd_min:{},cd_max:{}",
                start.format("%Y-%m-%d"),
                end.format("%Y-%m-%d")
            ),
        ),
    ];

    Url::parse_with_params(SEARCH_ENDPOINT, &params)
        .map_err(|e| SourceError::internal(format!("invalid search URL: {}", e)).with_cause(e))
}

/// Maps a SerpAPI `google_events` response to candidates.
///
/// Only ISO-looking dates are accepted; free-form `when` strings such as
/// "Sat, Mar 8, 6 - 9 PM" are skipped.
pub fn parse_google_events(body: &Value, source: &str, regions: &[StateCode]) -> Vec<RawEvent> {
    let Some(results) = body.get("events_results").and_then(Value::as_array) else {
        debug!(source = %source, "Response has no events_results array");
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|item| {
            let title = str_at(item, "/title")?;
            let when = str_at(item, "/date/start_date")
                .or_else(|| str_at(item, "/date/when"))
                .or_else(|| str_at(item, "/date/start_time"))?;
            let start = iso_start(when)?;

            let mut raw = RawEvent::new(source).with_title(title).with_start(start);

            let address = match item.get("address") {
                Some(Value::Array(lines)) => lines
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
                Some(Value::String(line)) => line.clone(),
                _ => String::new(),
            };
            if let Some(place) = resolve_place(&address, regions) {
                if let Some(city) = place.city {
                    raw = raw.with_city(city);
                }
                raw = raw.with_state(place.state.as_str());
            }
            if !address.trim().is_empty() {
                raw = raw.with_address(address);
            }

            let link = str_at(item, "/link").or_else(|| str_at(item, "/ticket_info/0/link"));
            if let Some(link) = link {
                raw = raw.with_registration_url(link);
            }
            if let Some(venue) = str_at(item, "/venue/name") {
                raw = raw.with_venue_name(venue);
            }
            if let Some(description) = str_at(item, "/description") {
                raw = raw.with_description(description);
            }

            Some(raw)
        })
        .collect()
}

fn iso_start(when: &str) -> Option<String> {
    let bytes = when.as_bytes();
    let iso_like = bytes.len() >= 10 && bytes[4] == b'-' && bytes[7] == b'-';
    if !iso_like {
        return None;
    }
    if when.len() > 10 {
        Some(when.to_string())
    } else {
        Some(format!("{when}{DATE_ONLY_SUFFIX}"))
    }
}
