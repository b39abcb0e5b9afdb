//! Event listings scraped from HTML pages.
//!
//! A page is described by CSS selectors: the card selectors pick one element
//! per event, and title/time/link/location are looked up inside each card.
//! Markup changes are handled by editing the selectors in configuration.
//!
//! ```toml
//! [[sources]]
//! kind = "html"
//! name = "adaptive_performance_center"
//! url = "https://www.adaptiveperformancecenter.org/events/"
//! card_selectors = [".tribe-events-calendar-list__event", ".event", "article", "li"]
//! default_city = "Billings"
//! default_state = "MT"
//! ```

mod parse;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use vnn_core::{RawEvent, StateCode};

use crate::error::{SourceError, SourceResult};
use crate::http::{HttpConfig, HttpFetcher};
use crate::source::{BoxFuture, EventSource};

pub use parse::parse_html_events;

/// Configuration for one scraped page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HtmlSourceConfig {
    /// Source identifier.
    pub name: String,

    /// Page listing the events.
    pub url: String,

    /// Selectors for event cards. All are tried together.
    #[serde(default = "default_card_selectors")]
    pub card_selectors: Vec<String>,

    /// Used only when `card_selectors` match nothing.
    #[serde(default)]
    pub fallback_selectors: Vec<String>,

    /// Title element inside a card.
    #[serde(default = "default_title_selector")]
    pub title_selector: String,

    /// Location element inside a card, e.g. `.event-location`.
    #[serde(default)]
    pub location_selector: Option<String>,

    /// Look for a date in the whole card text when there is no `<time>`.
    #[serde(default)]
    pub scan_card_text: bool,

    /// City used when the card has no resolvable location.
    #[serde(default)]
    pub default_city: Option<String>,

    /// State used when the card has no resolvable location.
    #[serde(default)]
    pub default_state: Option<StateCode>,

    /// IANA zone for times without an offset.
    #[serde(default)]
    pub timezone: Option<String>,
}

fn default_card_selectors() -> Vec<String> {
    vec![
        "[data-event-card]".to_string(),
        ".event".to_string(),
        ".event-card".to_string(),
        ".tribe-events-calendar-list__event".to_string(),
    ]
}

fn default_title_selector() -> String {
    ".event-title, .tribe-events-calendar-list__event-title, h3, h2, a".to_string()
}

impl HtmlSourceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            card_selectors: default_card_selectors(),
            fallback_selectors: Vec::new(),
            title_selector: default_title_selector(),
            location_selector: None,
            scan_card_text: false,
            default_city: None,
            default_state: None,
            timezone: None,
        }
    }

    pub fn with_card_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.card_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_fallback_selectors<I, S>(mut self, selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fallback_selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_title_selector(mut self, selector: impl Into<String>) -> Self {
        self.title_selector = selector.into();
        self
    }

    pub fn with_location_selector(mut self, selector: impl Into<String>) -> Self {
        self.location_selector = Some(selector.into());
        self
    }

    pub fn with_scan_card_text(mut self, scan: bool) -> Self {
        self.scan_card_text = scan;
        self
    }

    pub fn with_default_place(mut self, city: Option<&str>, state: StateCode) -> Self {
        self.default_city = city.map(str::to_string);
        self.default_state = Some(state);
        self
    }

    /// Checks the URL and every selector.
    pub fn validate(&self) -> SourceResult<Url> {
        let url = Url::parse(&self.url).map_err(|e| {
            SourceError::configuration(format!("invalid page URL {:?}: {}", self.url, e))
        })?;
        parse::compile(&self.card_selectors.join(", "))?;
        parse::compile(&self.title_selector)?;
        if !self.fallback_selectors.is_empty() {
            parse::compile(&self.fallback_selectors.join(", "))?;
        }
        if let Some(ref selector) = self.location_selector {
            parse::compile(selector)?;
        }
        if let Some(ref tz) = self.timezone {
            tz.parse::<chrono_tz::Tz>().map_err(|_| {
                SourceError::configuration(format!("unknown timezone {:?}", tz))
            })?;
        }
        Ok(url)
    }
}

/// Scrapes one page.
pub struct HtmlSource {
    config: HtmlSourceConfig,
    url: Url,
    regions: Vec<StateCode>,
    fetcher: HttpFetcher,
}

impl HtmlSource {
    /// `regions` are the state codes recognized in card locations.
    pub fn new(
        config: HtmlSourceConfig,
        regions: Vec<StateCode>,
        http: &HttpConfig,
    ) -> SourceResult<Self> {
        let url = config
            .validate()
            .map_err(|e| e.with_source_name(&config.name))?;
        Ok(Self {
            fetcher: HttpFetcher::new(http)?,
            config,
            url,
            regions,
        })
    }
}

impl EventSource for HtmlSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>> {
        Box::pin(async move {
            let body = self
                .fetcher
                .get_text(&self.url, None)
                .await
                .map_err(|e| e.with_source_name(&self.config.name))?;

            let events = parse_html_events(&body, &self.url, &self.config, &self.regions)
                .map_err(|e| e.with_source_name(&self.config.name))?;

            info!(
                source = %self.config.name,
                event_count = events.len(),
                "Scraped events from page"
            );
            Ok(events)
        })
    }
}
