//! Source configuration and construction.
//!
//! Sources are configured as a list of tagged tables:
//!
//! ```toml
//! [[sources]]
//! kind = "ics"
//! name = "veterans_upward_bound"
//! urls_env = "VUB_ICS_URL"
//! default_state = "MT"
//!
//! [[sources]]
//! kind = "eventbrite"
//! scope = "all"
//! ```
//!
//! Credentials and feed URLs from the environment are read when a source is
//! built, not when it fetches.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vnn_core::StateCode;

use crate::api::{
    EventbriteConfig, EventbriteSource, GoogleEventsConfig, GoogleEventsSource, MeetupConfig,
    MeetupSource, SearchWindow,
};
use crate::error::SourceResult;
use crate::html::{HtmlSource, HtmlSourceConfig};
use crate::http::HttpConfig;
use crate::ics::{IcsSource, IcsSourceConfig};
use crate::source::EventSource;

/// Configuration for one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Html(HtmlSourceConfig),
    Ics(IcsSourceConfig),
    Eventbrite(EventbriteConfig),
    Meetup(MeetupConfig),
    GoogleEvents(GoogleEventsConfig),
}

/// Run-wide settings every source is built with.
#[derive(Debug, Clone)]
pub struct BuildContext {
    pub http: HttpConfig,
    /// Region codes recognized in free-text locations.
    pub regions: Vec<StateCode>,
    pub window: SearchWindow,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            regions: vec![StateCode::Mt, StateCode::Wy],
            window: SearchWindow::default(),
        }
    }
}

impl SourceConfig {
    pub fn name(&self) -> &str {
        match self {
            SourceConfig::Html(c) => &c.name,
            SourceConfig::Ics(c) => &c.name,
            SourceConfig::Eventbrite(c) => &c.name,
            SourceConfig::Meetup(c) => &c.name,
            SourceConfig::GoogleEvents(c) => &c.name,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SourceConfig::Html(_) => "html",
            SourceConfig::Ics(_) => "ics",
            SourceConfig::Eventbrite(_) => "eventbrite",
            SourceConfig::Meetup(_) => "meetup",
            SourceConfig::GoogleEvents(_) => "google_events",
        }
    }

    /// Checks what can be checked without the environment.
    pub fn validate(&self) -> SourceResult<()> {
        let result = match self {
            SourceConfig::Html(c) => c.validate().map(|_| ()),
            SourceConfig::Ics(c) => c.resolve_urls(|_| None).map(|_| ()),
            _ => Ok(()),
        };
        result.map_err(|e| e.with_source_name(self.name()))
    }

    /// Builds the source, reading credentials from the process environment.
    pub fn build(&self, ctx: &BuildContext) -> SourceResult<Arc<dyn EventSource>> {
        self.build_with_env(ctx, |var| std::env::var(var).ok())
    }

    /// Builds the source with an explicit environment lookup.
    pub fn build_with_env(
        &self,
        ctx: &BuildContext,
        env: impl Fn(&str) -> Option<String>,
    ) -> SourceResult<Arc<dyn EventSource>> {
        debug!(source = %self.name(), kind = self.kind(), "Building source");

        let source: Arc<dyn EventSource> = match self {
            SourceConfig::Html(c) => {
                Arc::new(HtmlSource::new(c.clone(), ctx.regions.clone(), &ctx.http)?)
            }
            SourceConfig::Ics(c) => {
                let urls = c
                    .resolve_urls(&env)
                    .map_err(|e| e.with_source_name(&c.name))?;
                Arc::new(IcsSource::new(c.clone(), urls, ctx.regions.clone(), &ctx.http)?)
            }
            SourceConfig::Eventbrite(c) => Arc::new(EventbriteSource::new(
                c.clone(),
                env(&c.token_env),
                ctx.window,
                &ctx.http,
            )?),
            SourceConfig::Meetup(c) => Arc::new(MeetupSource::new(
                c.clone(),
                env(&c.token_env),
                ctx.window,
                &ctx.http,
            )?),
            SourceConfig::GoogleEvents(c) => Arc::new(GoogleEventsSource::new(
                c.clone(),
                env(&c.key_env),
                ctx.window,
                &ctx.http,
            )?),
        };
        Ok(source)
    }
}

/// The stock source list for Montana and Wyoming.
///
/// Veterans Upward Bound comes last: on a duplicate, the first-seen record
/// keeps its slot in the output.
pub fn default_sources() -> Vec<SourceConfig> {
    vec![
        SourceConfig::Html(
            HtmlSourceConfig::new("impact_montana", "https://impactmontana.org/events")
                .with_fallback_selectors(["a[href*='/event']", "article", "li"])
                .with_location_selector(".event-location")
                .with_scan_card_text(true)
                .with_default_place(None, StateCode::Mt),
        ),
        SourceConfig::Html(
            HtmlSourceConfig::new(
                "adaptive_performance_center",
                "https://www.adaptiveperformancecenter.org/events/",
            )
            .with_card_selectors([
                ".tribe-events-calendar-list__event",
                ".event",
                "article",
                "li",
            ])
            .with_default_place(Some("Billings"), StateCode::Mt),
        ),
        SourceConfig::GoogleEvents(GoogleEventsConfig::default()),
        SourceConfig::Eventbrite(EventbriteConfig::default()),
        SourceConfig::Meetup(MeetupConfig::default()),
        SourceConfig::Ics(IcsSourceConfig::new("ics").with_urls_env("PUBLIC_ICS_URLS")),
        SourceConfig::Ics(
            IcsSourceConfig::new("veterans_upward_bound")
                .with_urls_env("VUB_ICS_URL")
                .with_title_fallback("Veterans Upward Bound")
                .with_default_state(StateCode::Mt),
        ),
    ]
}
