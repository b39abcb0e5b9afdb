//! EventSource trait and adapters.
//!
//! Every origin of event listings implements [`EventSource`] and returns
//! loosely-typed [`RawEvent`] candidates; the core pipeline does the rest.
//!
//! ```text
//! ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌────────┐ ┌───────────────┐
//! │ HTML page│ │ ICS feed │ │ Eventbrite │ │ Meetup │ │ Google Events │
//! └────┬─────┘ └────┬─────┘ └─────┬──────┘ └───┬────┘ └───────┬───────┘
//!      └────────────┴──── EventSource ─────────┴──────────────┘
//!                              │
//!                              ▼
//!                         Vec<RawEvent>
//! ```
//!
//! Adapters keep their parsing in pure functions (`parse_*`) so they can be
//! tested against fixtures without network access.

pub mod api;
pub mod config;
pub mod dates;
pub mod error;
pub mod html;
pub mod http;
pub mod ics;
pub mod location;
pub mod source;

pub use api::{
    BoundingBox, EventScope, EventbriteConfig, EventbriteSource, GoogleEventsConfig,
    GoogleEventsSource, MeetupConfig, MeetupSource, SearchArea, SearchWindow, VETERAN_KEYWORDS,
};
pub use config::{BuildContext, SourceConfig, default_sources};
pub use error::{SourceError, SourceErrorCode, SourceResult};
pub use html::{HtmlSource, HtmlSourceConfig, parse_html_events};
pub use http::HttpConfig;
pub use ics::{IcsSource, IcsSourceConfig, parse_ics_events};
pub use source::{BoxFuture, ErrorSource, EventSource, StaticSource};
pub use vnn_core::RawEvent;
