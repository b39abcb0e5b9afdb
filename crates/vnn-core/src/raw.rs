//! Raw event candidates as produced by source adapters.
//!
//! A [`RawEvent`] is deliberately loose: every field is optional and text is
//! kept as the source delivered it. Adapters fill it with the `with_*`
//! builders, or hand over an arbitrary JSON object through
//! [`RawEvent::from_value`]. The normalizer decides what survives.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw, unvalidated event candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event title.
    pub title: Option<String>,
    /// Start timestamp, ISO 8601 (with or without offset) or a bare date.
    pub start: Option<String>,
    /// End timestamp, same formats as `start`.
    pub end: Option<String>,
    /// IANA zone name used to interpret naive timestamps and for display.
    pub timezone: Option<String>,
    pub venue_name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    /// Two-letter region code. Adapters resolve full names before this point.
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub cost: Option<String>,
    pub registration_url: Option<String>,
    /// Adapter identifier.
    pub source: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl RawEvent {
    /// Creates an empty candidate tagged with the adapter that produced it.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Self::default()
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to set the start timestamp.
    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(start.into());
        self
    }

    /// Builder method to set the end timestamp.
    pub fn with_end(mut self, end: impl Into<String>) -> Self {
        self.end = Some(end.into());
        self
    }

    /// Builder method to set the display timezone.
    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }

    pub fn with_venue_name(mut self, venue: impl Into<String>) -> Self {
        self.venue_name = Some(venue.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_postal_code(mut self, postal_code: impl Into<String>) -> Self {
        self.postal_code = Some(postal_code.into());
        self
    }

    pub fn with_cost(mut self, cost: impl Into<String>) -> Self {
        self.cost = Some(cost.into());
        self
    }

    pub fn with_registration_url(mut self, url: impl Into<String>) -> Self {
        self.registration_url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_coordinates(mut self, lat: f64, lon: f64) -> Self {
        self.lat = Some(lat);
        self.lon = Some(lon);
        self
    }

    /// Builds a candidate from an arbitrary JSON object.
    ///
    /// Text fields accept strings, numbers and booleans; `lat`/`lon` accept
    /// numbers or numeric strings; `tags` accepts a single string or an
    /// array. Unknown keys and values of the wrong shape are ignored, and a
    /// non-object value yields an empty candidate.
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };
        let text = |key: &str| map.get(key).and_then(coerce_text);
        let number = |key: &str| map.get(key).and_then(coerce_number);

        Self {
            title: text("title"),
            start: text("start"),
            end: text("end"),
            timezone: text("timezone"),
            venue_name: text("venue_name"),
            address: text("address"),
            city: text("city"),
            state: text("state"),
            postal_code: text("postal_code"),
            country: text("country"),
            cost: text("cost"),
            registration_url: text("registration_url"),
            source: text("source"),
            description: text("description"),
            tags: map.get("tags").map(coerce_tags).unwrap_or_default(),
            lat: number("lat"),
            lon: number("lon"),
        }
    }
}

fn coerce_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

fn coerce_tags(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().filter_map(coerce_text).collect(),
        _ => Vec::new(),
    }
}
