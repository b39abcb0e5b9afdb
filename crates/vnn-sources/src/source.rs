//! EventSource trait definition.

use std::future::Future;
use std::pin::Pin;

use vnn_core::RawEvent;

use crate::error::{SourceError, SourceResult};

/// A boxed future for async trait methods.
///
/// Keeps [`EventSource`] object-safe so the coordinator can hold a
/// heterogeneous `Vec<Arc<dyn EventSource>>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// One origin of event listings.
///
/// # Implementation Notes
///
/// - `fetch` takes no arguments: everything a source needs (URL, token,
///   search window) is fixed when it is built.
/// - A source with nothing to do (no token, no URL) returns `Ok(vec![])`.
/// - Partial failures inside a source (one of several feeds is down) should
///   be logged and skipped rather than failing the whole fetch.
pub trait EventSource: Send + Sync {
    /// Stable identifier, also written into each candidate's `source` field.
    fn name(&self) -> &str;

    /// Fetches and parses the source.
    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>>;
}

/// A source returning a fixed list of candidates.
#[derive(Debug, Clone)]
pub struct StaticSource {
    name: String,
    events: Vec<RawEvent>,
}

impl StaticSource {
    pub fn new(name: impl Into<String>, events: Vec<RawEvent>) -> Self {
        Self {
            name: name.into(),
            events,
        }
    }
}

impl EventSource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>> {
        let events = self.events.clone();
        Box::pin(async move { Ok(events) })
    }
}

/// A source that always fails.
///
/// Stands in for a source that could not be built so the failure is still
/// reported per source in the run summary.
#[derive(Debug)]
pub struct ErrorSource {
    name: String,
    error: SourceError,
}

impl ErrorSource {
    pub fn new(name: impl Into<String>, error: SourceError) -> Self {
        Self {
            name: name.into(),
            error,
        }
    }
}

impl EventSource for ErrorSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self) -> BoxFuture<'_, SourceResult<Vec<RawEvent>>> {
        let error =
            SourceError::new(self.error.code(), self.error.message()).with_source_name(&self.name);
        Box::pin(async move { Err(error) })
    }
}
