//! Region and lookahead-window filtering.

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::debug;

use crate::record::EventRecord;
use crate::region::StateCode;

/// Keeps records in an allowed region whose start lies in
/// `[now, now + lookahead_days]`, both ends inclusive.
#[derive(Debug, Clone)]
pub struct RegionFilter {
    allowed_states: BTreeSet<StateCode>,
    lookahead: Duration,
}

impl RegionFilter {
    pub fn new(allowed_states: impl IntoIterator<Item = StateCode>, lookahead_days: u32) -> Self {
        Self {
            allowed_states: allowed_states.into_iter().collect(),
            lookahead: Duration::days(i64::from(lookahead_days)),
        }
    }

    pub fn allowed_states(&self) -> &BTreeSet<StateCode> {
        &self.allowed_states
    }

    /// Applies the filter against a single evaluation instant.
    pub fn apply<Z: TimeZone>(&self, records: &[EventRecord], now: &DateTime<Z>) -> Vec<EventRecord> {
        let window_start = now.with_timezone(&Utc);
        let window_end = window_start
            .checked_add_signed(self.lookahead)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let kept: Vec<EventRecord> = records
            .iter()
            .filter(|record| self.allowed_states.contains(&record.state()))
            .filter(|record| {
                let start = record.start().with_timezone(&Utc);
                window_start <= start && start <= window_end
            })
            .cloned()
            .collect();

        debug!(
            input = records.len(),
            kept = kept.len(),
            window_start = %window_start,
            window_end = %window_end,
            "Filtered events by region and window"
        );
        kept
    }
}

/// Filters against the current time in `reference_timezone`.
pub fn filter_records(
    records: &[EventRecord],
    allowed_states: &BTreeSet<StateCode>,
    lookahead_days: u32,
    reference_timezone: Tz,
) -> Vec<EventRecord> {
    let now = Utc::now().with_timezone(&reference_timezone);
    RegionFilter::new(allowed_states.iter().copied(), lookahead_days).apply(records, &now)
}
