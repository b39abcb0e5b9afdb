//! Duplicate collapsing.
//!
//! Records are grouped by a coarse [`BucketKey`] and only compared with
//! records of the same bucket. Inside a bucket a candidate is matched against
//! the bucket's retained representatives in order of first appearance; the
//! first one scoring at or above the threshold is the same event. Matching is
//! deliberately not transitive: if A~B and B~C but A≁C, the outcome depends
//! on which of them became a representative first.
//!
//! The bucket key ignores time of day, so two different events on the same
//! day, in the same city, with near-identical titles are merged.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::{debug, trace};

use crate::record::EventRecord;
use crate::region::StateCode;
use crate::similarity::{TitleSimilarity, TokenSetRatio};

/// Score at or above which two titles in the same bucket are the same event.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 90.0;

/// Coarse grouping key: normalized title, start date, city, state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BucketKey {
    title: String,
    date: NaiveDate,
    city: String,
    state: StateCode,
}

impl BucketKey {
    pub fn of(record: &EventRecord) -> Self {
        Self {
            title: normalize_title(record.title()),
            date: record.start().date_naive(),
            city: record
                .city()
                .map(|c| c.trim().to_lowercase())
                .unwrap_or_default(),
            state: record.state(),
        }
    }
}

/// Lowercases, turns every non-alphanumeric character into a space and
/// collapses whitespace.
fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapses records describing the same event.
pub struct Deduplicator<S = TokenSetRatio> {
    similarity: S,
    threshold: f64,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub fn new() -> Self {
        Self {
            similarity: TokenSetRatio,
            threshold: DEFAULT_SIMILARITY_THRESHOLD,
        }
    }
}

impl<S: TitleSimilarity> Deduplicator<S> {
    /// Uses a custom scorer.
    pub fn with_similarity<T: TitleSimilarity>(self, similarity: T) -> Deduplicator<T> {
        Deduplicator {
            similarity,
            threshold: self.threshold,
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn same_event(&self, a: &EventRecord, b: &EventRecord) -> bool {
        self.similarity.score(a.title(), b.title()) >= self.threshold
    }

    /// Returns one representative per event, in order of first appearance.
    ///
    /// A candidate that matches a representative replaces it only when it is
    /// strictly better (see [`preference`]) and does not itself match another
    /// representative of the bucket, which keeps retained records pairwise
    /// distinct and makes the operation idempotent.
    pub fn dedupe(&self, records: Vec<EventRecord>) -> Vec<EventRecord> {
        let input_len = records.len();
        let mut kept: Vec<EventRecord> = Vec::with_capacity(input_len);
        let mut buckets: HashMap<BucketKey, Vec<usize>> = HashMap::new();

        for candidate in records {
            let slots = buckets.entry(BucketKey::of(&candidate)).or_default();

            let matched = slots
                .iter()
                .copied()
                .find(|&slot| self.same_event(&kept[slot], &candidate));

            let Some(slot) = matched else {
                slots.push(kept.len());
                kept.push(candidate);
                continue;
            };

            let current = &kept[slot];
            if preference(&candidate, current) <= preference(current, &candidate) {
                trace!(title = candidate.title(), source = candidate.source(), "Dropped duplicate");
                continue;
            }

            let clashes = slots
                .iter()
                .any(|&other| other != slot && self.same_event(&kept[other], &candidate));
            if clashes {
                trace!(
                    title = candidate.title(),
                    "Kept earlier representative; replacement would match another event"
                );
                continue;
            }

            trace!(
                title = candidate.title(),
                replaced_source = current.source(),
                source = candidate.source(),
                "Replaced representative with richer duplicate"
            );
            kept[slot] = candidate;
        }

        debug!(input = input_len, unique = kept.len(), "Deduplicated events");
        kept
    }
}

/// How many merge criteria `record` satisfies against `other`: having a
/// registration URL, and having a strictly longer description.
fn preference(record: &EventRecord, other: &EventRecord) -> u8 {
    let has_url = record.registration_url().is_some();
    let longer = description_len(record) > description_len(other);
    u8::from(has_url) + u8::from(longer)
}

fn description_len(record: &EventRecord) -> usize {
    record.description().map_or(0, |d| d.chars().count())
}

/// Dedupes with the default scorer and threshold.
pub fn dedupe(records: Vec<EventRecord>) -> Vec<EventRecord> {
    Deduplicator::new().dedupe(records)
}
