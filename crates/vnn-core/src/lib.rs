//! Core types: event records, normalization, region/time filter, dedupe
//!
//! The pipeline stages in this crate are pure and synchronous:
//!
//! ```text
//! RawEvent ──normalize()──▶ EventRecord ──RegionFilter──▶ Deduplicator ──▶ publish
//! ```

pub mod dedupe;
pub mod filter;
pub mod normalize;
pub mod raw;
pub mod record;
pub mod region;
pub mod similarity;
pub mod tracing;

pub use dedupe::{BucketKey, DEFAULT_SIMILARITY_THRESHOLD, Deduplicator, dedupe};
pub use filter::{RegionFilter, filter_records};
pub use normalize::{
    DEFAULT_TIMEZONE, InvalidRecord, Normalizer, normalize, normalize_events, parse_timestamp,
};
pub use raw::RawEvent;
pub use record::{DEFAULT_COUNTRY, DEFAULT_TAG, EventRecord};
pub use region::{StateCode, UnknownStateCode};
pub use similarity::{TitleSimilarity, TokenSetRatio};
pub use self::tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
