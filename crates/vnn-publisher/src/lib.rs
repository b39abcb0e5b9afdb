//! Feed publishing.
//!
//! The final, deduplicated record set is written as two static files:
//!
//! - `events.json`: `{"generated": true, "events": [...]}`, sorted by start,
//!   city and title
//! - `events.ics`: one VEVENT per record
//!
//! Both are written to a temporary file first and renamed into place, so a
//! failed run never leaves a truncated feed behind.

pub mod error;
pub mod ics;
pub mod json;
mod write;

pub use error::{PublishError, PublishResult};
pub use ics::{ICS_FILE_NAME, event_uid, publish_ics, render_ics};
pub use json::{JSON_FILE_NAME, publish_json, render_json, sorted_for_feed};
pub use write::ensure_output_dir;
