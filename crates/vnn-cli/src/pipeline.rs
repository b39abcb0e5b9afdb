//! The run coordinator.
//!
//! ```text
//! sources ──collect()──▶ RawEvent ──process()──▶ EventRecord ──publish──▶ events.json, events.ics
//! ```
//!
//! Every source runs in its own task under a deadline. A source that fails,
//! times out or panics contributes zero events; the run goes on. Results are
//! concatenated in source order, whatever order the tasks finish in.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use vnn_core::{Deduplicator, EventRecord, Normalizer, RawEvent, RegionFilter};
use vnn_publisher::{ensure_output_dir, publish_ics, publish_json};
use vnn_sources::{ErrorSource, EventSource, SourceError};

use crate::config::PipelineConfig;
use crate::error::{CliError, CliResult};

/// How one source's fetch ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Ok,
    Failed(String),
    TimedOut,
    Panicked,
}

/// Per-source line of the run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReport {
    pub name: String,
    pub count: usize,
    pub outcome: SourceOutcome,
}

/// Output of [`collect`].
#[derive(Debug, Default)]
pub struct Collected {
    pub reports: Vec<SourceReport>,
    pub events: Vec<RawEvent>,
}

/// Output of [`process`].
#[derive(Debug, Default)]
pub struct Processed {
    pub normalized: usize,
    pub filtered: usize,
    pub records: Vec<EventRecord>,
}

/// What a run did.
#[derive(Debug)]
pub struct RunReport {
    pub sources: Vec<SourceReport>,
    pub collected: usize,
    pub normalized: usize,
    pub filtered: usize,
    pub unique: usize,
    pub json_path: PathBuf,
    pub ics_path: PathBuf,
}

/// Builds every configured source. A source that cannot be built is
/// replaced by one that reports the build error when fetched.
pub fn build_sources(config: &PipelineConfig) -> Vec<Arc<dyn EventSource>> {
    let ctx = config.build_context();
    config
        .sources
        .iter()
        .map(|source_config| match source_config.build(&ctx) {
            Ok(source) => source,
            Err(e) => {
                error!(source = %source_config.name(), error = %e, "Failed to build source");
                Arc::new(ErrorSource::new(source_config.name(), e)) as Arc<dyn EventSource>
            }
        })
        .collect()
}

/// Fetches every source concurrently, each under `timeout`.
pub async fn collect(sources: &[Arc<dyn EventSource>], timeout: Duration) -> Collected {
    let handles: Vec<_> = sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            tokio::spawn(async move { tokio::time::timeout(timeout, source.fetch()).await })
        })
        .collect();

    let mut collected = Collected::default();
    for (source, handle) in sources.iter().zip(handles) {
        let name = source.name().to_string();
        let (events, outcome) = match handle.await {
            Ok(Ok(Ok(events))) => {
                info!(source = %name, count = events.len(), "Fetched events");
                (events, SourceOutcome::Ok)
            }
            Ok(Ok(Err(e))) => {
                error!(source = %name, code = %e.code(), error = %e, "Source failed");
                (Vec::new(), SourceOutcome::Failed(e.to_string()))
            }
            Ok(Err(_elapsed)) => {
                let e = SourceError::timeout(format!("no response within {:?}", timeout))
                    .with_source_name(&name);
                error!(source = %name, error = %e, "Source timed out");
                (Vec::new(), SourceOutcome::TimedOut)
            }
            Err(join_error) => {
                error!(source = %name, error = %join_error, "Source task panicked");
                (Vec::new(), SourceOutcome::Panicked)
            }
        };

        collected.reports.push(SourceReport {
            name,
            count: events.len(),
            outcome,
        });
        collected.events.extend(events);
    }
    collected
}

/// Normalizes, filters and dedupes the collected candidates.
pub fn process(raws: &[RawEvent], config: &PipelineConfig, now: DateTime<Utc>) -> Processed {
    let normalized = Normalizer::new(config.reference_timezone).normalize_all(raws);

    let filter = RegionFilter::new(config.allowed_states.iter().copied(), config.lookahead_days);
    let filtered = fail_open("filter", normalized.clone(), |records| {
        filter.apply(&records, &now)
    });

    let deduper = Deduplicator::new().with_threshold(config.dedupe_threshold);
    let filtered_count = filtered.len();
    let unique = fail_open("dedupe", filtered, |records| deduper.dedupe(records));

    Processed {
        normalized: normalized.len(),
        filtered: filtered_count,
        records: unique,
    }
}

/// Runs `stage`; if it panics, logs and returns its input unchanged.
fn fail_open<F>(stage: &str, records: Vec<EventRecord>, f: F) -> Vec<EventRecord>
where
    F: FnOnce(Vec<EventRecord>) -> Vec<EventRecord>,
{
    let input = records.clone();
    match catch_unwind(AssertUnwindSafe(|| f(records))) {
        Ok(output) => output,
        Err(_) => {
            error!(stage, count = input.len(), "Stage panicked; passing records through");
            input
        }
    }
}

/// Collects, processes and publishes one run.
pub async fn run(
    config: &PipelineConfig,
    sources: &[Arc<dyn EventSource>],
    now: DateTime<Utc>,
) -> CliResult<RunReport> {
    info!(sources = sources.len(), "Starting run");

    let collected = collect(sources, config.fetch_timeout()).await;
    let processed = process(&collected.events, config, now);

    info!(
        "[Summary] collected={} normalized={} filtered={} unique={}",
        collected.events.len(),
        processed.normalized,
        processed.filtered,
        processed.records.len()
    );
    let failed: Vec<_> = collected
        .reports
        .iter()
        .filter(|r| r.outcome != SourceOutcome::Ok)
        .map(|r| r.name.as_str())
        .collect();
    if !failed.is_empty() {
        warn!(failed = ?failed, "Some sources contributed no events");
    }

    ensure_output_dir(&config.output_dir).map_err(CliError::OutputDir)?;
    let json_path = publish_json(&processed.records, &config.output_dir, &config.public_base_url)
        .map_err(CliError::PublishJson)?;
    let ics_path =
        publish_ics(&processed.records, &config.output_dir).map_err(CliError::PublishIcs)?;
    debug!(json = %json_path.display(), ics = %ics_path.display(), "Run finished");

    Ok(RunReport {
        sources: collected.reports,
        collected: collected.events.len(),
        normalized: processed.normalized,
        filtered: processed.filtered,
        unique: processed.records.len(),
        json_path,
        ics_path,
    })
}
