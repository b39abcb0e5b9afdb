//! Pipeline coordinator, configuration and the `vnn-events` command
//!
//! ```text
//! PipelineConfig ──build_sources()──▶ EventSource ──pipeline::run()──▶ docs/events.{json,ics}
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod pipeline;

pub use cli::Cli;
pub use config::{ConfigError, PipelineConfig};
pub use error::{CliError, CliResult};
pub use pipeline::{RunReport, SourceOutcome, SourceReport, build_sources, collect, process, run};
