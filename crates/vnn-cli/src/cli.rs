//! Command-line interface definition.

use std::path::PathBuf;

use clap::builder::FalseyValueParser;
use clap::{Parser, Subcommand};

use vnn_core::{StateCode, TracingConfig, TracingOutputFormat};

use crate::config::PipelineConfig;

/// vnn-events - Veteran events for Montana and Wyoming, as JSON and iCalendar
#[derive(Debug, Parser)]
#[command(name = "vnn-events")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "VNN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', env = "VNN_DEBUG", value_parser = FalseyValueParser::new())]
    pub debug: bool,

    /// Log format: pretty, compact or json
    #[arg(long, env = "VNN_LOG_FORMAT")]
    pub log_format: Option<TracingOutputFormat>,

    // --- Overrides ---
    /// Directory receiving events.json and events.ics
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Base URL the feeds are served from
    #[arg(long, env = "PUBLIC_BASE_URL")]
    pub public_base_url: Option<String>,

    /// Publishing window in days
    #[arg(long, env = "LOOKAHEAD_DAYS")]
    pub lookahead_days: Option<u32>,

    /// Allowed state codes, comma-separated
    #[arg(long, env = "REGION_STATES", value_delimiter = ',')]
    pub states: Option<Vec<StateCode>>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Logging setup for this invocation.
    pub fn tracing_config(&self) -> TracingConfig {
        let config = if self.debug {
            TracingConfig::debug()
        } else {
            TracingConfig::default()
        };
        match self.log_format {
            Some(format) => config.with_format(format),
            None => config,
        }
    }

    /// Applies command-line and environment overrides on top of `config`.
    pub fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(ref dir) = self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(ref url) = self.public_base_url {
            config.public_base_url = url.clone();
        }
        if let Some(days) = self.lookahead_days {
            config.lookahead_days = days;
        }
        if let Some(ref states) = self.states {
            config.allowed_states = states.clone();
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Collect, process and publish events (the default)
    Run,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump current configuration
    Dump,

    /// Validate configuration
    Validate,

    /// Show configuration file path
    Path,
}
