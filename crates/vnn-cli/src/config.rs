//! Pipeline configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/vnn-events/config.toml` by default. Every key is optional:
//!
//! ```toml
//! allowed_states = ["MT", "WY"]
//! lookahead_days = 60
//! output_dir = "docs"
//!
//! [[sources]]
//! kind = "ics"
//! name = "veterans_upward_bound"
//! urls_env = "VUB_ICS_URL"
//! default_state = "MT"
//! ```
//!
//! Leaving out `sources` keeps the stock source list.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use vnn_core::{DEFAULT_SIMILARITY_THRESHOLD, DEFAULT_TIMEZONE, StateCode};
use vnn_sources::{BuildContext, HttpConfig, SearchWindow, SourceConfig, default_sources};

/// Where the published feeds are served from.
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://jackbrandt1995.github.io/vnn-events";

/// Errors loading or checking a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Regions an event must be in to be published.
    pub allowed_states: Vec<StateCode>,

    /// Length of the publishing window, in days from now.
    pub lookahead_days: u32,

    /// Zone for naive timestamps and for API search dates.
    pub reference_timezone: Tz,

    /// Directory receiving `events.json` and `events.ics`.
    pub output_dir: PathBuf,

    pub public_base_url: String,

    /// Deadline for each source's whole fetch.
    pub fetch_timeout_secs: u64,

    /// Title similarity (0-100) at which two records are one event.
    pub dedupe_threshold: f64,

    pub user_agent: String,

    pub sources: Vec<SourceConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            allowed_states: vec![StateCode::Mt, StateCode::Wy],
            lookahead_days: SearchWindow::DEFAULT_LOOKAHEAD_DAYS,
            reference_timezone: DEFAULT_TIMEZONE,
            output_dir: PathBuf::from("docs"),
            public_base_url: DEFAULT_PUBLIC_BASE_URL.to_string(),
            fetch_timeout_secs: 45,
            dedupe_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            user_agent: HttpConfig::default().user_agent,
            sources: default_sources(),
        }
    }
}

impl PipelineConfig {
    /// Loads configuration from the default path, or defaults when there is
    /// no file.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vnn-events")
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// The settings sources are built with.
    pub fn build_context(&self) -> BuildContext {
        BuildContext {
            http: HttpConfig::default().with_user_agent(&self.user_agent),
            regions: self.allowed_states.clone(),
            window: SearchWindow::new(self.lookahead_days, self.reference_timezone),
        }
    }

    /// Checks the settings and every source configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allowed_states.is_empty() {
            return Err(ConfigError::Invalid(
                "allowed_states must not be empty".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&self.dedupe_threshold) {
            return Err(ConfigError::Invalid(format!(
                "dedupe_threshold must be between 0 and 100, got {}",
                self.dedupe_threshold
            )));
        }
        Url::parse(&self.public_base_url).map_err(|e| {
            ConfigError::Invalid(format!(
                "public_base_url {:?} is not a URL: {}",
                self.public_base_url, e
            ))
        })?;

        let mut names = HashSet::new();
        for source in &self.sources {
            if !names.insert(source.name()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name {:?}",
                    source.name()
                )));
            }
            source
                .validate()
                .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        }
        Ok(())
    }
}
