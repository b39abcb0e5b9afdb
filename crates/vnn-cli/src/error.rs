//! CLI error types and exit codes.

use thiserror::Error;

use vnn_core::TracingError;
use vnn_publisher::PublishError;

use crate::config::ConfigError;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// A failure that ends the run.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Tracing(#[from] TracingError),

    #[error("output directory error: {0}")]
    OutputDir(#[source] PublishError),

    #[error("JSON publish failed: {0}")]
    PublishJson(#[source] PublishError),

    #[error("iCalendar publish failed: {0}")]
    PublishIcs(#[source] PublishError),
}

impl CliError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) | Self::Tracing(_) => 1,
            Self::OutputDir(_) => 2,
            Self::PublishJson(_) => 3,
            Self::PublishIcs(_) => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn io_error() -> std::io::Error {
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied")
    }

    #[test]
    fn exit_codes() {
        let config = CliError::Config(ConfigError::Invalid("x".to_string()));
        let dir = CliError::OutputDir(PublishError::CreateDir {
            path: PathBuf::from("docs"),
            source: io_error(),
        });
        let json = CliError::PublishJson(PublishError::Write {
            path: PathBuf::from("docs/events.json"),
            source: io_error(),
        });
        let ics = CliError::PublishIcs(PublishError::Write {
            path: PathBuf::from("docs/events.ics"),
            source: io_error(),
        });

        let codes: Vec<_> = [config, dir, json, ics].iter().map(CliError::exit_code).collect();
        assert_eq!(codes, vec![1, 2, 3, 4]);
    }

    #[test]
    fn logging_setup_failure_is_a_configuration_error() {
        let err = CliError::from(TracingError::UnknownFormat("xml".to_string()));
        assert!(matches!(err, CliError::Tracing(_)));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn display() {
        let err = CliError::PublishIcs(PublishError::Write {
            path: PathBuf::from("docs/events.ics"),
            source: io_error(),
        });
        assert_eq!(
            err.to_string(),
            "iCalendar publish failed: failed to write docs/events.ics: denied"
        );
    }
}
