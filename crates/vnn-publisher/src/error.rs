//! Publishing errors.

use std::path::PathBuf;

use thiserror::Error;

pub type PublishResult<T> = Result<T, PublishError>;

/// A failure while writing a feed. Always terminal for the run.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The output directory could not be created.
    #[error("failed to create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The feed could not be serialized.
    #[error("failed to serialize feed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The feed file could not be written or moved into place.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
