use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{PublishError, PublishResult};

/// Creates `dir` and its parents if needed.
pub fn ensure_output_dir(dir: &Path) -> PublishResult<()> {
    fs::create_dir_all(dir).map_err(|source| PublishError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Writes `contents` to `dir/file_name` through a temporary file and rename.
pub(crate) fn write_atomically(dir: &Path, file_name: &str, contents: &str) -> PublishResult<PathBuf> {
    ensure_output_dir(dir)?;

    let path = dir.join(file_name);
    let temp_path = dir.join(format!(".{}.tmp", file_name));

    fs::write(&temp_path, contents).map_err(|source| PublishError::Write {
        path: temp_path.clone(),
        source,
    })?;
    if let Err(source) = fs::rename(&temp_path, &path) {
        let _ = fs::remove_file(&temp_path);
        return Err(PublishError::Write { path, source });
    }

    debug!(path = %path.display(), bytes = contents.len(), "Wrote feed file");
    Ok(path)
}
