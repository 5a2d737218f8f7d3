use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::TaskError;

use crate::rename::validate_filename;

/// Create the folder `name` inside `parent` and return its path.
pub fn create_folder(parent: &Path, name: &str) -> Result<PathBuf, TaskError> {
    validate_filename(name)?;

    let metadata = fs::metadata(parent).map_err(|e| TaskError::io(parent, e))?;
    if !metadata.is_dir() {
        return Err(TaskError::NotADirectory {
            path: parent.to_path_buf(),
        });
    }

    let path = parent.join(name);
    if fs::symlink_metadata(&path).is_ok() {
        return Err(TaskError::AlreadyExists { path });
    }

    fs::create_dir(&path).map_err(|e| TaskError::io(&path, e))?;
    tracing::info!(path = %path.display(), "created folder");
    Ok(path)
}
