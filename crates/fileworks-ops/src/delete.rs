//! Batch deletion.

use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::{OperationError, TaskOutcome, TaskReporter};
use fileworks_scan::path_size;

use crate::batch::{ItemOutcome, item_error, run_batch};

/// Delete `paths` one after another, recursing into folders.
///
/// With `use_trash` items go to the platform trash instead. A cancelled
/// batch stops before the next item; a folder that is being removed is
/// removed completely.
pub fn delete(paths: &[PathBuf], use_trash: bool, reporter: &mut TaskReporter) -> TaskOutcome {
    tracing::debug!(count = paths.len(), use_trash, "deleting");
    run_batch(paths, reporter, |path, _| delete_one(path, use_trash))
}

fn delete_one(path: &Path, use_trash: bool) -> ItemOutcome {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(err) => return ItemOutcome::Failed(item_error(path, "Failed to delete")(err)),
    };
    let freed = path_size(path);

    if use_trash {
        return match trash::delete(path) {
            Ok(()) => ItemOutcome::Done(freed),
            Err(err) => ItemOutcome::Failed(OperationError::new(
                path,
                format!("Failed to move to trash: {err}"),
            )),
        };
    }

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Ok(()) => ItemOutcome::Done(freed),
        Err(err) => ItemOutcome::Failed(item_error(path, "Failed to delete")(err)),
    }
}
