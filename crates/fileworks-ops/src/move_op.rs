//! Move by rename, falling back to copy and delete across filesystems.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use fileworks_core::{OperationError, TaskOutcome, TaskReporter};
use fileworks_scan::path_size;

use crate::batch::{ItemOutcome, item_error, run_batch};
use crate::copy::{CopyOptions, copy_tree, prepare_target};

/// Move each source into the `destination` folder under its own name.
pub fn move_to(
    sources: &[PathBuf],
    destination: &Path,
    options: CopyOptions,
    reporter: &mut TaskReporter,
) -> TaskOutcome {
    tracing::debug!(count = sources.len(), destination = %destination.display(), "moving");
    run_batch(sources, reporter, |source, _| {
        move_one(source, destination, options)
    })
}

fn move_one(source: &Path, destination: &Path, options: CopyOptions) -> ItemOutcome {
    let target = match prepare_target(source, destination, options.conflict_policy, "move") {
        Ok(Some(target)) => target,
        Ok(None) => return ItemOutcome::Skipped,
        Err(err) => return ItemOutcome::Failed(err),
    };
    let bytes = path_size(source);

    match fs::rename(source, &target) {
        Ok(()) => ItemOutcome::Done(bytes),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                source = %source.display(),
                target = %target.display(),
                "rename crosses filesystems, copying instead"
            );
            match move_by_copy(source, &target, options.preserve_metadata) {
                Ok(bytes) => ItemOutcome::Done(bytes),
                Err(err) => ItemOutcome::Failed(err),
            }
        }
        Err(err) => ItemOutcome::Failed(item_error(source, "Failed to move")(err)),
    }
}

/// Copy `source` to `target`, then remove `source`.
///
/// If the copy fails the source is untouched. If only the removal fails the
/// copy is kept and the item is reported as failed.
fn move_by_copy(source: &Path, target: &Path, preserve: bool) -> Result<u64, OperationError> {
    let bytes = copy_tree(source, target, preserve)?;

    let metadata =
        fs::symlink_metadata(source).map_err(item_error(source, "Failed to remove source"))?;
    let removed = if metadata.is_dir() {
        fs::remove_dir_all(source)
    } else {
        fs::remove_file(source)
    };
    removed.map_err(item_error(source, "Copied but failed to remove source"))?;

    Ok(bytes)
}
