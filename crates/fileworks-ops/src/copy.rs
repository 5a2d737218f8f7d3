//! Recursive copy with conflict handling.

use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::{ConflictPolicy, EngineConfig, OperationError, TaskOutcome, TaskReporter};

use crate::batch::{ItemOutcome, item_error, run_batch};
use crate::conflict::{Placement, clear_target, is_inside, place, same_entry};

/// Options for copy and move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyOptions {
    /// What to do when the target name is taken.
    pub conflict_policy: ConflictPolicy,
    /// Carry permissions and timestamps over to the copy.
    pub preserve_metadata: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for CopyOptions {
    fn from(config: &EngineConfig) -> Self {
        Self {
            conflict_policy: config.conflict_policy,
            preserve_metadata: config.preserve_metadata,
        }
    }
}

/// Copy each source into the `destination` folder under its own name.
pub fn copy(
    sources: &[PathBuf],
    destination: &Path,
    options: CopyOptions,
    reporter: &mut TaskReporter,
) -> TaskOutcome {
    tracing::debug!(count = sources.len(), destination = %destination.display(), "copying");
    run_batch(sources, reporter, |source, _| {
        copy_one(source, destination, options)
    })
}

fn copy_one(source: &Path, destination: &Path, options: CopyOptions) -> ItemOutcome {
    let target = match prepare_target(source, destination, options.conflict_policy, "copy") {
        Ok(Some(target)) => target,
        Ok(None) => return ItemOutcome::Skipped,
        Err(err) => return ItemOutcome::Failed(err),
    };

    match copy_tree(source, &target, options.preserve_metadata) {
        Ok(bytes) => ItemOutcome::Done(bytes),
        Err(err) => ItemOutcome::Failed(err),
    }
}

/// Resolve where `source` goes inside `destination`.
///
/// Clears the target when the policy says to overwrite. `Ok(None)` means
/// skip: either the policy says so, or the item would land on itself or
/// inside itself.
pub(crate) fn prepare_target(
    source: &Path,
    destination: &Path,
    policy: ConflictPolicy,
    verb: &str,
) -> Result<Option<PathBuf>, OperationError> {
    let Some(name) = source.file_name() else {
        return Err(OperationError::new(source, "Path has no file name"));
    };
    let metadata = fs::symlink_metadata(source)
        .map_err(item_error(source, &format!("Failed to {verb}")))?;

    let target = destination.join(name);
    if (metadata.is_dir() && is_inside(destination, source)) || same_entry(source, &target) {
        tracing::warn!(
            source = %source.display(),
            destination = %destination.display(),
            "skipped {verb} onto itself"
        );
        return Ok(None);
    }

    match place(target, policy)? {
        Placement::Write(target) => Ok(Some(target)),
        Placement::Skip => Ok(None),
        Placement::Replace(target) => {
            clear_target(&target)?;
            Ok(Some(target))
        }
    }
}

/// Copy a file, symlink or folder tree to `target`, returning the bytes
/// written. Symlinks are recreated, not followed.
pub(crate) fn copy_tree(
    source: &Path,
    target: &Path,
    preserve: bool,
) -> Result<u64, OperationError> {
    let metadata = fs::symlink_metadata(source).map_err(item_error(source, "Failed to copy"))?;
    let file_type = metadata.file_type();

    if file_type.is_symlink() {
        copy_symlink(source, target)?;
        return Ok(0);
    }

    if file_type.is_dir() {
        fs::create_dir(target).map_err(item_error(target, "Failed to create folder"))?;
        let mut bytes = 0;
        for entry in fs::read_dir(source).map_err(item_error(source, "Failed to read folder"))? {
            let entry = entry.map_err(item_error(source, "Failed to read folder"))?;
            bytes += copy_tree(&entry.path(), &target.join(entry.file_name()), preserve)?;
        }
        if preserve {
            copy_metadata(target, &metadata);
        }
        return Ok(bytes);
    }

    let bytes = fs::copy(source, target).map_err(item_error(source, "Failed to copy"))?;
    if preserve {
        copy_metadata(target, &metadata);
    }
    Ok(bytes)
}

#[cfg(unix)]
fn copy_symlink(source: &Path, target: &Path) -> Result<(), OperationError> {
    let link = fs::read_link(source).map_err(item_error(source, "Failed to read link"))?;
    std::os::unix::fs::symlink(link, target).map_err(item_error(target, "Failed to create link"))
}

#[cfg(not(unix))]
fn copy_symlink(source: &Path, target: &Path) -> Result<(), OperationError> {
    fs::copy(source, target)
        .map(|_| ())
        .map_err(item_error(source, "Failed to copy"))
}

/// Best effort: timestamps first, then permissions, since the permissions
/// may make the target unopenable.
fn copy_metadata(target: &Path, metadata: &fs::Metadata) {
    let mut times = fs::FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Err(err) = fs::File::open(target).and_then(|file| file.set_times(times)) {
        tracing::debug!(path = %target.display(), "could not copy timestamps: {err}");
    }
    if let Err(err) = fs::set_permissions(target, metadata.permissions()) {
        tracing::debug!(path = %target.display(), "could not copy permissions: {err}");
    }
}
