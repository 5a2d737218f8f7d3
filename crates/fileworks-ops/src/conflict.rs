//! Where a copied or moved item lands when its name is taken.

use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::{ConflictPolicy, OperationError};

/// Decision for one target path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Write to this free path.
    Write(PathBuf),
    /// Remove what is at this path, then write to it.
    Replace(PathBuf),
    /// Leave the item alone.
    Skip,
}

/// Decide where an item aimed at `target` goes under `policy`.
pub fn place(target: PathBuf, policy: ConflictPolicy) -> Result<Placement, OperationError> {
    if fs::symlink_metadata(&target).is_err() {
        return Ok(Placement::Write(target));
    }

    match policy {
        ConflictPolicy::Fail => {
            let message = format!("'{}' already exists", file_name(&target));
            Err(OperationError::new(target, message))
        }
        ConflictPolicy::Overwrite => Ok(Placement::Replace(target)),
        ConflictPolicy::AutoRename => Ok(Placement::Write(auto_rename_path(&target))),
        ConflictPolicy::Skip => {
            tracing::debug!(target = %target.display(), "target exists, skipping");
            Ok(Placement::Skip)
        }
    }
}

/// First free sibling of `path` named "stem (n).ext".
///
/// Falls back to a timestamp suffix if the first 999 candidates are taken.
pub fn auto_rename_path(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new(""));
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let with_suffix = |suffix: String| match &extension {
        Some(ext) => parent.join(format!("{stem}{suffix}.{ext}")),
        None => parent.join(format!("{stem}{suffix}")),
    };

    (1..1000)
        .map(|i| with_suffix(format!(" ({i})")))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .unwrap_or_else(|| {
            let stamp = std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0);
            with_suffix(format!("_{stamp}"))
        })
}

/// Remove whatever is at `path` so it can be written again.
pub(crate) fn clear_target(path: &Path) -> Result<(), OperationError> {
    let metadata = fs::symlink_metadata(path)
        .map_err(crate::batch::item_error(path, "Failed to replace"))?;
    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    result.map_err(crate::batch::item_error(path, "Failed to replace"))
}

/// Check if `destination` is `source` or lies below it.
///
/// Both are resolved first so "." and symlinked parents compare correctly.
pub(crate) fn is_inside(destination: &Path, source: &Path) -> bool {
    match (fs::canonicalize(destination), fs::canonicalize(source)) {
        (Ok(destination), Ok(source)) => destination.starts_with(source),
        _ => destination.starts_with(source),
    }
}

/// Check if two existing paths name the same filesystem entry.
///
/// Symlinks are not followed. On unix the device and inode are compared, so
/// two spellings of one name on a case-insensitive volume match while two
/// distinct files never do.
pub(crate) fn same_entry(a: &Path, b: &Path) -> bool {
    let (Ok(first), Ok(second)) = (fs::symlink_metadata(a), fs::symlink_metadata(b)) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        first.dev() == second.dev() && first.ino() == second.ino()
    }

    #[cfg(not(unix))]
    {
        let _ = (first, second);
        match (fs::canonicalize(a), fs::canonicalize(b)) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_rename_path() {
        let dir = tempfile::tempdir().unwrap();
        let taken = dir.path().join("test.txt");
        fs::write(&taken, b"x").unwrap();
        fs::write(dir.path().join("test (1).txt"), b"x").unwrap();

        assert_eq!(auto_rename_path(&taken), dir.path().join("test (2).txt"));
    }

    #[test]
    fn test_auto_rename_no_extension() {
        let path = PathBuf::from("/nonexistent-fileworks/testfile");
        assert_eq!(
            auto_rename_path(&path),
            PathBuf::from("/nonexistent-fileworks/testfile (1)")
        );
    }

    #[test]
    fn test_place_by_policy() {
        let dir = tempfile::tempdir().unwrap();
        let free = dir.path().join("free.txt");
        let taken = dir.path().join("taken.txt");
        fs::write(&taken, b"x").unwrap();

        assert_eq!(
            place(free.clone(), ConflictPolicy::Fail).unwrap(),
            Placement::Write(free)
        );

        let err = place(taken.clone(), ConflictPolicy::Fail).unwrap_err();
        assert_eq!(err.message, "'taken.txt' already exists");

        assert_eq!(
            place(taken.clone(), ConflictPolicy::Overwrite).unwrap(),
            Placement::Replace(taken.clone())
        );
        assert_eq!(
            place(taken.clone(), ConflictPolicy::AutoRename).unwrap(),
            Placement::Write(dir.path().join("taken (1).txt"))
        );
        assert_eq!(place(taken, ConflictPolicy::Skip).unwrap(), Placement::Skip);
    }

    #[test]
    fn test_is_inside() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("a/b");
        fs::create_dir_all(&inner).unwrap();

        assert!(is_inside(&inner, &dir.path().join("a")));
        assert!(is_inside(&dir.path().join("a"), &dir.path().join("a")));
        assert!(!is_inside(dir.path(), &dir.path().join("a")));
    }

    #[test]
    fn test_same_entry() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"a").unwrap();
        fs::write(&b, b"a").unwrap();

        assert!(same_entry(&a, &a));
        assert!(same_entry(&a, &dir.path().join(".").join("a.txt")));
        assert!(!same_entry(&a, &b));
        assert!(!same_entry(&a, &dir.path().join("missing.txt")));
    }
}
