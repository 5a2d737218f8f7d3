//! Folder size computation.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::{EngineConfig, TaskOutcome, TaskOutput, TaskReporter};

use crate::walker::Walker;

/// Sum of the sizes of all files below `dir`, as reachable right now.
///
/// Symlinks are not followed and unreadable entries count as zero.
pub fn folder_size(dir: &Path) -> u64 {
    Walker::new(dir)
        .walk()
        .filter(|entry| entry.is_file())
        .map(|entry| entry.size)
        .sum()
}

/// Size of a file, or the recursive size of a directory.
pub fn path_size(path: &Path) -> u64 {
    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => folder_size(path),
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => 0,
    }
}

/// Folder-size memo owned by a single task.
///
/// Results are never shared between tasks and may go stale if the tree is
/// modified while the task runs.
#[derive(Debug, Default)]
pub struct FolderSizes {
    cache: HashMap<PathBuf, u64>,
    walker_template: Option<Walker>,
}

impl FolderSizes {
    /// Create an empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `template`'s traversal settings (hidden files, threads) for
    /// every directory measured.
    pub fn with_walker(template: Walker) -> Self {
        Self {
            cache: HashMap::new(),
            walker_template: Some(template),
        }
    }

    /// Size of `path`, computing and remembering directory sizes.
    pub fn size_of(&mut self, path: &Path) -> u64 {
        let metadata = match fs::symlink_metadata(path) {
            Ok(metadata) => metadata,
            Err(_) => return 0,
        };
        if !metadata.is_dir() {
            return if metadata.is_file() { metadata.len() } else { 0 };
        }

        if let Some(size) = self.cache.get(path) {
            return *size;
        }

        let size = self.measure_dir(path);
        self.cache.insert(path.to_path_buf(), size);
        size
    }

    /// Number of memoized directories.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if nothing has been memoized yet.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Forget all memoized sizes.
    pub fn clear(&mut self) {
        self.cache.clear();
    }

    fn measure_dir(&self, dir: &Path) -> u64 {
        let walker = match &self.walker_template {
            Some(template) => rebase(template, dir),
            None => Walker::new(dir),
        };
        walker
            .walk()
            .filter(|entry| entry.is_file())
            .map(|entry| entry.size)
            .sum()
    }
}

/// Measure every path in `paths`, in order, as one task.
///
/// Missing paths measure as zero. Cancellation is checked between paths and
/// returns the sizes measured so far.
pub fn measure(
    paths: &[PathBuf],
    config: &EngineConfig,
    reporter: &mut TaskReporter,
) -> TaskOutcome {
    let template = Walker::with_config(PathBuf::new(), config);
    let mut sizes = FolderSizes::with_walker(template);
    let mut measured = Vec::with_capacity(paths.len());

    for (i, path) in paths.iter().enumerate() {
        if reporter.is_cancelled() {
            return TaskOutcome::Cancelled(TaskOutput::Sizes(measured));
        }
        let size = sizes.size_of(path);
        tracing::debug!(path = %path.display(), size, "measured");
        measured.push((path.clone(), size));
        reporter.progress_fraction(i + 1, paths.len());
    }

    TaskOutcome::Completed(TaskOutput::Sizes(measured))
}

fn rebase(template: &Walker, root: &Path) -> Walker {
    let mut walker = template.clone();
    walker.set_root(root);
    walker
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folder_size_sums_descendants() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 100]).unwrap();
        fs::write(dir.path().join("b"), vec![0u8; 250]).unwrap();
        fs::write(dir.path().join("nested/c"), vec![0u8; 1024]).unwrap();

        assert_eq!(folder_size(dir.path()), 1374);
        assert_eq!(path_size(&dir.path().join("b")), 250);
    }

    #[test]
    fn test_memo_reuses_result() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), vec![0u8; 10]).unwrap();

        let mut sizes = FolderSizes::new();
        assert_eq!(sizes.size_of(dir.path()), 10);
        assert_eq!(sizes.len(), 1);

        // Memoized for the lifetime of the task, even if the tree changes.
        fs::write(dir.path().join("b"), vec![0u8; 5]).unwrap();
        assert_eq!(sizes.size_of(dir.path()), 10);

        sizes.clear();
        assert_eq!(sizes.size_of(dir.path()), 15);
    }

    #[test]
    fn test_with_walker_honors_hidden_setting() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden"), vec![0u8; 8]).unwrap();
        fs::write(dir.path().join("shown"), vec![0u8; 2]).unwrap();

        let mut sizes = FolderSizes::with_walker(Walker::new("").include_hidden(false));
        assert_eq!(sizes.size_of(dir.path()), 2);
    }

    #[test]
    fn test_missing_path_is_zero() {
        let dir = tempfile::tempdir().unwrap();
        let mut sizes = FolderSizes::new();
        assert_eq!(sizes.size_of(&dir.path().join("missing")), 0);
        assert!(sizes.is_empty());
    }
}
