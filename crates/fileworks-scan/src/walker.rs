//! Lazy recursive directory traversal built on jwalk.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jwalk::{DirEntryIter, Parallelism, WalkDir};

use fileworks_core::{EngineConfig, EntryKind, PathEntry};

use crate::exclude::ExcludeSet;

/// Configurable walker over one root directory.
///
/// The walk yields every descendant of the root (not the root itself) in
/// depth-first order with siblings sorted by name. Entries matching the
/// exclude set are dropped together with their whole subtree. Unreadable
/// directories, vanished files and broken metadata are skipped silently so a
/// single bad subtree never aborts the walk.
#[derive(Debug, Clone)]
pub struct Walker {
    root: PathBuf,
    excludes: Arc<ExcludeSet>,
    recursive: bool,
    include_hidden: bool,
    follow_links: bool,
    threads: usize,
}

impl Walker {
    /// Create a recursive walker with no exclusions.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excludes: Arc::new(ExcludeSet::empty()),
            recursive: true,
            include_hidden: true,
            follow_links: false,
            threads: 1,
        }
    }

    /// Create a walker using the engine's traversal settings.
    pub fn with_config(root: impl Into<PathBuf>, config: &EngineConfig) -> Self {
        Self::new(root)
            .include_hidden(config.include_hidden)
            .follow_links(config.follow_symlinks)
            .threads(config.walk_threads)
    }

    /// Set the exclude set.
    pub fn excludes(mut self, excludes: ExcludeSet) -> Self {
        self.excludes = Arc::new(excludes);
        self
    }

    /// Walk the whole tree (`true`) or only the root's direct children.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Include dot-files.
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.include_hidden = include;
        self
    }

    /// Follow symbolic links to directories.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Reader threads (1 = serial, 0 = shared rayon pool).
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// The walk root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub(crate) fn set_root(&mut self, root: &Path) {
        self.root = root.to_path_buf();
    }

    /// Start a single forward pass over the tree.
    pub fn walk(&self) -> Walk {
        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            1 => Parallelism::Serial,
            n => Parallelism::RayonNewPool(n),
        };

        let excludes = Arc::clone(&self.excludes);
        let inner = WalkDir::new(&self.root)
            .parallelism(parallelism)
            .skip_hidden(!self.include_hidden)
            .follow_links(self.follow_links)
            .sort(true)
            .min_depth(1)
            .max_depth(if self.recursive { usize::MAX } else { 1 })
            .process_read_dir(move |_depth, _path, _state, children| {
                children.retain(|child| match child {
                    Ok(entry) => !excludes.is_excluded(&entry.path()),
                    Err(_) => true,
                });
            })
            .into_iter();

        Walk { inner }
    }
}

/// Walk `root` recursively, skipping entries that match `excludes`.
pub fn walk(root: impl Into<PathBuf>, excludes: ExcludeSet) -> Walk {
    Walker::new(root).excludes(excludes).walk()
}

/// Iterator returned by [`Walker::walk`].
pub struct Walk {
    inner: DirEntryIter<((), ())>,
}

impl Iterator for Walk {
    type Item = PathEntry;

    fn next(&mut self) -> Option<PathEntry> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(
                        path = ?err.path(),
                        "skipping unreadable entry: {err}"
                    );
                    continue;
                }
            };

            let path = entry.path();
            let kind = EntryKind::from_file_type(entry.file_type());
            let size = if kind == EntryKind::File {
                match entry.metadata() {
                    Ok(metadata) => metadata.len(),
                    Err(err) => {
                        tracing::debug!(path = %path.display(), "skipping entry without metadata: {err}");
                        continue;
                    }
                }
            } else {
                0
            };

            return Some(PathEntry::new(path, kind, size, entry.depth()));
        }
    }
}
