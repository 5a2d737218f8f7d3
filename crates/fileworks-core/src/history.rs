//! Recent-path and favorites bookkeeping.
//!
//! The engine does not own these lists; it only emits [`HistoryEvent`]s to
//! an injected [`HistorySink`]. [`RecentList`] and [`Favorites`] are the
//! default in-memory stores a shell can persist with serde.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Upper bound on the recent list after pruning.
pub const MAX_RECENT: usize = 100;

/// Number of recent entries shown in a quick list.
pub const RECENT_BATCH: usize = 20;

/// Events the engine may emit about user activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HistoryEvent {
    /// A file was opened from a listing or search result.
    FileOpened(PathBuf),
    /// A path was added to favorites.
    PathFavorited(PathBuf),
}

/// Receiver for history events.
pub trait HistorySink: Send + Sync {
    /// Record one event.
    fn record(&self, event: HistoryEvent);
}

/// Most-recent-first list of opened paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecentList {
    paths: Vec<PathBuf>,
}

impl RecentList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `path` to the front, drop entries that no longer exist and trim
    /// to [`MAX_RECENT`].
    pub fn push(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.paths.retain(|p| p != &path);
        self.paths.insert(0, path);
        self.paths.retain(|p| p.exists());
        self.paths.truncate(MAX_RECENT);
    }

    /// Remove a path from the list.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    /// Existing entries, newest first, optionally limited.
    pub fn recent(&self, limit: Option<usize>) -> Vec<PathBuf> {
        let existing = self.paths.iter().filter(|p| p.exists()).cloned();
        match limit {
            Some(n) => existing.take(n).collect(),
            None => existing.collect(),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Unbounded, insertion-ordered set of favorite paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites {
    paths: Vec<PathBuf>,
}

impl Favorites {
    /// Create an empty favorites list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a path. Returns false if it was already present.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.paths.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Remove a path. Returns false if it was not present.
    pub fn remove(&mut self, path: &Path) -> bool {
        let before = self.paths.len();
        self.paths.retain(|p| p != path);
        self.paths.len() != before
    }

    /// Check if a path is a favorite.
    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// All favorites in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.paths.iter()
    }
}
