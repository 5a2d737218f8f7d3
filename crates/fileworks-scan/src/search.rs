//! Name search over a directory tree, with a fuzzy fallback.
//!
//! A search runs as a small state machine:
//!
//! ```text
//! Idle -> Counting -> Searching -> Found
//!                              \-> FoundEmpty -> FuzzyFallback
//! ```
//!
//! Counting walks the scope once to get the progress denominator. Searching
//! walks it again and keeps every entry whose lower-cased name contains the
//! lower-cased query. If nothing matched, a third walk collects names similar
//! to the query. Results keep walk order.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use fileworks_core::{
    EngineConfig, MatchMode, SearchMatches, TaskError, TaskOutcome, TaskOutput, TaskReporter,
};

use crate::exclude::ExcludeSet;
use crate::similarity::name_similarity;
use crate::walker::Walker;

/// Parameters of one search task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Directory to search in.
    pub root: PathBuf,
    /// Text to look for in entry names.
    pub query: String,
    /// Search subdirectories too.
    pub recursive: bool,
    /// Globs for entries (and subtrees) to leave out.
    pub exclude_patterns: Vec<String>,
}

impl SearchRequest {
    /// Create a recursive search for `query` under `root`.
    pub fn new(root: impl Into<PathBuf>, query: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            query: query.into(),
            recursive: true,
            exclude_patterns: Vec::new(),
        }
    }

    /// Search only the root's direct children when `false`.
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Set exclude patterns.
    pub fn exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    /// Check that the search can start.
    pub fn validate(&self) -> Result<(), TaskError> {
        if self.query.trim().is_empty() {
            return Err(TaskError::invalid_input("search query is empty"));
        }
        let metadata = std::fs::metadata(&self.root).map_err(|e| TaskError::io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(TaskError::NotADirectory {
                path: self.root.clone(),
            });
        }
        Ok(())
    }
}

/// Phase of a running search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchPhase {
    Idle,
    Counting,
    Searching,
    Found,
    FoundEmpty,
    FuzzyFallback,
}

/// Runs search requests with one engine configuration.
#[derive(Debug, Clone, Default)]
pub struct SearchEngine {
    config: EngineConfig,
}

impl SearchEngine {
    /// Create a search engine.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Run `request` to completion or cancellation, reporting through
    /// `reporter`.
    pub fn run(&self, request: &SearchRequest, reporter: &mut TaskReporter) -> TaskOutcome {
        if let Err(err) = request.validate() {
            return TaskOutcome::Failed(err);
        }
        let excludes = match ExcludeSet::new(&request.exclude_patterns, self.config.exclude_match)
        {
            Ok(excludes) => excludes,
            Err(err) => return TaskOutcome::Failed(err),
        };
        let walker = Walker::with_config(&request.root, &self.config)
            .recursive(request.recursive)
            .excludes(excludes);

        let query = request.query.trim().to_lowercase();
        let mut run = SearchRun {
            query: &request.query,
            phase: SearchPhase::Idle,
        };

        run.enter(SearchPhase::Counting);
        let mut total = 0usize;
        for _ in walker.walk() {
            if reporter.is_cancelled() {
                return run.cancelled(Vec::new());
            }
            total += 1;
        }
        let total = total.max(1);

        run.enter(SearchPhase::Searching);
        let mut matches = Vec::new();
        for (i, entry) in walker.walk().enumerate() {
            if reporter.is_cancelled() {
                return run.cancelled(matches);
            }
            if entry.name().to_lowercase().contains(&query) {
                matches.push(entry.path);
            }
            reporter.progress_fraction(i + 1, total);
        }

        if !matches.is_empty() {
            run.enter(SearchPhase::Found);
            return run.completed(MatchMode::Exact, matches);
        }

        run.enter(SearchPhase::FoundEmpty);
        run.enter(SearchPhase::FuzzyFallback);
        let base_query = Path::new(&query)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| query.clone());

        let mut similar = Vec::new();
        for entry in walker.walk() {
            if reporter.is_cancelled() {
                return run.cancelled(similar);
            }
            let name = entry.name().to_lowercase();
            if name_similarity(&base_query, &name) >= self.config.fuzzy_threshold {
                similar.push(entry.path);
            }
        }

        if similar.is_empty() {
            run.completed(MatchMode::NoMatches, similar)
        } else {
            run.completed(MatchMode::Fuzzy, similar)
        }
    }
}

struct SearchRun<'a> {
    query: &'a str,
    phase: SearchPhase,
}

impl SearchRun<'_> {
    fn enter(&mut self, phase: SearchPhase) {
        tracing::debug!(query = self.query, from = ?self.phase, to = ?phase, "search phase");
        self.phase = phase;
    }

    fn completed(&self, mode: MatchMode, paths: Vec<PathBuf>) -> TaskOutcome {
        TaskOutcome::Completed(TaskOutput::Search(SearchMatches {
            query: self.query.to_string(),
            mode,
            paths,
        }))
    }

    fn cancelled(&self, paths: Vec<PathBuf>) -> TaskOutcome {
        let mode = match (self.phase, paths.is_empty()) {
            (_, true) => MatchMode::NoMatches,
            (SearchPhase::FuzzyFallback, false) => MatchMode::Fuzzy,
            (_, false) => MatchMode::Exact,
        };
        TaskOutcome::Cancelled(TaskOutput::Search(SearchMatches {
            query: self.query.to_string(),
            mode,
            paths,
        }))
    }
}
