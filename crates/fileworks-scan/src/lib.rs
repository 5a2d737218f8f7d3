//! Directory walking, folder sizes and search for fileworks.
//!
//! # Overview
//!
//! - [`Walker`] is a lazy, single-pass, depth-first traversal with glob
//!   exclusion and silent skipping of unreadable entries.
//! - [`FolderSizes`] memoizes directory sizes for the lifetime of one task.
//! - [`SearchEngine`] runs the two-pass substring search with a fuzzy
//!   fallback, reporting through a [`fileworks_core::TaskReporter`].
//!
//! # Example
//!
//! ```rust,no_run
//! use fileworks_scan::{ExcludeSet, Walker};
//! use fileworks_core::ExcludeMatch;
//!
//! let excludes = ExcludeSet::new(&["*.tmp"], ExcludeMatch::Name).unwrap();
//! for entry in Walker::new("/path/to/dir").excludes(excludes).walk() {
//!     println!("{} ({} bytes)", entry.path.display(), entry.size);
//! }
//! ```

mod exclude;
mod properties;
mod search;
mod similarity;
mod size;
mod walker;

pub use exclude::ExcludeSet;
pub use properties::{PathProperties, properties};
pub use search::{SearchEngine, SearchPhase, SearchRequest};
pub use similarity::{name_similarity, ratio};
pub use size::{FolderSizes, folder_size, measure, path_size};
pub use walker::{Walk, Walker, walk};

// Re-export core types for convenience
pub use fileworks_core::{EngineConfig, EntryKind, ExcludeMatch, PathEntry};
