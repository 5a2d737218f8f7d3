use std::path::PathBuf;

use fileworks_archive::{ArchiveSpec, ExtractSpec};
use fileworks_core::TaskKind;
use fileworks_scan::SearchRequest;

/// A background task to start on a [`crate::TaskEngine`].
#[derive(Debug, Clone)]
pub enum TaskRequest {
    /// Find entries by name below a folder.
    Search(SearchRequest),
    /// Delete paths. `use_trash: None` follows the engine configuration.
    Delete {
        paths: Vec<PathBuf>,
        use_trash: Option<bool>,
    },
    /// Copy sources into a folder.
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Move sources into a folder.
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
    },
    /// Write an archive.
    Compress(ArchiveSpec),
    /// Unpack an archive.
    Extract(ExtractSpec),
    /// Compute the size of each path.
    Measure { paths: Vec<PathBuf> },
}

impl TaskRequest {
    /// Delete `paths` using the engine's trash setting.
    pub fn delete(paths: Vec<PathBuf>) -> Self {
        Self::Delete {
            paths,
            use_trash: None,
        }
    }

    /// The kind of task this request starts.
    pub fn kind(&self) -> TaskKind {
        match self {
            Self::Search(_) => TaskKind::Search,
            Self::Delete { .. } => TaskKind::Delete,
            Self::Copy { .. } => TaskKind::Copy,
            Self::Move { .. } => TaskKind::Move,
            Self::Compress(_) => TaskKind::Compress,
            Self::Extract(_) => TaskKind::Extract,
            Self::Measure { .. } => TaskKind::Measure,
        }
    }
}
