//! Path entries produced by directory traversal.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Type of file system entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    /// Regular file (or any non-directory, non-symlink entry).
    File,
    /// Directory.
    Directory,
    /// Symbolic link (never followed for sizing).
    Symlink,
}

impl EntryKind {
    /// Classify a file type.
    pub fn from_file_type(file_type: std::fs::FileType) -> Self {
        if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else {
            Self::File
        }
    }
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "File"),
            Self::Directory => write!(f, "Folder"),
            Self::Symlink => write!(f, "Symlink"),
        }
    }
}

/// Immutable snapshot of one traversal step.
///
/// `size` is the file length for files. Directories and symlinks carry 0;
/// directory sizes are computed on demand by summing descendant files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Absolute path of the entry.
    pub path: PathBuf,
    /// Entry type.
    pub kind: EntryKind,
    /// Size in bytes (files only).
    pub size: u64,
    /// Depth below the walk root (direct children are depth 1).
    pub depth: usize,
}

impl PathEntry {
    /// Create a new entry.
    pub fn new(path: impl Into<PathBuf>, kind: EntryKind, size: u64, depth: usize) -> Self {
        Self {
            path: path.into(),
            kind,
            size,
            depth,
        }
    }

    /// The final path component, lossily converted.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The entry's path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check if this entry is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Check if this entry is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Check if this entry is a symlink.
    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}
