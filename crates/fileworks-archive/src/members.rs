//! Turning source paths into archive members.

use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

use fileworks_core::{EngineConfig, EntryKind, TaskError};
use fileworks_scan::{ExcludeSet, Walker};

use crate::spec::PathStorage;

/// One entry to be written into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    /// File or folder on disk.
    pub source: PathBuf,
    /// Name inside the archive, `/`-separated, without a trailing slash.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// File size in bytes.
    pub size: u64,
}

impl Member {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

/// Expand `sources` into archive members in walk order.
///
/// Directories are walked recursively; entries matching `excludes` are left
/// out with their subtrees; symlinks are skipped. `skip` (the archive being
/// written) is never added to itself.
pub fn plan_members(
    sources: &[PathBuf],
    excludes: &ExcludeSet,
    storage: PathStorage,
    config: &EngineConfig,
    skip: &Path,
) -> Result<Vec<Member>, TaskError> {
    let sources = sources
        .iter()
        .map(|s| std::path::absolute(s).map_err(|e| TaskError::io(s, e)))
        .collect::<Result<Vec<_>, _>>()?;
    let base = common_base(&sources);
    let skip = std::path::absolute(skip).unwrap_or_else(|_| skip.to_path_buf());

    let mut planner = Planner {
        base,
        storage,
        skip,
        seen: HashSet::new(),
        members: Vec::new(),
    };

    for source in &sources {
        let metadata = fs::symlink_metadata(source).map_err(|e| TaskError::io(source, e))?;
        if excludes.is_excluded(source) {
            tracing::debug!(path = %source.display(), "source excluded");
            continue;
        }

        let kind = EntryKind::from_file_type(metadata.file_type());
        planner.push(source, kind, metadata.len());

        if kind == EntryKind::Directory {
            let walker = Walker::with_config(source, config).excludes(excludes.clone());
            for entry in walker.walk() {
                planner.push(&entry.path, entry.kind, entry.size);
            }
        }
    }

    Ok(planner.members)
}

struct Planner {
    base: PathBuf,
    storage: PathStorage,
    skip: PathBuf,
    seen: HashSet<String>,
    members: Vec<Member>,
}

impl Planner {
    fn push(&mut self, path: &Path, kind: EntryKind, size: u64) {
        if path == self.skip {
            return;
        }
        if kind == EntryKind::Symlink {
            tracing::debug!(path = %path.display(), "skipping symlink");
            return;
        }

        let name = match self.storage {
            PathStorage::Relative => relative_name(path, &self.base),
            PathStorage::BasenameOnly if kind == EntryKind::Directory => return,
            PathStorage::BasenameOnly => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        };
        if name.is_empty() {
            return;
        }
        if !self.seen.insert(name.clone()) {
            tracing::warn!(path = %path.display(), name, "duplicate member name, skipping");
            return;
        }

        self.members.push(Member {
            source: path.to_path_buf(),
            name,
            kind,
            size: if kind == EntryKind::File { size } else { 0 },
        });
    }
}

/// Deepest directory containing the parents of all `sources`.
fn common_base(sources: &[PathBuf]) -> PathBuf {
    let mut parents = sources
        .iter()
        .map(|s| s.parent().unwrap_or(s.as_path()).to_path_buf());
    let Some(mut base) = parents.next() else {
        return PathBuf::new();
    };

    for parent in parents {
        while !parent.starts_with(&base) {
            if !base.pop() {
                break;
            }
        }
    }

    base
}

fn relative_name(path: &Path, base: &Path) -> String {
    let relative = path.strip_prefix(base).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
