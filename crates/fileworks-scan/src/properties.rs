//! Properties of a single path, for info views.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::Serialize;

use fileworks_core::{EntryKind, TaskError};

use crate::size::FolderSizes;

/// Snapshot of a path's metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PathProperties {
    /// The inspected path.
    pub path: PathBuf,
    /// File, folder or symlink.
    pub kind: EntryKind,
    /// File size, or recursive folder size.
    pub size: u64,
    /// Containing directory.
    pub location: Option<PathBuf>,
    /// Last modification time.
    pub modified: Option<DateTime<Local>>,
    /// Last access time.
    pub accessed: Option<DateTime<Local>>,
    /// Creation time (platform-dependent).
    pub created: Option<DateTime<Local>>,
    /// Whether the path is read-only.
    pub readonly: bool,
    /// Unix permission bits.
    pub mode: Option<u32>,
}

impl PathProperties {
    /// Permission bits rendered as `rwxr-xr-x`.
    pub fn mode_string(&self) -> Option<String> {
        let mode = self.mode?;
        let mut out = String::with_capacity(9);
        for shift in [6u32, 3, 0] {
            let bits = (mode >> shift) & 0o7;
            out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
            out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
            out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
        }
        Some(out)
    }
}

/// Read the properties of `path`. Folder sizes go through `sizes`.
pub fn properties(path: &Path, sizes: &mut FolderSizes) -> Result<PathProperties, TaskError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| TaskError::io(path, e))?;
    let kind = EntryKind::from_file_type(metadata.file_type());
    let size = match kind {
        EntryKind::File => metadata.len(),
        EntryKind::Directory => sizes.size_of(path),
        EntryKind::Symlink => 0,
    };

    Ok(PathProperties {
        path: path.to_path_buf(),
        kind,
        size,
        location: path.parent().map(Path::to_path_buf),
        modified: metadata.modified().ok().map(DateTime::from),
        accessed: metadata.accessed().ok().map(DateTime::from),
        created: metadata.created().ok().map(DateTime::from),
        readonly: metadata.permissions().readonly(),
        mode: unix_mode(&metadata),
    })
}

#[cfg(unix)]
fn unix_mode(metadata: &fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o777)
}

#[cfg(not(unix))]
fn unix_mode(_metadata: &fs::Metadata) -> Option<u32> {
    None
}
