//! Format backends.
//!
//! A backend reads and writes one family of containers. It receives an
//! already validated spec and member list and reports progress per member
//! through the task reporter; any error it returns fails the whole task.

mod stream;
mod tar;
mod zip;

use std::fs::File;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use fileworks_core::{TaskError, TaskReporter};

use crate::format::ArchiveFormat;
use crate::members::Member;
use crate::spec::ArchiveSpec;

pub use self::stream::StreamBackend;
pub use self::tar::TarBackend;
pub use self::zip::ZipBackend;

/// How far a backend got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// All members were written or extracted.
    Finished(usize),
    /// Stopped at a checkpoint after this many members.
    Cancelled(usize),
}

impl Completion {
    pub fn members(&self) -> usize {
        match self {
            Self::Finished(n) | Self::Cancelled(n) => *n,
        }
    }
}

/// Input of [`ArchiveBackend::compress`].
///
/// Backends open a fresh target through [`create_target`](Self::create_target),
/// so a failed task only cleans up a file it actually wrote.
#[derive(Debug)]
pub struct CompressJob<'a> {
    /// Spec with unsupported options already removed.
    pub spec: &'a ArchiveSpec,
    /// Members in the order they are to be written.
    pub members: &'a [Member],
    /// Open the existing target and add to it.
    pub append: bool,
    created: AtomicBool,
}

impl<'a> CompressJob<'a> {
    pub fn new(spec: &'a ArchiveSpec, members: &'a [Member], append: bool) -> Self {
        Self {
            spec,
            members,
            append,
            created: AtomicBool::new(false),
        }
    }

    /// Create or truncate the target file.
    pub fn create_target(&self) -> Result<File, TaskError> {
        let target = self.spec.target.as_path();
        let file = File::create(target).map_err(|e| TaskError::io(target, e))?;
        self.created.store(true, Ordering::Relaxed);
        Ok(file)
    }

    /// Check if the target was created or truncated by this job.
    pub fn target_created(&self) -> bool {
        self.created.load(Ordering::Relaxed)
    }
}

/// Input of [`ArchiveBackend::extract`].
#[derive(Debug)]
pub struct ExtractJob<'a> {
    pub archive: &'a Path,
    pub format: ArchiveFormat,
    /// Existing directory to unpack into.
    pub destination: &'a Path,
    pub password: Option<&'a str>,
}

/// A container format implementation.
pub trait ArchiveBackend: Send + Sync {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Formats this backend handles.
    fn formats(&self) -> &'static [ArchiveFormat];

    /// Write `job.members` into `job.spec.target`.
    fn compress(
        &self,
        job: &CompressJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError>;

    /// Unpack every member of `job.archive` below `job.destination`.
    fn extract(
        &self,
        job: &ExtractJob<'_>,
        reporter: &mut TaskReporter,
    ) -> Result<Completion, TaskError>;
}
