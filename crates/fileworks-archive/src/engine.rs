//! Compress and extract as tasks.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fileworks_core::{EngineConfig, TaskError, TaskOutcome, TaskOutput, TaskReporter};
use fileworks_scan::ExcludeSet;

use crate::backend::{ArchiveBackend, Completion, CompressJob, ExtractJob};
use crate::format::ArchiveFormat;
use crate::members::plan_members;
use crate::registry::BackendRegistry;
use crate::spec::{ArchiveSpec, ExtractSpec};

/// A compress request that passed validation.
pub struct PreparedCompress {
    /// Spec with unsupported options removed.
    pub spec: ArchiveSpec,
    excludes: ExcludeSet,
    backend: Arc<dyn ArchiveBackend>,
}

/// An extract request that passed validation.
pub struct PreparedExtract {
    pub archive: PathBuf,
    pub format: ArchiveFormat,
    pub destination: PathBuf,
    pub password: Option<String>,
    backend: Arc<dyn ArchiveBackend>,
}

/// Dispatches archive work to the registered backends.
#[derive(Debug, Clone)]
pub struct ArchiveEngine {
    registry: BackendRegistry,
    config: EngineConfig,
}

impl Default for ArchiveEngine {
    fn default() -> Self {
        Self::new(BackendRegistry::with_defaults(), EngineConfig::default())
    }
}

impl ArchiveEngine {
    pub fn new(registry: BackendRegistry, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    /// Check a compress request without touching the filesystem.
    pub fn prepare_compress(&self, spec: &ArchiveSpec) -> Result<PreparedCompress, TaskError> {
        if spec.sources.is_empty() {
            return Err(TaskError::EmptySources);
        }

        let backend = self.registry.get(spec.format)?;
        let capabilities = spec.format.capabilities();
        let effective = capabilities.apply(spec)?;

        for source in &spec.sources {
            fs::symlink_metadata(source).map_err(|e| TaskError::io(source, e))?;
            if same_file(source, &spec.target) {
                return Err(TaskError::invalid_input(format!(
                    "{} is both a source and the archive",
                    source.display()
                )));
            }
        }

        if !capabilities.multiple_members {
            if spec.sources.len() > 1 {
                return Err(TaskError::invalid_input(format!(
                    "{} compresses a single file, got {} sources",
                    spec.format,
                    spec.sources.len()
                )));
            }
            if spec.sources[0].is_dir() {
                return Err(TaskError::invalid_input(format!(
                    "{} cannot hold a folder: {}",
                    spec.format,
                    spec.sources[0].display()
                )));
            }
        }

        check_writable_target(&spec.target)?;

        let excludes = ExcludeSet::new(&spec.exclude_patterns, self.config.exclude_match)?;

        Ok(PreparedCompress {
            spec: effective,
            excludes,
            backend,
        })
    }

    /// Write the archive described by `spec`.
    ///
    /// The archive is one unit: if anything fails, a target the task created
    /// or truncated is removed and the task fails. A target the backend never
    /// opened, or one being appended to, is left alone. A cancelled archive
    /// is left as is.
    pub fn compress(&self, spec: &ArchiveSpec, reporter: &mut TaskReporter) -> TaskOutcome {
        let prepared = match self.prepare_compress(spec) {
            Ok(prepared) => prepared,
            Err(err) => return TaskOutcome::Failed(err),
        };
        self.run_compress(prepared, reporter)
    }

    /// Write an already prepared archive.
    pub fn run_compress(
        &self,
        prepared: PreparedCompress,
        reporter: &mut TaskReporter,
    ) -> TaskOutcome {
        let spec = &prepared.spec;
        let target = spec.target.clone();

        let members = match plan_members(
            &spec.sources,
            &prepared.excludes,
            spec.path_storage,
            &self.config,
            &target,
        ) {
            Ok(members) => members,
            Err(err) => return TaskOutcome::Failed(err),
        };

        if reporter.is_cancelled() {
            return TaskOutcome::Cancelled(TaskOutput::Archive {
                path: target,
                members: 0,
            });
        }

        let append = spec.append && target.exists();
        tracing::info!(
            target = %target.display(),
            format = %spec.format,
            backend = prepared.backend.name(),
            members = members.len(),
            append,
            "writing archive"
        );

        let job = CompressJob::new(spec, &members, append);
        match prepared.backend.compress(&job, reporter) {
            Ok(Completion::Finished(n)) => TaskOutcome::Completed(TaskOutput::Archive {
                path: target,
                members: n,
            }),
            Ok(Completion::Cancelled(n)) => TaskOutcome::Cancelled(TaskOutput::Archive {
                path: target,
                members: n,
            }),
            Err(err) => {
                if job.target_created() {
                    if let Err(remove_err) = fs::remove_file(&target) {
                        tracing::debug!(
                            target = %target.display(),
                            "could not remove failed archive: {remove_err}"
                        );
                    }
                }
                TaskOutcome::Failed(err)
            }
        }
    }

    /// Check an extract request without touching the filesystem.
    pub fn prepare_extract(&self, spec: &ExtractSpec) -> Result<PreparedExtract, TaskError> {
        let metadata = fs::metadata(&spec.archive).map_err(|e| TaskError::io(&spec.archive, e))?;
        if metadata.is_dir() {
            return Err(TaskError::invalid_input(format!(
                "{} is a folder, not an archive",
                spec.archive.display()
            )));
        }

        let format = spec
            .resolved_format()
            .ok_or_else(|| TaskError::UnsupportedFormat {
                name: spec
                    .archive
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            })?;
        let backend = self.registry.get(format)?;

        let destination = spec.destination.clone().ok_or(TaskError::NoDestination)?;
        if destination.exists() && !destination.is_dir() {
            return Err(TaskError::NotADirectory { path: destination });
        }

        let password = spec.effective_password().map(str::to_string);
        if password.is_some() && !format.capabilities().password {
            tracing::debug!(%format, "password given for a format without encryption, ignoring");
        }

        Ok(PreparedExtract {
            archive: spec.archive.clone(),
            format,
            destination,
            password,
            backend,
        })
    }

    /// Unpack the archive described by `spec`.
    pub fn extract(&self, spec: &ExtractSpec, reporter: &mut TaskReporter) -> TaskOutcome {
        let prepared = match self.prepare_extract(spec) {
            Ok(prepared) => prepared,
            Err(err) => return TaskOutcome::Failed(err),
        };
        self.run_extract(prepared, reporter)
    }

    /// Unpack an already prepared archive.
    pub fn run_extract(
        &self,
        prepared: PreparedExtract,
        reporter: &mut TaskReporter,
    ) -> TaskOutcome {
        let destination = prepared.destination.clone();
        if let Err(err) = fs::create_dir_all(&destination) {
            return TaskOutcome::Failed(TaskError::io(&destination, err));
        }

        tracing::info!(
            archive = %prepared.archive.display(),
            format = %prepared.format,
            destination = %destination.display(),
            "extracting archive"
        );

        let password = prepared
            .password
            .as_deref()
            .filter(|_| prepared.format.capabilities().password);
        let job = ExtractJob {
            archive: &prepared.archive,
            format: prepared.format,
            destination: &destination,
            password,
        };
        match prepared.backend.extract(&job, reporter) {
            Ok(Completion::Finished(n)) => TaskOutcome::Completed(TaskOutput::Extracted {
                destination,
                members: n,
            }),
            Ok(Completion::Cancelled(n)) => TaskOutcome::Cancelled(TaskOutput::Extracted {
                destination,
                members: n,
            }),
            Err(err) => TaskOutcome::Failed(err),
        }
    }
}

impl PreparedExtract {
    /// Check if the archive format can be encrypted.
    pub fn supports_password(&self) -> bool {
        self.format.capabilities().password
    }
}

/// The target's folder must exist and must not be marked read-only, and the
/// target itself must not be a folder.
///
/// Only the permission bits are read. Whether this user may actually write
/// there shows up as an I/O error when the backend creates the file.
fn check_writable_target(target: &Path) -> Result<(), TaskError> {
    if target.is_dir() {
        return Err(TaskError::DestinationUnwritable {
            path: target.to_path_buf(),
        });
    }

    let parent = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let metadata = fs::metadata(parent).map_err(|e| TaskError::io(parent, e))?;
    if !metadata.is_dir() {
        return Err(TaskError::NotADirectory {
            path: parent.to_path_buf(),
        });
    }
    if metadata.permissions().readonly() {
        return Err(TaskError::DestinationUnwritable {
            path: parent.to_path_buf(),
        });
    }
    Ok(())
}

/// Check if `a` and `b` resolve to the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    let (Ok(first), Ok(second)) = (fs::metadata(a), fs::metadata(b)) else {
        return false;
    };

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        first.dev() == second.dev() && first.ino() == second.ino()
    }

    #[cfg(not(unix))]
    {
        let _ = (first, second);
        matches!(
            (fs::canonicalize(a), fs::canonicalize(b)),
            (Ok(a), Ok(b)) if a == b
        )
    }
}
