//! Uniform start/cancel surface over every task kind.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use fileworks_archive::{
    ArchiveEngine, BackendRegistry, ExtractSpec, PreparedCompress, PreparedExtract,
};
use fileworks_core::{
    EngineConfig, HistoryEvent, HistorySink, Shell, TaskError, TaskHandle, TaskId, TaskOutcome,
    TaskReporter, task_channel,
};
use fileworks_scan::{SearchEngine, SearchRequest, measure};

use crate::copy::{CopyOptions, copy};
use crate::delete::delete;
use crate::move_op::move_to;
use crate::request::TaskRequest;

/// Starts background tasks and hands out their handles.
///
/// Each task runs on its own blocking worker thread and talks to its
/// [`TaskHandle`] only through the task channel. Tasks are not serialized
/// against each other: two tasks writing into the same folder race.
pub struct TaskEngine {
    config: EngineConfig,
    archives: ArchiveEngine,
    history: Option<Arc<dyn HistorySink>>,
    next_id: AtomicU64,
}

/// A request that passed validation, ready for a worker.
enum Job {
    Search(SearchEngine, SearchRequest),
    Delete {
        paths: Vec<PathBuf>,
        use_trash: bool,
    },
    Copy {
        sources: Vec<PathBuf>,
        destination: PathBuf,
        options: CopyOptions,
    },
    Move {
        sources: Vec<PathBuf>,
        destination: PathBuf,
        options: CopyOptions,
    },
    Compress(ArchiveEngine, PreparedCompress),
    Extract(ArchiveEngine, PreparedExtract),
    Measure {
        paths: Vec<PathBuf>,
        config: EngineConfig,
    },
}

impl Job {
    fn run(self, reporter: &mut TaskReporter) -> TaskOutcome {
        match self {
            Self::Search(engine, request) => engine.run(&request, reporter),
            Self::Delete { paths, use_trash } => delete(&paths, use_trash, reporter),
            Self::Copy {
                sources,
                destination,
                options,
            } => copy(&sources, &destination, options, reporter),
            Self::Move {
                sources,
                destination,
                options,
            } => move_to(&sources, &destination, options, reporter),
            Self::Compress(engine, prepared) => engine.run_compress(prepared, reporter),
            Self::Extract(engine, prepared) => engine.run_extract(prepared, reporter),
            Self::Measure { paths, config } => measure(&paths, &config, reporter),
        }
    }
}

impl TaskEngine {
    /// Create an engine with every archive backend built into this crate.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_registry(config, BackendRegistry::with_defaults())
    }

    /// Create an engine with a custom set of archive backends.
    pub fn with_registry(config: EngineConfig, registry: BackendRegistry) -> Self {
        Self {
            archives: ArchiveEngine::new(registry, config.clone()),
            config,
            history: None,
            next_id: AtomicU64::new(1),
        }
    }

    /// Send history events to `sink`.
    pub fn with_history(mut self, sink: Arc<dyn HistorySink>) -> Self {
        self.history = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn archives(&self) -> &ArchiveEngine {
        &self.archives
    }

    /// Validate `request` and run it in the background.
    ///
    /// Anything that would stop the task as a whole is reported here,
    /// before any worker starts or any file is written.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self, request: TaskRequest) -> Result<TaskHandle, TaskError> {
        let kind = request.kind();
        let job = self.prepare(request)?;

        let id = TaskId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (handle, mut reporter) = task_channel(id, kind);
        tracing::info!(task = %id, %kind, "task started");

        tokio::task::spawn_blocking(move || {
            let outcome = job.run(&mut reporter);
            reporter.finish(outcome);
        });

        Ok(handle)
    }

    /// Like [`start`](Self::start), but asks `shell` first where needed.
    ///
    /// Delete and move batches need confirmation; `Ok(None)` means the user
    /// declined. Extraction asks for a password when the format can be
    /// encrypted and none was given, then for a destination if none was
    /// given.
    pub fn start_interactive(
        &self,
        request: TaskRequest,
        shell: &dyn Shell,
    ) -> Result<Option<TaskHandle>, TaskError> {
        if let Some(question) = confirmation(&request) {
            if !shell.confirm(&question) {
                tracing::debug!(kind = %request.kind(), "declined");
                return Ok(None);
            }
        }

        let request = match request {
            TaskRequest::Extract(spec) => TaskRequest::Extract(self.ask_extract(spec, shell)?),
            other => other,
        };

        self.start(request).map(Some)
    }

    /// Request cancellation of a running task.
    pub fn cancel(&self, handle: &TaskHandle) {
        tracing::debug!(task = %handle.id(), "cancel requested");
        handle.cancel();
    }

    /// Report that the user opened `path`.
    pub fn file_opened(&self, path: impl Into<PathBuf>) {
        self.emit(HistoryEvent::FileOpened(path.into()));
    }

    /// Report that the user favorited `path`.
    pub fn path_favorited(&self, path: impl Into<PathBuf>) {
        self.emit(HistoryEvent::PathFavorited(path.into()));
    }

    /// Fill in the password and destination of an extraction from `shell`.
    fn ask_extract(
        &self,
        mut spec: ExtractSpec,
        shell: &dyn Shell,
    ) -> Result<ExtractSpec, TaskError> {
        let format = spec
            .resolved_format()
            .ok_or_else(|| unsupported(&spec.archive))?;
        self.archives.registry().get(format)?;

        if spec.password.is_none() && format.capabilities().password {
            spec.password = shell.prompt_password();
        }
        if spec.destination.is_none() {
            let initial = parent_or_current(&spec.archive);
            let chosen = shell
                .prompt_destination_directory(&initial)
                .ok_or(TaskError::NoDestination)?;
            spec.destination = Some(chosen);
        }
        Ok(spec)
    }

    fn emit(&self, event: HistoryEvent) {
        if let Some(sink) = &self.history {
            sink.record(event);
        }
    }

    fn prepare(&self, request: TaskRequest) -> Result<Job, TaskError> {
        let job = match request {
            TaskRequest::Search(request) => {
                request.validate()?;
                Job::Search(SearchEngine::new(self.config.clone()), request)
            }
            TaskRequest::Delete { paths, use_trash } => {
                non_empty(&paths)?;
                Job::Delete {
                    paths,
                    use_trash: use_trash.unwrap_or(self.config.use_trash),
                }
            }
            TaskRequest::Copy {
                sources,
                destination,
            } => {
                non_empty(&sources)?;
                check_destination(&destination)?;
                Job::Copy {
                    sources,
                    destination,
                    options: CopyOptions::from(&self.config),
                }
            }
            TaskRequest::Move {
                sources,
                destination,
            } => {
                non_empty(&sources)?;
                check_destination(&destination)?;
                Job::Move {
                    sources,
                    destination,
                    options: CopyOptions::from(&self.config),
                }
            }
            TaskRequest::Compress(spec) => {
                let prepared = self.archives.prepare_compress(&spec)?;
                Job::Compress(self.archives.clone(), prepared)
            }
            TaskRequest::Extract(spec) => {
                let prepared = self.archives.prepare_extract(&spec)?;
                Job::Extract(self.archives.clone(), prepared)
            }
            TaskRequest::Measure { paths } => {
                non_empty(&paths)?;
                Job::Measure {
                    paths,
                    config: self.config.clone(),
                }
            }
        };
        Ok(job)
    }
}

impl Default for TaskEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl std::fmt::Debug for TaskEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskEngine")
            .field("config", &self.config)
            .field("archives", &self.archives)
            .field("history", &self.history.is_some())
            .finish()
    }
}

/// The question to ask before a destructive batch.
fn confirmation(request: &TaskRequest) -> Option<String> {
    match request {
        TaskRequest::Delete { paths, .. } => Some(format!("Delete {} item(s)?", paths.len())),
        TaskRequest::Move {
            sources,
            destination,
        } => Some(format!(
            "Move {} item(s) to {}?",
            sources.len(),
            destination.display()
        )),
        _ => None,
    }
}

fn non_empty(paths: &[PathBuf]) -> Result<(), TaskError> {
    if paths.is_empty() {
        return Err(TaskError::EmptySources);
    }
    Ok(())
}

/// The destination must be an existing folder not marked read-only.
///
/// Only the permission bits are read; a folder this user still cannot write
/// to fails per item when the first entry is written.
fn check_destination(destination: &Path) -> Result<(), TaskError> {
    let metadata = fs::metadata(destination).map_err(|e| TaskError::io(destination, e))?;
    if !metadata.is_dir() {
        return Err(TaskError::NotADirectory {
            path: destination.to_path_buf(),
        });
    }
    if metadata.permissions().readonly() {
        return Err(TaskError::DestinationUnwritable {
            path: destination.to_path_buf(),
        });
    }
    Ok(())
}

fn parent_or_current(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn unsupported(archive: &Path) -> TaskError {
    TaskError::UnsupportedFormat {
        name: archive
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}
