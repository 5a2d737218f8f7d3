//! Progress and cancellation channel between a task worker and its controller.
//!
//! Every background task is driven through one [`TaskReporter`] (worker side)
//! and observed through one [`TaskHandle`] (controller side). The channel is
//! unbounded so the worker never waits on the reader, and cancellation is a
//! shared [`CancellationToken`] that the worker polls at its checkpoints.
//!
//! Guarantees enforced here rather than by each task:
//!
//! - progress is clamped to `0..=100` and never decreases,
//! - exactly one [`TaskEvent::Finished`] is delivered per task, even if the
//!   worker panics (the reporter's `Drop` reports a lost worker),
//! - a completed task always reports 100 before its terminal event, a
//!   cancelled one never does.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{OperationError, TaskError};

/// Identifier of one task within an engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskId(pub u64);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The kind of background operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskKind {
    Search,
    Delete,
    Copy,
    Move,
    Compress,
    Extract,
    Measure,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Search => write!(f, "Search"),
            Self::Delete => write!(f, "Delete"),
            Self::Copy => write!(f, "Copy"),
            Self::Move => write!(f, "Move"),
            Self::Compress => write!(f, "Compress"),
            Self::Extract => write!(f, "Extract"),
            Self::Measure => write!(f, "Measure"),
        }
    }
}

/// Lifecycle state of a task as seen by its controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskState {
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TaskState {
    /// Check if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Running)
    }
}

/// How search results were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    /// Case-insensitive substring matches.
    Exact,
    /// No exact match; similar names instead.
    Fuzzy,
    /// Nothing matched either way.
    NoMatches,
}

/// Result of a search task, in walk order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMatches {
    /// The query as given by the caller.
    pub query: String,
    /// How the paths were matched.
    pub mode: MatchMode,
    /// Matching paths.
    pub paths: Vec<PathBuf>,
}

impl SearchMatches {
    /// Human-readable status line for the result list.
    pub fn message(&self) -> String {
        match self.mode {
            MatchMode::Exact => format!("{} result(s) for '{}'", self.paths.len(), self.query),
            MatchMode::Fuzzy => format!("Showing similar results for '{}'", self.query),
            MatchMode::NoMatches => "We couldn't find anything matching your search.".to_string(),
        }
    }

    /// Check if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Counters for a batch operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Items in the batch.
    pub total: usize,
    /// Items processed successfully.
    pub succeeded: usize,
    /// Items that produced an error.
    pub failed: usize,
    /// Items left untouched by policy.
    pub skipped: usize,
    /// Bytes copied, moved or freed.
    pub bytes_processed: u64,
}

impl BatchSummary {
    /// Create a summary for a batch of `total` items.
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Default::default()
        }
    }

    /// Number of items handled so far.
    pub fn processed(&self) -> usize {
        self.succeeded + self.failed + self.skipped
    }

    /// Get a human-readable summary of the operation.
    pub fn summary(&self, kind: TaskKind) -> String {
        let action = match kind {
            TaskKind::Copy => "Copied",
            TaskKind::Move => "Moved",
            TaskKind::Delete => "Deleted",
            _ => "Processed",
        };

        if self.failed == 0 {
            format!("{} {} items", action, self.succeeded)
        } else {
            format!("{} {} items, {} failed", action, self.succeeded, self.failed)
        }
    }
}

/// Payload of a finished (or cancelled) task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TaskOutput {
    /// Search results.
    Search(SearchMatches),
    /// Delete, copy or move counters.
    Batch(BatchSummary),
    /// An archive was written.
    Archive { path: PathBuf, members: usize },
    /// An archive was unpacked.
    Extracted { destination: PathBuf, members: usize },
    /// Sizes of the measured paths, in request order.
    Sizes(Vec<(PathBuf, u64)>),
}

impl TaskOutput {
    /// Search results, if this is a search output.
    pub fn as_search(&self) -> Option<&SearchMatches> {
        match self {
            Self::Search(matches) => Some(matches),
            _ => None,
        }
    }

    /// Batch counters, if this is a batch output.
    pub fn as_batch(&self) -> Option<&BatchSummary> {
        match self {
            Self::Batch(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Terminal outcome of a task.
#[derive(Debug)]
pub enum TaskOutcome {
    /// The task ran to the end. Item errors may still have occurred.
    Completed(TaskOutput),
    /// The task stopped at a checkpoint; the output holds what was done.
    Cancelled(TaskOutput),
    /// The task could not proceed.
    Failed(TaskError),
}

impl TaskOutcome {
    /// The state this outcome puts the task in.
    pub fn state(&self) -> TaskState {
        match self {
            Self::Completed(_) => TaskState::Completed,
            Self::Cancelled(_) => TaskState::Cancelled,
            Self::Failed(_) => TaskState::Failed,
        }
    }

    /// The output, unless the task failed.
    pub fn output(&self) -> Option<&TaskOutput> {
        match self {
            Self::Completed(output) | Self::Cancelled(output) => Some(output),
            Self::Failed(_) => None,
        }
    }

    /// The failure reason, if the task failed.
    pub fn error(&self) -> Option<&TaskError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

/// Everything known about a task once it is over.
#[derive(Debug)]
pub struct TaskReport {
    /// Task identifier.
    pub id: TaskId,
    /// Task kind.
    pub kind: TaskKind,
    /// Terminal outcome.
    pub outcome: TaskOutcome,
    /// Item errors in the order they occurred.
    pub errors: Vec<OperationError>,
    /// Last progress value reported.
    pub progress: u8,
}

impl TaskReport {
    /// Terminal state of the task.
    pub fn state(&self) -> TaskState {
        self.outcome.state()
    }
}

/// Event streamed from a worker to its controller.
#[derive(Debug)]
pub enum TaskEvent {
    /// Percentage of work done, `0..=100`.
    Progress(u8),
    /// One item failed; the task continues.
    PartialError(OperationError),
    /// The task is over. Always the last event.
    Finished(TaskReport),
}

/// Create a connected handle/reporter pair for a new task.
pub fn task_channel(id: TaskId, kind: TaskKind) -> (TaskHandle, TaskReporter) {
    let (tx, rx) = mpsc::unbounded_channel();
    let token = CancellationToken::new();

    let handle = TaskHandle {
        id,
        kind,
        token: token.clone(),
        rx,
        progress: 0,
        state: TaskState::Running,
    };
    let reporter = TaskReporter {
        id,
        kind,
        tx,
        token,
        progress: 0,
        errors: Vec::new(),
        finished: false,
    };

    (handle, reporter)
}

/// Worker-side end of the task channel.
#[derive(Debug)]
pub struct TaskReporter {
    id: TaskId,
    kind: TaskKind,
    tx: mpsc::UnboundedSender<TaskEvent>,
    token: CancellationToken,
    progress: u8,
    errors: Vec<OperationError>,
    finished: bool,
}

impl TaskReporter {
    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Checkpoint: has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// The cancellation token observed by this worker.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Last progress value sent.
    pub fn current_progress(&self) -> u8 {
        self.progress
    }

    /// Report progress. Values above 100 are clamped and values below the
    /// last report are ignored.
    pub fn progress(&mut self, percent: u8) {
        let percent = percent.min(100);
        if percent > self.progress {
            self.progress = percent;
            let _ = self.tx.send(TaskEvent::Progress(percent));
        }
    }

    /// Report `floor(done * 100 / total)`, treating a zero total as one.
    pub fn progress_fraction(&mut self, done: usize, total: usize) {
        let total = total.max(1) as u128;
        let percent = (done as u128 * 100 / total).min(100) as u8;
        self.progress(percent);
    }

    /// Record a failed item and keep going.
    pub fn partial_error(&mut self, error: OperationError) {
        tracing::warn!(task = %self.id, kind = %self.kind, path = %error.path.display(), "{}", error.message);
        self.errors.push(error.clone());
        let _ = self.tx.send(TaskEvent::PartialError(error));
    }

    /// Number of item errors so far.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Deliver the terminal event. Consumes the reporter so no event can
    /// follow it.
    pub fn finish(mut self, outcome: TaskOutcome) {
        if matches!(outcome, TaskOutcome::Completed(_)) {
            self.progress(100);
        }
        self.send_finished(outcome);
    }

    fn send_finished(&mut self, outcome: TaskOutcome) {
        self.finished = true;
        tracing::info!(
            task = %self.id,
            kind = %self.kind,
            state = ?outcome.state(),
            errors = self.errors.len(),
            "task finished"
        );
        let report = TaskReport {
            id: self.id,
            kind: self.kind,
            outcome,
            errors: std::mem::take(&mut self.errors),
            progress: self.progress,
        };
        let _ = self.tx.send(TaskEvent::Finished(report));
    }
}

impl Drop for TaskReporter {
    fn drop(&mut self) {
        if !self.finished {
            let message = if std::thread::panicking() {
                "worker panicked"
            } else {
                "worker exited without a result"
            };
            self.send_finished(TaskOutcome::Failed(TaskError::WorkerLost {
                message: message.to_string(),
            }));
        }
    }
}

/// Controller-side end of the task channel.
#[derive(Debug)]
pub struct TaskHandle {
    id: TaskId,
    kind: TaskKind,
    token: CancellationToken,
    rx: mpsc::UnboundedReceiver<TaskEvent>,
    progress: u8,
    state: TaskState,
}

impl TaskHandle {
    /// Task identifier.
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Task kind.
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Request cooperative cancellation. Idempotent.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A token other observers can use to cancel or watch this task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Last progress value received.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    /// Last state observed.
    pub fn state(&self) -> TaskState {
        self.state
    }

    /// Wait for the next event. Returns `None` after the terminal event.
    pub async fn next_event(&mut self) -> Option<TaskEvent> {
        let event = self.rx.recv().await?;
        self.observe(&event);
        Some(event)
    }

    /// Take the next event if one is queued, without waiting.
    pub fn try_next_event(&mut self) -> Option<TaskEvent> {
        let event = self.rx.try_recv().ok()?;
        self.observe(&event);
        Some(event)
    }

    /// Drain events until the task is over and return its report.
    pub async fn wait(mut self) -> TaskReport {
        while let Some(event) = self.next_event().await {
            if let TaskEvent::Finished(report) = event {
                return report;
            }
        }

        TaskReport {
            id: self.id,
            kind: self.kind,
            outcome: TaskOutcome::Failed(TaskError::WorkerLost {
                message: "event channel closed".to_string(),
            }),
            errors: Vec::new(),
            progress: self.progress,
        }
    }

    fn observe(&mut self, event: &TaskEvent) {
        match event {
            TaskEvent::Progress(p) => self.progress = (*p).max(self.progress),
            TaskEvent::PartialError(_) => {}
            TaskEvent::Finished(report) => self.state = report.state(),
        }
    }
}
