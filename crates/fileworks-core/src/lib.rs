//! Core types and traits for fileworks.
//!
//! This crate provides the data model shared by every fileworks task
//! (path entries, per-item errors, the error taxonomy), the engine
//! configuration, and the progress/cancellation channel that connects a
//! background worker to its controller.

mod config;
mod entry;
mod error;
mod history;
mod shell;
mod task;

pub use config::{ConflictPolicy, EngineConfig, EngineConfigBuilder, ExcludeMatch};
pub use entry::{EntryKind, PathEntry};
pub use error::{ErrorClass, OperationError, TaskError};
pub use history::{Favorites, HistoryEvent, HistorySink, MAX_RECENT, RECENT_BATCH, RecentList};
pub use shell::Shell;
pub use task::{
    BatchSummary, MatchMode, SearchMatches, TaskEvent, TaskHandle, TaskId, TaskKind, TaskOutcome,
    TaskOutput, TaskReport, TaskReporter, TaskState, task_channel,
};
