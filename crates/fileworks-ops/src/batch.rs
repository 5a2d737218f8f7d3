//! Item-by-item driver shared by delete, copy and move.

use std::io;
use std::path::Path;

use fileworks_core::{BatchSummary, OperationError, TaskOutcome, TaskOutput, TaskReporter};

/// What happened to one item of a batch.
#[derive(Debug)]
pub(crate) enum ItemOutcome {
    /// Done; carries the bytes copied, moved or freed.
    Done(u64),
    /// Left alone by the conflict policy.
    Skipped,
    Failed(OperationError),
}

/// Run `process` over `items` in order.
///
/// Cancellation is checked before each item, so an item that has started is
/// always finished. After item `i` of `n` the progress is `(i + 1) * 100 / n`.
pub(crate) fn run_batch<T>(
    items: &[T],
    reporter: &mut TaskReporter,
    mut process: impl FnMut(&T, &mut TaskReporter) -> ItemOutcome,
) -> TaskOutcome {
    let mut summary = BatchSummary::new(items.len());

    for (i, item) in items.iter().enumerate() {
        if reporter.is_cancelled() {
            tracing::debug!(task = %reporter.id(), processed = i, "batch cancelled");
            return TaskOutcome::Cancelled(TaskOutput::Batch(summary));
        }

        match process(item, reporter) {
            ItemOutcome::Done(bytes) => {
                summary.succeeded += 1;
                summary.bytes_processed += bytes;
            }
            ItemOutcome::Skipped => summary.skipped += 1,
            ItemOutcome::Failed(error) => {
                summary.failed += 1;
                reporter.partial_error(error);
            }
        }
        reporter.progress_fraction(i + 1, items.len());
    }

    TaskOutcome::Completed(TaskOutput::Batch(summary))
}

/// Map an I/O error on `path` to an item error.
pub(crate) fn item_error(path: &Path, action: &str) -> impl FnOnce(io::Error) -> OperationError {
    move |err| OperationError::new(path, format!("{action}: {}", describe(&err)))
}

fn describe(err: &io::Error) -> String {
    match err.kind() {
        io::ErrorKind::NotFound => "No such file or folder".to_string(),
        io::ErrorKind::PermissionDenied => "Permission denied".to_string(),
        _ => err.to_string(),
    }
}
