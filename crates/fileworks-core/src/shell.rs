//! Interface to the interactive shell that drives the engine.

use std::path::{Path, PathBuf};

/// Prompts and confirmations owned by the interactive surface.
///
/// The engine calls these on the control thread before a task starts,
/// never from a worker.
pub trait Shell {
    /// Ask for an archive password. `None` means the prompt was dismissed;
    /// an empty string means "no password".
    fn prompt_password(&self) -> Option<String>;

    /// Ask for a destination directory, starting at `initial`.
    fn prompt_destination_directory(&self, initial: &Path) -> Option<PathBuf>;

    /// Ask the user to confirm a destructive batch.
    fn confirm(&self, message: &str) -> bool;
}
