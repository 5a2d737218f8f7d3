//! Error types for background tasks.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a task as a whole.
///
/// Per-item failures inside a batch are [`OperationError`] values and never
/// surface as a `TaskError`.
#[derive(Debug, Error)]
pub enum TaskError {
    /// No sources were given.
    #[error("No source paths given")]
    EmptySources,

    /// A required path does not exist.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// A path that must be a directory is not one.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// No destination directory was supplied.
    #[error("No destination directory chosen")]
    NoDestination,

    /// The destination cannot be written to.
    #[error("Destination is not writable: {path}")]
    DestinationUnwritable { path: PathBuf },

    /// A path already exists where a new one was to be created.
    #[error("'{path}' already exists")]
    AlreadyExists { path: PathBuf },

    /// A file name failed validation.
    #[error("Invalid name '{name}': {message}")]
    InvalidName { name: String, message: String },

    /// Request parameters are unusable.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// An exclude pattern could not be compiled.
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The archive format is not recognised.
    #[error("Unsupported archive format: {name}")]
    UnsupportedFormat { name: String },

    /// A password was requested for a format that cannot encrypt.
    #[error("The {format} format does not support passwords")]
    PasswordNotSupported { format: String },

    /// The archive needs a password that was missing or wrong.
    #[error("Password required or incorrect for {path}")]
    PasswordRejected { path: PathBuf },

    /// The format is known but its backend is not compiled into this build.
    #[error("{format} archives are not supported in this build")]
    BackendUnavailable { format: String },

    /// A backend failed while reading or writing an archive.
    #[error("Archive error at {path}: {message}")]
    Archive { path: PathBuf, message: String },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The worker ended without reporting a terminal state.
    #[error("Task worker stopped unexpectedly: {message}")]
    WorkerLost { message: String },
}

/// Coarse classification of a [`TaskError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorClass {
    /// The operation cannot proceed at all.
    Scope,
    /// An optional backend is missing from this build.
    BackendUnavailable,
}

impl TaskError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an archive backend error.
    pub fn archive(path: impl Into<PathBuf>, message: impl std::fmt::Display) -> Self {
        Self::Archive {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Classify this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::BackendUnavailable { .. } => ErrorClass::BackendUnavailable,
            _ => ErrorClass::Scope,
        }
    }

    /// Check if this error reports a missing backend.
    pub fn is_backend_unavailable(&self) -> bool {
        self.class() == ErrorClass::BackendUnavailable
    }
}

/// An error for one item of a batch. The batch continues past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationError {
    /// The path that caused the error.
    pub path: PathBuf,
    /// A human-readable error message.
    pub message: String,
}

impl OperationError {
    /// Create a new operation error.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for OperationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_error_io() {
        let err = TaskError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, TaskError::PermissionDenied { .. }));

        let err = TaskError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::Other, "boom"),
        );
        assert!(matches!(err, TaskError::Io { .. }));
    }

    #[test]
    fn test_error_class() {
        let missing = TaskError::BackendUnavailable {
            format: "7z".into(),
        };
        assert_eq!(missing.class(), ErrorClass::BackendUnavailable);
        assert!(missing.to_string().contains("not supported in this build"));

        let scope = TaskError::PasswordNotSupported {
            format: "tar".into(),
        };
        assert_eq!(scope.class(), ErrorClass::Scope);
        assert!(!scope.is_backend_unavailable());
    }

    #[test]
    fn test_operation_error_display() {
        let err = OperationError::new("/a/b.txt", "Permission denied");
        assert_eq!(err.to_string(), "/a/b.txt: Permission denied");
    }
}
