//! Renaming a single entry, and the file name rules shared with create.

use std::fs;
use std::path::{Path, PathBuf};

use fileworks_core::TaskError;

use crate::conflict::same_entry;

/// Longest accepted name, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Check that `name` is usable as a single path component on every
/// platform fileworks runs on.
pub fn validate_filename(name: &str) -> Result<(), TaskError> {
    let invalid = |message: &str| TaskError::InvalidName {
        name: name.to_string(),
        message: message.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(invalid("'.' and '..' are reserved names"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name is too long (max 255 bytes)"));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '/' | '\0')) {
        return Err(invalid(&format!("name cannot contain {c:?}")));
    }

    #[cfg(windows)]
    {
        if let Some(c) = name
            .chars()
            .find(|c| matches!(c, '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'))
        {
            return Err(invalid(&format!("name cannot contain {c:?}")));
        }
        const RESERVED: [&str; 22] = [
            "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7",
            "COM8", "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
        ];
        let base = name.split('.').next().unwrap_or_default().to_uppercase();
        if RESERVED.contains(&base.as_str()) {
            return Err(invalid("reserved file name"));
        }
    }

    if name.starts_with(' ') || name.ends_with(' ') {
        return Err(invalid("name cannot start or end with a space"));
    }
    if name.ends_with('.') {
        return Err(invalid("name cannot end with a dot"));
    }

    Ok(())
}

/// Give `path` the file name `new_name` in the same folder.
///
/// Returns the new path. Fails if another entry already has that name. A
/// change of case only is allowed when the filesystem resolves both names to
/// the same entry.
pub fn rename(path: &Path, new_name: &str) -> Result<PathBuf, TaskError> {
    validate_filename(new_name)?;
    fs::symlink_metadata(path).map_err(|e| TaskError::io(path, e))?;

    let current = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| TaskError::invalid_input(format!("cannot rename {}", path.display())))?;
    if current == new_name {
        return Ok(path.to_path_buf());
    }

    let target = path.with_file_name(new_name);
    let case_only = current.to_lowercase() == new_name.to_lowercase();
    if fs::symlink_metadata(&target).is_ok() && !(case_only && same_entry(path, &target)) {
        return Err(TaskError::AlreadyExists { path: target });
    }

    fs::rename(path, &target).map_err(|e| TaskError::io(path, e))?;
    tracing::info!(from = %path.display(), to = %target.display(), "renamed");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_filename_valid() {
        assert!(validate_filename("test.txt").is_ok());
        assert!(validate_filename("my-file").is_ok());
        assert!(validate_filename(".hidden").is_ok());
        assert!(validate_filename("file with spaces").is_ok());
    }

    #[test]
    fn test_validate_filename_invalid() {
        for name in ["", "test/file", ".", "..", "file ", " file", "file.", "a\0b"] {
            assert!(
                matches!(validate_filename(name), Err(TaskError::InvalidName { .. })),
                "{name:?}"
            );
        }
        assert!(validate_filename(&"x".repeat(256)).is_err());
        assert!(validate_filename(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn test_rename_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();

        let err = rename(&a, "b.txt").unwrap_err();
        assert!(matches!(err, TaskError::AlreadyExists { .. }));
        let expected = format!("'{}' already exists", dir.path().join("b.txt").display());
        assert_eq!(err.to_string(), expected);
        assert!(a.exists());
    }

    #[test]
    fn test_rename_case_change_keeps_other_file() {
        let dir = tempfile::tempdir().unwrap();
        let upper = dir.path().join("Report.txt");
        fs::write(&upper, b"UPPER").unwrap();
        let lower = dir.path().join("report.txt");
        if lower.exists() {
            // case-insensitive volume, there is no second file to protect
            return;
        }
        fs::write(&lower, b"lower").unwrap();

        let err = rename(&upper, "report.txt").unwrap_err();
        assert!(matches!(err, TaskError::AlreadyExists { .. }));
        assert_eq!(fs::read(&upper).unwrap(), b"UPPER");
        assert_eq!(fs::read(&lower).unwrap(), b"lower");
    }

    #[test]
    fn test_rename_case_only() {
        let dir = tempfile::tempdir().unwrap();
        let upper = dir.path().join("Notes.txt");
        fs::write(&upper, b"n").unwrap();

        let renamed = rename(&upper, "notes.txt").unwrap();
        assert_eq!(renamed, dir.path().join("notes.txt"));
        assert_eq!(fs::read(&renamed).unwrap(), b"n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
