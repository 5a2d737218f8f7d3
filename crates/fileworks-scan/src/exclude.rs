//! Shell-style exclusion patterns.

use std::path::Path;

use globset::{Glob, GlobSet, GlobSetBuilder};

use fileworks_core::{ExcludeMatch, TaskError};

/// A compiled set of exclude globs.
///
/// Patterns follow shell `fnmatch` rules: `*` also matches path separators,
/// so `*.tmp` excludes `a.tmp` whether it is matched against a name or a
/// full path.
#[derive(Debug, Clone)]
pub struct ExcludeSet {
    set: Option<GlobSet>,
    target: ExcludeMatch,
}

impl ExcludeSet {
    /// Compile `patterns`. Blank patterns are ignored.
    pub fn new<S: AsRef<str>>(patterns: &[S], target: ExcludeMatch) -> Result<Self, TaskError> {
        let mut builder = GlobSetBuilder::new();
        let mut count = 0;

        for pattern in patterns {
            let pattern = pattern.as_ref().trim();
            if pattern.is_empty() {
                continue;
            }
            let glob = Glob::new(pattern).map_err(|e| TaskError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.kind().to_string(),
            })?;
            builder.add(glob);
            count += 1;
        }

        let set = if count == 0 {
            None
        } else {
            Some(builder.build().map_err(|e| TaskError::InvalidPattern {
                pattern: e.glob().unwrap_or_default().to_string(),
                message: e.kind().to_string(),
            })?)
        };

        Ok(Self { set, target })
    }

    /// A set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            set: None,
            target: ExcludeMatch::FullPath,
        }
    }

    /// Split a comma separated pattern list, e.g. `"*.tmp, *.log"`.
    pub fn parse_list(list: &str) -> Vec<String> {
        list.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(String::from)
            .collect()
    }

    /// Check if no patterns were given.
    pub fn is_empty(&self) -> bool {
        self.set.is_none()
    }

    /// Check if `path` is excluded.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let Some(set) = &self.set else {
            return false;
        };

        match self.target {
            ExcludeMatch::FullPath => set.is_match(path),
            ExcludeMatch::Name => path.file_name().is_some_and(|name| set.is_match(name)),
        }
    }
}

impl Default for ExcludeSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclude_by_extension() {
        let set = ExcludeSet::new(&["*.tmp"], ExcludeMatch::FullPath).unwrap();
        assert!(set.is_excluded(Path::new("/work/a.tmp")));
        assert!(!set.is_excluded(Path::new("/work/a.txt")));

        let set = ExcludeSet::new(&["*.tmp"], ExcludeMatch::Name).unwrap();
        assert!(set.is_excluded(Path::new("/work/a.tmp")));
    }

    #[test]
    fn test_name_vs_full_path() {
        let by_name = ExcludeSet::new(&["build"], ExcludeMatch::Name).unwrap();
        assert!(by_name.is_excluded(Path::new("/repo/build")));

        let by_path = ExcludeSet::new(&["build"], ExcludeMatch::FullPath).unwrap();
        assert!(!by_path.is_excluded(Path::new("/repo/build")));
    }

    #[test]
    fn test_empty_and_blank_patterns() {
        let set = ExcludeSet::new(&["", "  "], ExcludeMatch::Name).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_excluded(Path::new("/anything")));
    }

    #[test]
    fn test_invalid_pattern() {
        let err = ExcludeSet::new(&["a[b"], ExcludeMatch::Name).unwrap_err();
        assert!(matches!(err, TaskError::InvalidPattern { .. }));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ExcludeSet::parse_list("*.tmp, *.log,,"),
            vec!["*.tmp".to_string(), "*.log".to_string()]
        );
    }
}
