//! Engine configuration types.

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Which part of a path exclude patterns are matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExcludeMatch {
    /// Match against the entry's file name only.
    Name,
    /// Match against the entry's full path.
    #[default]
    FullPath,
}

/// What copy/move do when the destination already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Leave the target alone and report an item error.
    #[default]
    Fail,
    /// Remove the existing target first.
    Overwrite,
    /// Write to "name (1).ext", "name (2).ext", ...
    AutoRename,
    /// Leave the target alone without reporting an error.
    Skip,
}

/// Configuration shared by all tasks started from one engine.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum similarity for a fuzzy search candidate.
    #[builder(default = "0.6")]
    pub fuzzy_threshold: f64,

    /// Walker threads (1 = serial, 0 = shared rayon pool).
    #[builder(default = "1")]
    pub walk_threads: usize,

    /// Include hidden files (starting with .).
    #[builder(default = "true")]
    pub include_hidden: bool,

    /// Follow symbolic links while walking.
    #[builder(default = "false")]
    pub follow_symlinks: bool,

    /// Target of exclude patterns.
    #[builder(default)]
    pub exclude_match: ExcludeMatch,

    /// Preserve permissions and timestamps when copying.
    #[builder(default = "true")]
    pub preserve_metadata: bool,

    /// Move deleted items to the trash instead of unlinking them.
    #[builder(default = "false")]
    pub use_trash: bool,

    /// Collision handling for copy and move.
    #[builder(default)]
    pub conflict_policy: ConflictPolicy,
}

impl EngineConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(threshold) = self.fuzzy_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(format!(
                    "fuzzy_threshold must be between 0.0 and 1.0, got {threshold}"
                ));
            }
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Create a new engine config builder.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Check a config that did not come through the builder (e.g. from TOML).
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(format!(
                "fuzzy_threshold must be between 0.0 and 1.0, got {}",
                self.fuzzy_threshold
            ));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: 0.6,
            walk_threads: 1,
            include_hidden: true,
            follow_symlinks: false,
            exclude_match: ExcludeMatch::FullPath,
            preserve_metadata: true,
            use_trash: false,
            conflict_policy: ConflictPolicy::Fail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .fuzzy_threshold(0.75)
            .walk_threads(4usize)
            .conflict_policy(ConflictPolicy::AutoRename)
            .build()
            .unwrap();

        assert_eq!(config.fuzzy_threshold, 0.75);
        assert_eq!(config.walk_threads, 4);
        assert_eq!(config.conflict_policy, ConflictPolicy::AutoRename);
        assert!(config.include_hidden);
    }

    #[test]
    fn test_config_builder_rejects_threshold() {
        let result = EngineConfig::builder().fuzzy_threshold(1.5).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_default() {
        let config = EngineConfig::default();
        assert_eq!(config.fuzzy_threshold, 0.6);
        assert_eq!(config.walk_threads, 1);
        assert_eq!(config.exclude_match, ExcludeMatch::FullPath);
        assert_eq!(config.conflict_policy, ConflictPolicy::Fail);
        assert!(config.validate().is_ok());
    }
}
