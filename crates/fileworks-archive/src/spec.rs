//! Compress and extract parameters.

use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::format::ArchiveFormat;
use crate::level::CompressionLevel;

/// How member names are derived from source paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStorage {
    /// Path relative to the common ancestor of all sources.
    #[default]
    Relative,
    /// File name only; folder structure is flattened.
    BasenameOnly,
}

/// Everything needed to write one archive.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ArchiveSpec {
    /// Archive file to write.
    pub target: PathBuf,

    /// Container format.
    pub format: ArchiveFormat,

    /// Files and folders to add.
    #[builder(default)]
    pub sources: Vec<PathBuf>,

    #[builder(default)]
    pub level: CompressionLevel,

    /// Encrypt members with this password.
    #[builder(default, setter(into, strip_option))]
    pub password: Option<String>,

    /// Volume size in MiB.
    #[builder(default, setter(into, strip_option))]
    pub split_size_mb: Option<u64>,

    /// Globs for entries to leave out.
    #[builder(default)]
    pub exclude_patterns: Vec<String>,

    /// Archive comment.
    #[builder(default, setter(into, strip_option))]
    pub comment: Option<String>,

    #[builder(default)]
    pub path_storage: PathStorage,

    /// Add to an existing archive instead of replacing it.
    #[builder(default)]
    pub append: bool,

    /// Hide member names behind the password too.
    #[builder(default)]
    pub encrypt_names: bool,
}

impl ArchiveSpecBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(Some(0)) = self.split_size_mb {
            return Err("split size must be at least 1 MiB".to_string());
        }
        Ok(())
    }
}

impl ArchiveSpec {
    /// Create a new archive spec builder.
    pub fn builder() -> ArchiveSpecBuilder {
        ArchiveSpecBuilder::default()
    }
}

/// Parameters of one extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractSpec {
    /// Archive to read.
    pub archive: PathBuf,
    /// Directory to unpack into. Extraction will not start without one.
    pub destination: Option<PathBuf>,
    /// Password for encrypted members. Empty means none.
    pub password: Option<String>,
    /// Format override; detected from the file name otherwise.
    pub format: Option<ArchiveFormat>,
}

impl ExtractSpec {
    /// Extract `archive` with format detection and no destination yet.
    pub fn new(archive: impl Into<PathBuf>) -> Self {
        Self {
            archive: archive.into(),
            ..Default::default()
        }
    }

    /// Set the destination directory.
    pub fn destination(mut self, destination: impl Into<PathBuf>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Force a format.
    pub fn format(mut self, format: ArchiveFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// The format to use: the override, or whatever the file name says.
    pub fn resolved_format(&self) -> Option<ArchiveFormat> {
        self.format.or_else(|| ArchiveFormat::from_path(&self.archive))
    }

    /// The password, with an empty answer meaning none.
    pub fn effective_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let spec = ArchiveSpec::builder()
            .target("/tmp/out.zip")
            .format(ArchiveFormat::Zip)
            .build()
            .unwrap();
        assert_eq!(spec.level, CompressionLevel::Normal);
        assert_eq!(spec.path_storage, PathStorage::Relative);
        assert!(spec.password.is_none());
        assert!(!spec.append);
    }

    #[test]
    fn test_builder_requires_format() {
        assert!(ArchiveSpec::builder().target("/tmp/out.zip").build().is_err());
    }

    #[test]
    fn test_builder_rejects_zero_split() {
        let result = ArchiveSpec::builder()
            .target("/tmp/out.7z")
            .format(ArchiveFormat::SevenZ)
            .split_size_mb(0u64)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_extract_spec() {
        let spec = ExtractSpec::new("/tmp/a.tar.gz").password("");
        assert_eq!(spec.resolved_format(), Some(ArchiveFormat::TarGz));
        assert_eq!(spec.effective_password(), None);
        assert!(spec.destination.is_none());

        let forced = ExtractSpec::new("/tmp/blob").format(ArchiveFormat::Zip);
        assert_eq!(forced.resolved_format(), Some(ArchiveFormat::Zip));
    }
}
