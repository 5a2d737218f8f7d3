//! Static capability matrix: which archive options each format honors.

use fileworks_core::TaskError;

use crate::format::ArchiveFormat;
use crate::spec::ArchiveSpec;

/// Options a format can honor. Anything not honored is dropped before the
/// backend sees the spec, except a password, which is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub password: bool,
    pub split: bool,
    pub comment: bool,
    pub append: bool,
    pub encrypt_names: bool,
    pub compression_level: bool,
    /// Several sources and directories in one archive.
    pub multiple_members: bool,
}

impl Capabilities {
    /// The matrix row for `format`.
    pub const fn of(format: ArchiveFormat) -> Self {
        use ArchiveFormat::*;

        let container = Self {
            password: false,
            split: false,
            comment: false,
            append: false,
            encrypt_names: false,
            compression_level: true,
            multiple_members: true,
        };

        match format {
            Zip => Self {
                password: true,
                comment: true,
                append: true,
                ..container
            },
            Tar => Self {
                compression_level: false,
                ..container
            },
            TarGz | TarBz2 | TarXz | TarLzma => container,
            Gz | Bz2 | Xz => Self {
                multiple_members: false,
                ..container
            },
            SevenZ => Self {
                password: true,
                split: true,
                encrypt_names: true,
                ..container
            },
            Rar => Self {
                password: true,
                split: true,
                ..container
            },
            Iso => Self {
                password: true,
                compression_level: false,
                ..container
            },
        }
    }

    /// Check `spec` against this row and return the spec the backend should
    /// actually use.
    ///
    /// A password the format cannot honor is an error; every other
    /// unsupported field is cleared.
    pub fn apply(&self, spec: &ArchiveSpec) -> Result<ArchiveSpec, TaskError> {
        let mut effective = spec.clone();
        effective.password = spec.password.clone().filter(|p| !p.is_empty());

        if effective.password.is_some() && !self.password {
            return Err(TaskError::PasswordNotSupported {
                format: spec.format.to_string(),
            });
        }

        let format = spec.format;
        if effective.split_size_mb.is_some() && !self.split {
            tracing::debug!(%format, "split size not supported, ignoring");
            effective.split_size_mb = None;
        }
        if effective.comment.is_some() && !self.comment {
            tracing::debug!(%format, "archive comment not supported, ignoring");
            effective.comment = None;
        }
        if effective.append && !self.append {
            tracing::debug!(%format, "append not supported, creating a new archive");
            effective.append = false;
        }
        if effective.encrypt_names && !self.encrypt_names {
            tracing::debug!(%format, "name encryption not supported, ignoring");
            effective.encrypt_names = false;
        }

        Ok(effective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::CompressionLevel;
    use std::path::PathBuf;

    fn spec(format: ArchiveFormat) -> ArchiveSpec {
        ArchiveSpec::builder()
            .target(format!("/tmp/out.{}", format.extension()))
            .format(format)
            .sources(vec![PathBuf::from("/tmp/in")])
            .level(CompressionLevel::Best)
            .build()
            .unwrap()
    }

    #[test]
    fn test_password_formats() {
        let with_password: Vec<_> = ArchiveFormat::all()
            .filter(|f| f.capabilities().password)
            .collect();
        assert_eq!(
            with_password,
            vec![
                ArchiveFormat::Zip,
                ArchiveFormat::SevenZ,
                ArchiveFormat::Rar,
                ArchiveFormat::Iso
            ]
        );
    }

    #[test]
    fn test_password_rejected_for_tar() {
        let mut tar = spec(ArchiveFormat::Tar);
        tar.password = Some("secret".into());
        let err = tar.format.capabilities().apply(&tar).unwrap_err();
        assert!(matches!(err, TaskError::PasswordNotSupported { .. }));
    }

    #[test]
    fn test_empty_password_is_no_password() {
        let mut tar = spec(ArchiveFormat::Tar);
        tar.password = Some(String::new());
        let effective = tar.format.capabilities().apply(&tar).unwrap();
        assert!(effective.password.is_none());
    }

    #[test]
    fn test_unsupported_fields_are_dropped() {
        let mut gz = spec(ArchiveFormat::TarGz);
        gz.comment = Some("hello".into());
        gz.split_size_mb = Some(100);
        gz.append = true;
        gz.encrypt_names = true;

        let effective = gz.format.capabilities().apply(&gz).unwrap();
        assert_eq!(effective.comment, None);
        assert_eq!(effective.split_size_mb, None);
        assert!(!effective.append);
        assert!(!effective.encrypt_names);
        assert_eq!(effective.level, CompressionLevel::Best);
    }

    #[test]
    fn test_zip_keeps_comment_and_append() {
        let mut zip = spec(ArchiveFormat::Zip);
        zip.comment = Some("hello".into());
        zip.append = true;

        let effective = zip.format.capabilities().apply(&zip).unwrap();
        assert_eq!(effective.comment.as_deref(), Some("hello"));
        assert!(effective.append);
    }
}
