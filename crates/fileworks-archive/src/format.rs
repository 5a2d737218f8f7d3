//! Archive format tags and detection by file name.

use std::path::{Path, PathBuf};

use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::capability::Capabilities;

/// A container or stream format the engine knows about.
///
/// Knowing a format does not mean it can be used: 7z, rar and iso have no
/// backend in this build and fail with a "not supported in this build"
/// error when dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ArchiveFormat {
    #[strum(to_string = "zip")]
    Zip,
    #[strum(to_string = "tar")]
    Tar,
    #[strum(to_string = "tar.gz", serialize = "tgz")]
    TarGz,
    #[strum(to_string = "tar.bz2", serialize = "tbz2", serialize = "tbz")]
    TarBz2,
    #[strum(to_string = "tar.xz", serialize = "txz")]
    TarXz,
    #[strum(to_string = "tar.lzma", serialize = "tlz")]
    TarLzma,
    #[strum(to_string = "gz", serialize = "gzip")]
    Gz,
    #[strum(to_string = "bz2", serialize = "bzip2")]
    Bz2,
    #[strum(to_string = "xz")]
    Xz,
    #[strum(to_string = "7z")]
    SevenZ,
    #[strum(to_string = "rar")]
    Rar,
    #[strum(to_string = "iso")]
    Iso,
}

/// File name suffixes, longest first so compound suffixes win.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.lzma", ArchiveFormat::TarLzma),
    (".tar.bz2", ArchiveFormat::TarBz2),
    (".tar.gz", ArchiveFormat::TarGz),
    (".tar.xz", ArchiveFormat::TarXz),
    (".tbz2", ArchiveFormat::TarBz2),
    (".tbz", ArchiveFormat::TarBz2),
    (".tgz", ArchiveFormat::TarGz),
    (".txz", ArchiveFormat::TarXz),
    (".tlz", ArchiveFormat::TarLzma),
    (".zip", ArchiveFormat::Zip),
    (".tar", ArchiveFormat::Tar),
    (".bz2", ArchiveFormat::Bz2),
    (".gz", ArchiveFormat::Gz),
    (".xz", ArchiveFormat::Xz),
    (".7z", ArchiveFormat::SevenZ),
    (".rar", ArchiveFormat::Rar),
    (".iso", ArchiveFormat::Iso),
];

impl ArchiveFormat {
    /// Detect the format from a file name, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.len() > suffix.len() && name.ends_with(suffix))
            .map(|(_, format)| *format)
    }

    /// Canonical tag, also used as the file extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarXz => "tar.xz",
            Self::TarLzma => "tar.lzma",
            Self::Gz => "gz",
            Self::Bz2 => "bz2",
            Self::Xz => "xz",
            Self::SevenZ => "7z",
            Self::Rar => "rar",
            Self::Iso => "iso",
        }
    }

    /// Raw compressed stream holding exactly one file.
    pub fn is_single_stream(&self) -> bool {
        matches!(self, Self::Gz | Self::Bz2 | Self::Xz)
    }

    /// A tar container, compressed or not.
    pub fn is_tar(&self) -> bool {
        matches!(
            self,
            Self::Tar | Self::TarGz | Self::TarBz2 | Self::TarXz | Self::TarLzma
        )
    }

    /// Which archive options this format honors.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities::of(*self)
    }

    /// Every known format, in declaration order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// Default archive file name for compressing `sources` as `format`:
/// `<basename>.<ext>` for a single source, `archive.<ext>` otherwise.
pub fn suggest_archive_name(sources: &[PathBuf], format: ArchiveFormat) -> String {
    let base = match sources {
        [single] => single
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "archive".to_string()),
        _ => "archive".to_string(),
    };
    format!("{}.{}", base, format.extension())
}

/// Output file name for a single-stream archive: the archive's name with
/// its compression suffix removed (`notes.txt.gz` -> `notes.txt`).
pub fn single_stream_output_name(archive: &Path) -> String {
    let name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let lower = name.to_lowercase();

    for suffix in [".gz", ".bz2", ".xz"] {
        if lower.len() > suffix.len() && lower.ends_with(suffix) {
            return name[..name.len() - suffix.len()].to_string();
        }
    }

    format!("{name}.out")
}
