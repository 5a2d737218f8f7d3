//! Archive compression and extraction for fileworks.
//!
//! Formats are dispatched through a [`BackendRegistry`]: every format tag
//! maps to one [`ArchiveBackend`], and each tag has a fixed row in the
//! capability matrix ([`Capabilities`]) saying which [`ArchiveSpec`] options
//! it honors. Options a format cannot honor are dropped before the backend
//! runs, except a password, which is refused up front.
//!
//! Built-in backends:
//!
//! | backend | formats |
//! |---|---|
//! | [`ZipBackend`] | zip (AES-256 passwords, comment, append) |
//! | [`TarBackend`] | tar, tar.gz, tar.bz2, tar.xz, tar.lzma |
//! | [`StreamBackend`] | gz, bz2, xz holding one file |
//!
//! 7z, rar and iso are recognised but have no backend in this build.

mod backend;
mod capability;
mod codec;
mod engine;
mod format;
mod level;
mod members;
mod registry;
mod spec;

pub use backend::{
    ArchiveBackend, Completion, CompressJob, ExtractJob, StreamBackend, TarBackend, ZipBackend,
};
pub use capability::Capabilities;
pub use engine::{ArchiveEngine, PreparedCompress, PreparedExtract};
pub use format::{ArchiveFormat, single_stream_output_name, suggest_archive_name};
pub use level::CompressionLevel;
pub use members::{Member, plan_members};
pub use registry::{BackendRegistry, is_supported_archive};
pub use spec::{ArchiveSpec, ArchiveSpecBuilder, ExtractSpec, PathStorage};
