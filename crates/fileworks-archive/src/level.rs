//! Compression levels and their backend-native values.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Requested compression effort.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CompressionLevel {
    /// No compression.
    Store,
    Fast,
    #[default]
    Normal,
    /// The backend's maximum.
    Best,
}

impl CompressionLevel {
    /// Generic 0-9 scale shared by deflate and xz presets.
    pub fn native(&self) -> u32 {
        match self {
            Self::Store => 0,
            Self::Fast => 1,
            Self::Normal => 6,
            Self::Best => 9,
        }
    }

    /// Deflate level for zip and gzip. `None` means stored.
    pub fn deflate(&self) -> Option<u32> {
        match self {
            Self::Store => None,
            other => Some(other.native()),
        }
    }

    /// Block size for bzip2, which has no store mode.
    pub fn bzip2(&self) -> u32 {
        self.native().max(1)
    }

    /// xz / lzma preset.
    pub fn xz_preset(&self) -> u32 {
        self.native()
    }
}
