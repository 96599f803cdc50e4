use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::archiver::{Archiver, TarGzArchiver};
use crate::error::{Error, Result};

/// Container and compression scheme of an archive stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// gzip-compressed tar.
    #[default]
    TarGz,
}

impl FromStr for ArchiveFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tar.gz" | "tgz" => Ok(Self::TarGz),
            other => Err(Error::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TarGz => f.write_str("tar.gz"),
        }
    }
}

/// Validated gzip compression level.
///
/// `-1` selects the gzip default (6), `0` stores without compressing, `1`
/// is fastest and `9` produces the smallest output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionLevel(i32);

impl CompressionLevel {
    pub const DEFAULT: Self = Self(-1);
    pub const NONE: Self = Self(0);
    pub const FASTEST: Self = Self(1);
    pub const BEST: Self = Self(9);

    pub fn new(level: i32) -> Result<Self> {
        match level {
            -1..=9 => Ok(Self(level)),
            _ => Err(Error::InvalidCompressionLevel { level }),
        }
    }

    pub fn get(self) -> i32 {
        self.0
    }

    pub(crate) fn to_flate2(self) -> flate2::Compression {
        match u32::try_from(self.0) {
            Ok(level) => flate2::Compression::new(level),
            Err(_) => flate2::Compression::default(),
        }
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for CompressionLevel {
    type Error = Error;

    fn try_from(level: i32) -> Result<Self> {
        Self::new(level)
    }
}

/// Unvalidated archiver settings; checked by [`new_archiver`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArchiveOptions {
    pub compression_level: i32,
    /// For a file source, store its full path instead of its base name.
    /// Directory sources always keep their own name.
    pub preserve_path: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            compression_level: CompressionLevel::DEFAULT.get(),
            preserve_path: false,
        }
    }
}

impl ArchiveOptions {
    pub fn compression_level(mut self, level: i32) -> Self {
        self.compression_level = level;
        self
    }

    pub fn preserve_path(mut self, preserve: bool) -> Self {
        self.preserve_path = preserve;
        self
    }
}

/// Build an archiver for `format`.
///
/// # Errors
/// [`Error::UnsupportedFormat`] for anything but `tar.gz`, and
/// [`Error::InvalidCompressionLevel`] for a level outside `-1..=9`.
pub fn new_archiver(format: &str, options: ArchiveOptions) -> Result<Box<dyn Archiver + Send + Sync>> {
    match format.parse::<ArchiveFormat>()? {
        ArchiveFormat::TarGz => Ok(Box::new(TarGzArchiver::new(options)?)),
    }
}

/// Deserializable archiver configuration, as handed over by the embedding
/// tool after it has merged flags, environment and config files.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ArchiverConfig {
    pub format: String,
    pub compression_level: i32,
    pub preserve_path: bool,
}

impl Default for ArchiverConfig {
    fn default() -> Self {
        Self {
            format: ArchiveFormat::default().to_string(),
            compression_level: CompressionLevel::DEFAULT.get(),
            preserve_path: false,
        }
    }
}

impl ArchiverConfig {
    pub fn options(&self) -> ArchiveOptions {
        ArchiveOptions::default()
            .compression_level(self.compression_level)
            .preserve_path(self.preserve_path)
    }

    pub fn build(&self) -> Result<Box<dyn Archiver + Send + Sync>> {
        new_archiver(&self.format, self.options())
    }
}
