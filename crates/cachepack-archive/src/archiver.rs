use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use crate::cancel::CancelToken;
use crate::error::Result;
use crate::options::{ArchiveFormat, ArchiveOptions, CompressionLevel};

/// Packs source trees into an archive stream and unpacks streams onto disk.
///
/// Calls share no mutable state, so one archiver may serve concurrent calls
/// from several threads as long as their destinations differ.
pub trait Archiver {
    fn format(&self) -> ArchiveFormat;

    /// Write `sources` (files and/or directories) into `sink`.
    fn archive(&self, cancel: &CancelToken, sources: &[PathBuf], sink: &mut dyn Write) -> Result<()>;

    /// Extract `source` beneath `destination`, creating it if needed.
    ///
    /// Not transactional: on error, entries extracted so far stay on disk.
    fn unarchive(&self, cancel: &CancelToken, source: &mut dyn Read, destination: &Path) -> Result<()>;
}

/// gzip-compressed tar archiver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TarGzArchiver {
    pub(crate) compression: CompressionLevel,
    pub(crate) preserve_path: bool,
}

impl Default for TarGzArchiver {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::DEFAULT,
            preserve_path: false,
        }
    }
}

impl TarGzArchiver {
    pub fn new(options: ArchiveOptions) -> Result<Self> {
        Ok(Self {
            compression: CompressionLevel::new(options.compression_level)?,
            preserve_path: options.preserve_path,
        })
    }

    pub fn compression_level(&self) -> CompressionLevel {
        self.compression
    }

    pub fn preserves_path(&self) -> bool {
        self.preserve_path
    }
}

impl Archiver for TarGzArchiver {
    fn format(&self) -> ArchiveFormat {
        ArchiveFormat::TarGz
    }

    fn archive(&self, cancel: &CancelToken, sources: &[PathBuf], sink: &mut dyn Write) -> Result<()> {
        self.archive_to(cancel, sources, sink)
    }

    fn unarchive(&self, cancel: &CancelToken, source: &mut dyn Read, destination: &Path) -> Result<()> {
        self.unarchive_from(cancel, source, destination)
    }
}
