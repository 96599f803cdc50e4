use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive format: {format} (supported formats: 'tar.gz')")]
    UnsupportedFormat { format: String },

    #[error("invalid compression level {level}: expected -1 (default) or 0 through 9")]
    InvalidCompressionLevel { level: i32 },

    #[error("failed to walk source '{path}': {source}")]
    SourceNotFound { path: PathBuf, source: io::Error },

    #[error("failed to resolve path '{path}': {source}")]
    PathResolution { path: PathBuf, source: io::Error },

    #[error("absolute paths are not allowed: '{entry}'")]
    AbsolutePath { entry: PathBuf },

    #[error("absolute symlinks are not supported: '{link}' -> '{target}'")]
    AbsoluteSymlink { link: PathBuf, target: PathBuf },

    #[error("path traversal detected: '{entry}' resolves to '{resolved}'")]
    TraversalAttempt { entry: PathBuf, resolved: PathBuf },

    #[error("symlink target escapes destination: '{link}' -> '{target}' (resolves to '{resolved}')")]
    SymlinkEscape {
        link: PathBuf,
        target: PathBuf,
        resolved: PathBuf,
    },

    #[error("circular symlink reference detected: '{link}' -> '{target}'")]
    CircularSymlink { link: PathBuf, target: PathBuf },

    #[error("symlink chain too deep (max {max}): '{link}'")]
    ChainTooDeep { link: PathBuf, max: usize },

    #[error("hard link target escapes destination: '{link}' -> '{target}'")]
    HardLinkEscape { link: PathBuf, target: PathBuf },

    #[error("file conflict detected: '{path}' already exists")]
    FileConflict { path: PathBuf },

    #[error("unsupported entry type {kind} for '{entry}'")]
    UnsupportedEntryKind { entry: PathBuf, kind: u8 },

    #[error("archive stream error: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Fs(#[from] cachepack_fs::Error),

    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the archive content itself was rejected as unsafe, as opposed
    /// to an I/O failure or a bad configuration.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::AbsolutePath { .. }
                | Self::AbsoluteSymlink { .. }
                | Self::TraversalAttempt { .. }
                | Self::SymlinkEscape { .. }
                | Self::CircularSymlink { .. }
                | Self::ChainTooDeep { .. }
                | Self::HardLinkEscape { .. }
                | Self::FileConflict { .. }
                | Self::UnsupportedEntryKind { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
