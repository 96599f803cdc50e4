use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to link '{link}' -> '{target}': {source}")]
    Link {
        target: PathBuf,
        link: PathBuf,
        source: io::Error,
    },

    #[error("failed to update metadata of '{path}': {source}")]
    Metadata { path: PathBuf, source: io::Error },
}

impl Error {
    /// The underlying I/O error.
    pub fn io(&self) -> &io::Error {
        match self {
            Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::Remove { source, .. }
            | Self::Link { source, .. }
            | Self::Metadata { source, .. } => source,
        }
    }

    pub fn kind(&self) -> io::ErrorKind {
        self.io().kind()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
