use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};

/// A node produced by [`TreeWalk`].
#[derive(Debug)]
pub struct Walked {
    pub path: PathBuf,
    /// `lstat` metadata; symlinks are reported as symlinks.
    pub metadata: Metadata,
}

/// Lazy pre-order walk of one source tree: a directory is yielded before its
/// children, and siblings in file-name order. Symlinks are never followed,
/// including a symlink passed as the root. Single pass.
pub struct TreeWalk {
    root: PathBuf,
    inner: walkdir::IntoIter,
}

impl TreeWalk {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let inner = WalkDir::new(&root)
            .follow_links(false)
            .follow_root_links(false)
            .sort_by_file_name()
            .into_iter();
        Self { root, inner }
    }

    fn walk_error(&self, err: walkdir::Error) -> Error {
        let path = err.path().unwrap_or(&self.root).to_path_buf();
        Error::SourceNotFound {
            path,
            source: io::Error::from(err),
        }
    }
}

impl Iterator for TreeWalk {
    type Item = Result<Walked>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(err) => return Some(Err(self.walk_error(err))),
        };

        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => return Some(Err(self.walk_error(err))),
        };

        Some(Ok(Walked {
            path: entry.into_path(),
            metadata,
        }))
    }
}
