use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::sanitize::{clean, is_within};

/// Recorded symlink hops after which a chain is rejected.
pub const MAX_SYMLINK_DEPTH: usize = 10;

/// Symlinks created by a single extraction, keyed by absolute link path and
/// holding the literal link text.
///
/// Owned by one extraction call and dropped with it.
#[derive(Debug, Default)]
pub struct SymlinkSession {
    links: HashMap<PathBuf, PathBuf>,
}

impl SymlinkSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, link: PathBuf, target: PathBuf) {
        self.links.insert(link, target);
    }

    pub fn target_of(&self, link: &Path) -> Option<&Path> {
        self.links.get(link).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Follow already-extracted symlinks starting at `resolved`, the target
    /// of the new symlink `link`.
    ///
    /// Every hop is resolved against its own parent directory and must stay
    /// under `root` and must not lead back to `link`.
    ///
    /// # Errors
    /// [`Error::SymlinkEscape`], [`Error::CircularSymlink`], or
    /// [`Error::ChainTooDeep`] once [`MAX_SYMLINK_DEPTH`] recorded hops have
    /// been followed.
    pub fn check_chain(&self, link: &Path, resolved: &Path, root: &Path) -> Result<()> {
        let mut current = resolved.to_path_buf();
        let mut depth = 0;

        loop {
            if depth >= MAX_SYMLINK_DEPTH {
                return Err(Error::ChainTooDeep {
                    link: link.to_path_buf(),
                    max: MAX_SYMLINK_DEPTH,
                });
            }

            let Some(raw) = self.target_of(&current) else {
                return Ok(());
            };

            let next = clean(&current.parent().unwrap_or(root).join(raw));
            if !is_within(&next, root) {
                return Err(Error::SymlinkEscape {
                    link: link.to_path_buf(),
                    target: raw.to_path_buf(),
                    resolved: next,
                });
            }

            if next == link {
                return Err(Error::CircularSymlink {
                    link: link.to_path_buf(),
                    target: raw.to_path_buf(),
                });
            }

            current = next;
            depth += 1;
        }
    }
}
