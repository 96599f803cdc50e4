//! Extraction of gzip-compressed tar streams.
//!
//! Every entry name is confined to the destination root before any handler
//! runs, first lexically and then through the symlinks already on disk, and
//! each handler re-checks whatever link target it is about to materialise.
//! Nothing is written outside the root.

use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tracing::{debug, trace};

use crate::archiver::TarGzArchiver;
use crate::cancel::CancelToken;
use crate::entry::{Entry, EntryKind};
use crate::error::{Error, Result};
use crate::sanitize::{clean, is_within, physical_path, sanitize_path};
use crate::session::SymlinkSession;

mod handlers;

/// Per-call extraction state.
pub(crate) struct Extraction {
    root: PathBuf,
    /// `root` with every symlink resolved.
    physical_root: PathBuf,
    symlinks: SymlinkSession,
    /// Directory mtimes, applied once no more children can arrive.
    dir_times: Vec<(PathBuf, u64)>,
}

impl Extraction {
    /// Resolve `destination` to an absolute root and create it.
    pub(crate) fn prepare(destination: &Path) -> Result<Self> {
        let absolute = std::path::absolute(destination).map_err(|e| Error::PathResolution {
            path: destination.to_path_buf(),
            source: e,
        })?;
        let root = clean(&absolute);
        cachepack_fs::create_dir_all_with_mode(&root, 0o755)?;
        let physical_root = std::fs::canonicalize(&root).map_err(|e| Error::PathResolution {
            path: root.clone(),
            source: e,
        })?;

        Ok(Self {
            root,
            physical_root,
            symlinks: SymlinkSession::new(),
            dir_times: Vec::new(),
        })
    }

    pub(crate) fn root(&self) -> &Path {
        &self.root
    }

    /// Fail unless `path`, followed through the symlinks already on disk,
    /// stays under the physical root.
    fn confine(&self, entry: &Entry, path: &Path) -> Result<()> {
        match physical_path(path)? {
            Some(real) if is_within(&real, &self.physical_root) => Ok(()),
            resolved => Err(Error::TraversalAttempt {
                entry: entry.name.clone(),
                resolved: resolved.unwrap_or_else(|| path.to_path_buf()),
            }),
        }
    }

    /// Confine `entry` and hand it to the handler for its kind.
    pub(crate) fn process(&mut self, entry: &Entry, content: &mut dyn Read) -> Result<()> {
        let target = sanitize_path(&entry.name, &self.root)?.resolved;

        // Handlers create parents and write through them.
        let parent = match target.parent() {
            Some(parent) if target != self.root => parent,
            _ => self.root.as_path(),
        };
        self.confine(entry, parent)?;

        match entry.kind {
            EntryKind::Directory => {
                // An existing directory (or link to one) is reused, not replaced.
                self.confine(entry, &target)?;
                handlers::directory(entry, &target)?;
                self.dir_times.push((target, entry.mtime));
                Ok(())
            }
            EntryKind::RegularFile => handlers::file(entry, &target, content),
            EntryKind::Symlink => handlers::symlink(
                entry,
                &target,
                &self.root,
                &self.physical_root,
                &mut self.symlinks,
            ),
            EntryKind::HardLink => {
                handlers::hard_link(entry, &target, &self.root, &self.physical_root)
            }
            EntryKind::Other(kind) => Err(Error::UnsupportedEntryKind {
                entry: entry.name.clone(),
                kind,
            }),
        }
    }

    /// Restore directory mtimes. Paths that a later entry replaced with
    /// something other than a directory are skipped.
    pub(crate) fn finish(self) -> Result<()> {
        for (path, mtime) in self.dir_times.iter().rev() {
            let is_dir = std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir());
            let confined = matches!(
                physical_path(path)?,
                Some(real) if is_within(&real, &self.physical_root)
            );
            if is_dir && confined {
                cachepack_fs::set_mtime(path, *mtime)?;
            }
        }
        Ok(())
    }
}

impl TarGzArchiver {
    /// Extract a gzip-compressed tar stream beneath `destination`.
    ///
    /// Stops at the first rejected or failing entry; whatever was extracted
    /// before it is left in place.
    pub fn unarchive_from<R: Read>(
        &self,
        cancel: &CancelToken,
        source: R,
        destination: impl AsRef<Path>,
    ) -> Result<()> {
        cancel.check()?;

        let mut extraction = Extraction::prepare(destination.as_ref())?;
        debug!(destination = %extraction.root().display(), "extracting");

        let mut archive = tar::Archive::new(GzDecoder::new(source));
        let mut count = 0usize;

        for item in archive.entries()? {
            cancel.check()?;

            let mut item = item?;
            let entry = Entry::from_tar(&item)?;
            extraction.process(&entry, &mut item)?;

            trace!(name = %entry.name.display(), kind = ?entry.kind, "extracted");
            count += 1;
        }

        let symlinks = extraction.symlinks.len();
        extraction.finish()?;

        debug!(entries = count, symlinks, "extraction complete");
        Ok(())
    }
}
