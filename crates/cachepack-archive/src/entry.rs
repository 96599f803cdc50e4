use std::borrow::Cow;
use std::fs::Metadata;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use tar::EntryType;

use crate::error::{Error, Result};
use crate::sanitize::clean;

/// One logical unit of an archive: a header plus, for regular files, content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entry {
    /// Stored relative name. Directories carry a trailing separator.
    pub name: PathBuf,
    pub kind: EntryKind,
    pub mode: u32,
    /// Seconds since the Unix epoch.
    pub mtime: u64,
    pub size: u64,
    /// Literal link text for symlinks; archive-relative path for hard links.
    pub link_target: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Directory,
    RegularFile,
    Symlink,
    HardLink,
    /// Anything else, carrying the raw type flag.
    Other(u8),
}

impl EntryKind {
    /// Map a tar type flag onto the kinds the extractor knows how to handle.
    ///
    /// Device nodes, FIFOs, contiguous and sparse files are all materialised
    /// as regular files.
    pub fn from_entry_type(entry_type: EntryType) -> Self {
        match entry_type {
            EntryType::Directory => Self::Directory,
            EntryType::Regular
            | EntryType::Continuous
            | EntryType::Char
            | EntryType::Block
            | EntryType::Fifo
            | EntryType::GNUSparse => Self::RegularFile,
            EntryType::Symlink => Self::Symlink,
            EntryType::Link => Self::HardLink,
            other => Self::Other(other.as_byte()),
        }
    }

    pub fn entry_type(self) -> EntryType {
        match self {
            Self::Directory => EntryType::Directory,
            Self::RegularFile => EntryType::Regular,
            Self::Symlink => EntryType::Symlink,
            Self::HardLink => EntryType::Link,
            Self::Other(byte) => EntryType::new(byte),
        }
    }
}

impl Entry {
    /// Build an entry for a live file-system object without following it.
    ///
    /// Returns `Ok(None)` for sockets, FIFOs and device nodes, which are
    /// not archived.
    pub fn from_metadata(path: &Path, metadata: &Metadata, name: PathBuf) -> Result<Option<Self>> {
        let file_type = metadata.file_type();
        let (kind, size, link_target) = if file_type.is_symlink() {
            let target = std::fs::read_link(path).map_err(|e| cachepack_fs::Error::Read {
                path: path.to_path_buf(),
                source: e,
            })?;
            (EntryKind::Symlink, 0, Some(target))
        } else if file_type.is_dir() {
            (EntryKind::Directory, 0, None)
        } else if file_type.is_file() {
            (EntryKind::RegularFile, metadata.len(), None)
        } else {
            return Ok(None);
        };

        Ok(Some(Self {
            name,
            kind,
            mode: mode_of(metadata),
            mtime: mtime_of(metadata),
            size,
            link_target,
        }))
    }

    /// Decode an entry read from a tar stream.
    pub fn from_tar<R: Read>(entry: &tar::Entry<'_, R>) -> Result<Self> {
        let header = entry.header();
        let kind = EntryKind::from_entry_type(header.entry_type());

        Ok(Self {
            name: entry.path()?.into_owned(),
            kind,
            mode: header.mode()?,
            mtime: header.mtime()?,
            size: entry.size(),
            link_target: entry.link_name()?.map(Cow::into_owned),
        })
    }

    /// Encode everything except the name and link target, which the tar
    /// builder writes itself so long paths get GNU extension records.
    pub fn to_header(&self) -> tar::Header {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(self.kind.entry_type());
        header.set_mode(self.mode);
        header.set_mtime(self.mtime);
        header.set_size(if self.kind == EntryKind::RegularFile { self.size } else { 0 });
        header
    }
}

#[cfg(unix)]
fn mode_of(metadata: &Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(metadata: &Metadata) -> u32 {
    match (metadata.is_dir(), metadata.permissions().readonly()) {
        (true, _) => 0o755,
        (false, true) => 0o444,
        (false, false) => 0o644,
    }
}

fn mtime_of(metadata: &Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

/// Stored-name policy for everything walked from one source path.
#[derive(Clone, Debug)]
pub struct Naming {
    source: PathBuf,
    policy: NamingPolicy,
}

#[derive(Clone, Debug)]
enum NamingPolicy {
    /// Names are relative to the directory's parent, so they start with the
    /// directory's own leaf name.
    Directory { leaf: Option<PathBuf> },
    /// The source path as given, minus any root.
    FullPath,
    BaseName,
}

impl Naming {
    /// # Errors
    /// [`Error::SourceNotFound`] if `source` does not exist.
    pub fn for_source(source: &Path, preserve_path: bool) -> Result<Self> {
        let not_found = |e| Error::SourceNotFound {
            path: source.to_path_buf(),
            source: e,
        };
        let metadata = std::fs::symlink_metadata(source).map_err(not_found)?;

        let policy = if metadata.is_dir() {
            let absolute = clean(&std::path::absolute(source).map_err(not_found)?);
            NamingPolicy::Directory {
                leaf: absolute.file_name().map(PathBuf::from),
            }
        } else if preserve_path {
            NamingPolicy::FullPath
        } else {
            NamingPolicy::BaseName
        };

        Ok(Self {
            source: source.to_path_buf(),
            policy,
        })
    }

    /// Stored name for `path`, a node visited while walking this source.
    /// Empty when nothing nameable is left (the walk root of `/`).
    pub fn stored_name(&self, path: &Path, is_dir: bool) -> PathBuf {
        let raw = match &self.policy {
            NamingPolicy::Directory { leaf } => {
                let relative = path.strip_prefix(&self.source).unwrap_or(path);
                match leaf {
                    Some(leaf) => leaf.join(relative),
                    None => relative.to_path_buf(),
                }
            }
            NamingPolicy::FullPath => self.source.clone(),
            NamingPolicy::BaseName => path.file_name().map(PathBuf::from).unwrap_or_default(),
        };

        let name: PathBuf = raw
            .components()
            .filter(|c| matches!(c, Component::Normal(_) | Component::ParentDir))
            .collect();

        if is_dir && !name.as_os_str().is_empty() {
            name.join("")
        } else {
            name
        }
    }
}
