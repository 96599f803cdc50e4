use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Result of confining an archive entry name to a destination root.
#[derive(Clone, Debug)]
pub struct SanitizedPath {
    pub original: PathBuf,
    pub resolved: PathBuf,
}

/// Lexically normalize a path.
///
/// `.` segments and repeated or trailing separators disappear, and `..`
/// consumes the preceding normal segment. A `..` that climbs above the start
/// of a relative path is kept, so the caller can still see that it escapes.
/// `..` directly under the root stays at the root. Never touches the file
/// system.
pub fn clean(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    parts.iter().collect()
}

/// Path Boundary Guard: is `path` equal to `root` or underneath it?
///
/// Both sides are cleaned first and compared component by component, so
/// `/data/dir` does not contain `/data/directory`. Empty inputs never match.
/// Symlinks are not resolved here.
pub fn is_within(path: impl AsRef<Path>, root: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    let root = root.as_ref();
    if path.as_os_str().is_empty() || root.as_os_str().is_empty() {
        return false;
    }

    clean(path).starts_with(clean(root))
}

/// True for names that are absolute on any platform: a leading `/` or `\`,
/// a drive letter (`C:`), or anything the host considers absolute.
pub(crate) fn looks_absolute(path: &Path) -> bool {
    if path.has_root() || path.is_absolute() {
        return true;
    }

    let raw = path.as_os_str().as_encoded_bytes();
    match raw {
        [b'/' | b'\\', ..] => true,
        [drive, b':', ..] => drive.is_ascii_alphabetic(),
        _ => false,
    }
}

/// Compute where an entry named `entry_path` lands under `root`.
///
/// Fails with [`Error::AbsolutePath`] for absolute or drive-letter names and
/// with [`Error::TraversalAttempt`] when the joined path leaves `root`.
pub fn sanitize_path(entry_path: impl AsRef<Path>, root: impl AsRef<Path>) -> Result<SanitizedPath> {
    let entry_path = entry_path.as_ref();
    let root = root.as_ref();
    let normalized = clean(entry_path);

    if looks_absolute(entry_path) || looks_absolute(&normalized) {
        return Err(Error::AbsolutePath {
            entry: entry_path.to_path_buf(),
        });
    }

    let resolved = clean(&root.join(normalized));
    if !is_within(&resolved, root) {
        return Err(Error::TraversalAttempt {
            entry: entry_path.to_path_buf(),
            resolved,
        });
    }

    Ok(SanitizedPath {
        original: entry_path.to_path_buf(),
        resolved,
    })
}

/// Resolve a symlink's literal target relative to the directory holding
/// `link` and make sure the result stays under `root`.
pub fn sanitize_symlink_target(
    target: impl AsRef<Path>,
    link: impl AsRef<Path>,
    root: impl AsRef<Path>,
) -> Result<PathBuf> {
    let target = target.as_ref();
    let link = link.as_ref();
    let root = root.as_ref();

    if looks_absolute(target) {
        return Err(Error::AbsoluteSymlink {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
        });
    }

    let base = link.parent().unwrap_or(root);
    let resolved = clean(&base.join(target));
    if !is_within(&resolved, root) {
        return Err(Error::SymlinkEscape {
            link: link.to_path_buf(),
            target: target.to_path_buf(),
            resolved,
        });
    }

    Ok(resolved)
}

/// Resolve a hard link's target, which is stored relative to the archive
/// root rather than to the link.
pub fn sanitize_hard_link_target(
    target: impl AsRef<Path>,
    link: impl AsRef<Path>,
    root: impl AsRef<Path>,
) -> Result<PathBuf> {
    let target = target.as_ref();
    let root = root.as_ref();

    let resolved = clean(&root.join(target));
    if !is_within(&resolved, root) {
        return Err(Error::HardLinkEscape {
            link: link.as_ref().to_path_buf(),
            target: target.to_path_buf(),
        });
    }

    Ok(resolved)
}

/// Where `path` actually lands on disk: the longest existing prefix is
/// resolved through the file system and the missing tail is appended as is.
///
/// `path` must be absolute and cleaned. Returns `None` when the existing
/// prefix ends in a dangling symlink, whose destination cannot be confined.
pub fn physical_path(path: &Path) -> Result<Option<PathBuf>> {
    let mut existing = path;
    let mut tail = Vec::new();

    loop {
        match std::fs::canonicalize(existing) {
            Ok(real) => {
                return Ok(Some(tail.iter().rev().fold(real, |acc, name| acc.join(name))));
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                if std::fs::symlink_metadata(existing).is_ok() {
                    return Ok(None);
                }
                let (Some(parent), Some(name)) = (existing.parent(), existing.file_name()) else {
                    return Ok(None);
                };
                tail.push(name);
                existing = parent;
            }
            Err(e) => {
                return Err(cachepack_fs::Error::Read {
                    path: existing.to_path_buf(),
                    source: e,
                }
                .into());
            }
        }
    }
}
