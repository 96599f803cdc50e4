use std::io::{self, Read};
use std::path::Path;

use cachepack_fs::PermissionMode;

use crate::entry::Entry;
use crate::error::{Error, Result};
use crate::sanitize::{
    clean, is_within, physical_path, sanitize_hard_link_target, sanitize_symlink_target,
};
use crate::session::SymlinkSession;

const PARENT_MODE: u32 = 0o755;

fn ensure_parent(target: &Path) -> Result<()> {
    if let Some(parent) = target.parent() {
        cachepack_fs::create_dir_all_with_mode(parent, PARENT_MODE)?;
    }
    Ok(())
}

/// The mtime is left to the caller, since extracting children changes it.
pub(super) fn directory(entry: &Entry, target: &Path) -> Result<()> {
    cachepack_fs::create_dir_all_with_mode(target, entry.mode)?;
    Ok(())
}

/// Regular files never replace anything: an occupied target, including a
/// symlink planted by an earlier entry, is a conflict.
pub(super) fn file(entry: &Entry, target: &Path, content: &mut dyn Read) -> Result<()> {
    ensure_parent(target)?;

    match std::fs::symlink_metadata(target) {
        Ok(_) => {
            return Err(Error::FileConflict {
                path: target.to_path_buf(),
            });
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(cachepack_fs::Error::Read {
                path: target.to_path_buf(),
                source: e,
            }
            .into());
        }
    }

    {
        let mut file = cachepack_fs::create_exclusive(target, entry.mode)?;
        io::copy(&mut content.take(entry.size), &mut file)?;
    }

    PermissionMode::custom(entry.mode).apply_to_path(target)?;
    cachepack_fs::set_mtime(target, entry.mtime)?;
    Ok(())
}

/// Symlinks replace whatever occupies their path once the link text has been
/// proven to stay inside `root`, alone and through any chain of links
/// extracted earlier, and also from where the link physically lands.
pub(super) fn symlink(
    entry: &Entry,
    target: &Path,
    root: &Path,
    physical_root: &Path,
    session: &mut SymlinkSession,
) -> Result<()> {
    let link_text = entry.link_target.as_deref().unwrap_or(Path::new(""));
    let resolved = sanitize_symlink_target(link_text, target, root)?;

    if resolved == target {
        return Err(Error::CircularSymlink {
            link: target.to_path_buf(),
            target: link_text.to_path_buf(),
        });
    }

    session.check_chain(target, &resolved, root)?;

    let parent = target.parent().unwrap_or(root);
    let physical = physical_path(parent)?.map(|p| clean(&p.join(link_text)));
    match physical {
        Some(physical) if is_within(&physical, physical_root) => {}
        physical => {
            return Err(Error::SymlinkEscape {
                link: target.to_path_buf(),
                target: link_text.to_path_buf(),
                resolved: physical.unwrap_or(resolved),
            });
        }
    }

    ensure_parent(target)?;
    cachepack_fs::remove_any(target)?;
    cachepack_fs::symlink(link_text, target)?;

    session.record(target.to_path_buf(), link_text.to_path_buf());
    Ok(())
}

/// Hard link targets are relative to `root` and must already be extracted.
pub(super) fn hard_link(entry: &Entry, target: &Path, root: &Path, physical_root: &Path) -> Result<()> {
    let link_text = entry.link_target.as_deref().unwrap_or(Path::new(""));
    let resolved = sanitize_hard_link_target(link_text, target, root)?;

    let confined = physical_path(&resolved)?.is_some_and(|real| is_within(&real, physical_root));
    if !confined {
        return Err(Error::HardLinkEscape {
            link: target.to_path_buf(),
            target: link_text.to_path_buf(),
        });
    }

    ensure_parent(target)?;
    cachepack_fs::remove_any(target)?;
    cachepack_fs::hard_link(&resolved, target)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::EntryKind;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    fn physical_tempdir() -> (TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, root)
    }

    fn file_entry(name: &str, mode: u32, size: u64) -> Entry {
        Entry {
            name: PathBuf::from(name),
            kind: EntryKind::RegularFile,
            mode,
            mtime: 1_600_000_000,
            size,
            link_target: None,
        }
    }

    fn link_entry(name: &str, kind: EntryKind, link: &str) -> Entry {
        Entry {
            name: PathBuf::from(name),
            kind,
            mode: 0o777,
            mtime: 0,
            size: 0,
            link_target: Some(PathBuf::from(link)),
        }
    }

    #[test]
    fn file_copies_declared_size_only() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("sub/file.txt");
        let mut content: &[u8] = b"hello world";

        file(&file_entry("sub/file.txt", 0o644, 5), &target, &mut content).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn file_conflict_on_existing() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("file.txt");
        std::fs::write(&target, "original").unwrap();
        let mut content: &[u8] = b"new";

        let result = file(&file_entry("file.txt", 0o644, 3), &target, &mut content);
        assert!(matches!(result, Err(Error::FileConflict { .. })));
        assert_eq!(std::fs::read(&target).unwrap(), b"original");
    }

    #[cfg(unix)]
    #[test]
    fn file_conflict_on_dangling_symlink() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("planted");
        std::os::unix::fs::symlink("nowhere", &target).unwrap();
        let mut content: &[u8] = b"data";

        let result = file(&file_entry("planted", 0o644, 4), &target, &mut content);
        assert!(matches!(result, Err(Error::FileConflict { .. })));
        assert!(!dir.path().join("nowhere").exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_mode_ignores_umask() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let target = dir.path().join("shared");
        let mut content: &[u8] = b"";

        file(&file_entry("shared", 0o666, 0), &target, &mut content).unwrap();
        let mode = std::fs::metadata(&target).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o666);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_replaces_existing_file() {
        let (_dir, root) = physical_tempdir();
        let target = root.join("link");
        std::fs::write(&target, "planted").unwrap();
        std::fs::write(root.join("real"), "real").unwrap();
        let mut session = SymlinkSession::new();

        let entry = link_entry("link", EntryKind::Symlink, "real");
        symlink(&entry, &target, &root, &root, &mut session).unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"real");
        assert_eq!(session.target_of(&target), Some(Path::new("real")));
    }

    #[test]
    fn symlink_to_itself_rejected() {
        let (_dir, root) = physical_tempdir();
        let target = root.join("sub/self");
        let mut session = SymlinkSession::new();

        let entry = link_entry("sub/self", EntryKind::Symlink, "../sub/self");
        let result = symlink(&entry, &target, &root, &root, &mut session);
        assert!(matches!(result, Err(Error::CircularSymlink { .. })));
        assert!(session.is_empty());
    }

    #[test]
    fn rejected_symlink_leaves_no_trace() {
        let (_dir, base) = physical_tempdir();
        let root = base.join("dest");
        std::fs::create_dir_all(&root).unwrap();
        let target = root.join("nested/link");
        let mut session = SymlinkSession::new();

        let entry = link_entry("nested/link", EntryKind::Symlink, "../../outside");
        let result = symlink(&entry, &target, &root, &root, &mut session);
        assert!(matches!(result, Err(Error::SymlinkEscape { .. })));
        assert!(!root.join("nested").exists());
    }

    #[cfg(unix)]
    #[test]
    fn symlink_checked_from_physical_parent() {
        let (_dir, base) = physical_tempdir();
        let root = base.join("dest");
        std::fs::create_dir_all(&root).unwrap();
        std::os::unix::fs::symlink(".", root.join("l")).unwrap();
        let target = root.join("l/x");
        let mut session = SymlinkSession::new();

        let entry = link_entry("l/x", EntryKind::Symlink, "..");
        let result = symlink(&entry, &target, &root, &root, &mut session);
        assert!(matches!(result, Err(Error::SymlinkEscape { .. })));
        assert!(std::fs::symlink_metadata(root.join("x")).is_err());
    }

    #[test]
    fn hard_link_to_extracted_file() {
        let (_dir, root) = physical_tempdir();
        std::fs::create_dir_all(root.join("data")).unwrap();
        std::fs::write(root.join("data/original"), "shared").unwrap();
        let target = root.join("copies/link");

        let entry = link_entry("copies/link", EntryKind::HardLink, "data/original");
        hard_link(&entry, &target, &root, &root).unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"shared");
    }

    #[cfg(unix)]
    #[test]
    fn hard_link_through_outside_symlink_rejected() {
        let (_dir, base) = physical_tempdir();
        let root = base.join("dest");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::create_dir_all(base.join("outside")).unwrap();
        std::fs::write(base.join("outside/secret"), "secret").unwrap();
        std::os::unix::fs::symlink("../outside", root.join("x")).unwrap();
        let target = root.join("copy");

        let entry = link_entry("copy", EntryKind::HardLink, "x/secret");
        let result = hard_link(&entry, &target, &root, &root);
        assert!(matches!(result, Err(Error::HardLinkEscape { .. })));
        assert!(!target.exists());
    }

    #[test]
    fn hard_link_to_missing_file_is_io_error() {
        let (_dir, root) = physical_tempdir();
        let target = root.join("link");

        let entry = link_entry("link", EntryKind::HardLink, "missing");
        let result = hard_link(&entry, &target, &root, &root);
        assert!(matches!(result, Err(Error::Fs(_))));
    }
}
