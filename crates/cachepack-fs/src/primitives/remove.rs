use crate::{Error, Result};
use std::fs;
use std::io;
use std::path::Path;

/// Remove whatever occupies `path`.
///
/// A symlink at `path` is removed itself, never the thing it points to. A
/// missing path is not an error.
pub fn remove_any(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => {
            return Err(Error::Read {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        remove_link_or_file(path, &metadata)
    };

    result.map_err(|e| Error::Remove {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(windows)]
fn remove_link_or_file(path: &Path, metadata: &fs::Metadata) -> io::Result<()> {
    use std::os::windows::fs::FileTypeExt;
    if metadata.file_type().is_symlink_dir() {
        fs::remove_dir(path)
    } else {
        fs::remove_file(path)
    }
}

#[cfg(not(windows))]
fn remove_link_or_file(path: &Path, _metadata: &fs::Metadata) -> io::Result<()> {
    fs::remove_file(path)
}
