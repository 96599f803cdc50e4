use crate::{Error, Result};
use std::fs::{DirBuilder, File, OpenOptions};
use std::path::Path;

/// Create `path` for writing, failing if anything already occupies it.
///
/// `create_new` maps to `O_CREAT | O_EXCL`, which also refuses to follow a
/// symlink (dangling or not) sitting at the final component.
pub fn create_exclusive(path: impl AsRef<Path>, mode: u32) -> Result<File> {
    let path = path.as_ref();
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Recursively create `path`; newly created directories receive `mode`
/// (subject to the process umask).
pub fn create_dir_all_with_mode(path: impl AsRef<Path>, mode: u32) -> Result<()> {
    let path = path.as_ref();
    let mut builder = DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(path).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })
}
