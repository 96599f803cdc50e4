use crate::{Error, Result};
use filetime::FileTime;
use std::path::Path;

/// Set the modification time of `path` to `secs` since the Unix epoch. The
/// access time is left untouched.
pub fn set_mtime(path: impl AsRef<Path>, secs: u64) -> Result<()> {
    let path = path.as_ref();
    let secs = i64::try_from(secs).unwrap_or(i64::MAX);

    filetime::set_file_mtime(path, FileTime::from_unix_time(secs, 0)).map_err(|e| {
        Error::Metadata {
            path: path.to_path_buf(),
            source: e,
        }
    })
}
