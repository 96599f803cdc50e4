use crate::{Error, Result};
use std::path::Path;

/// Create a symlink at `link` whose literal content is `target`.
///
/// `target` is stored verbatim; it is interpreted relative to the directory
/// containing `link` when the link is followed.
pub fn symlink(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(target, link).map_err(|e| Error::Link {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            source: e,
        })
    }

    #[cfg(windows)]
    {
        let resolved = link.parent().map(|p| p.join(target));
        let result = if resolved.is_some_and(|p| p.is_dir()) {
            std::os::windows::fs::symlink_dir(target, link)
        } else {
            std::os::windows::fs::symlink_file(target, link)
        };
        result.map_err(|e| Error::Link {
            target: target.to_path_buf(),
            link: link.to_path_buf(),
            source: e,
        })
    }
}
