use crate::{Error, Result};
use std::path::Path;

/// Create `link` as a hard link to the existing `target`.
pub fn hard_link(target: impl AsRef<Path>, link: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let link = link.as_ref();

    std::fs::hard_link(target, link).map_err(|e| Error::Link {
        target: target.to_path_buf(),
        link: link.to_path_buf(),
        source: e,
    })
}
