use std::path::{Path, PathBuf};

use tracing::trace;

use crate::error::{Error, Result};
use crate::sanitize::clean;

struct Candidate<'a> {
    original: &'a Path,
    absolute: PathBuf,
    is_dir: bool,
}

/// Drop every source already covered by a directory elsewhere in the list.
///
/// Candidates are visited shortest absolute path first, so a directory is
/// always accepted before anything beneath it. Files and symlinks never cover
/// anything, since the walk does not descend into a symlinked directory.
/// The surviving paths are returned as the caller spelled them.
///
/// # Errors
/// [`Error::PathResolution`] if a path cannot be made absolute or stat'ed.
pub fn filter_redundant_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>> {
    if paths.len() <= 1 {
        return Ok(paths.iter().map(|p| p.as_ref().to_path_buf()).collect());
    }

    let mut candidates = paths
        .iter()
        .map(|p| resolve(p.as_ref()))
        .collect::<Result<Vec<_>>>()?;

    candidates.sort_by_key(|c| c.absolute.as_os_str().len());

    let mut kept: Vec<&Candidate<'_>> = Vec::with_capacity(candidates.len());
    for candidate in &candidates {
        let covered = kept
            .iter()
            .any(|k| k.is_dir && candidate.absolute.starts_with(&k.absolute));

        if covered {
            trace!(path = %candidate.original.display(), "dropping redundant source");
        } else {
            kept.push(candidate);
        }
    }

    Ok(kept.into_iter().map(|c| c.original.to_path_buf()).collect())
}

fn resolve(path: &Path) -> Result<Candidate<'_>> {
    let resolution_err = |source| Error::PathResolution {
        path: path.to_path_buf(),
        source,
    };

    let absolute = clean(&std::path::absolute(path).map_err(resolution_err)?);
    let metadata = std::fs::symlink_metadata(&absolute).map_err(resolution_err)?;

    Ok(Candidate {
        original: path,
        absolute,
        is_dir: metadata.is_dir(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sorted(mut paths: Vec<PathBuf>) -> Vec<PathBuf> {
        paths.sort();
        paths
    }

    #[test]
    fn drops_descendants_of_listed_directories() {
        let dir = tempdir().unwrap();
        let dir_a = dir.path().join("dirA");
        let dir_b = dir.path().join("dirB");
        let file_x = dir_a.join("fileX");
        std::fs::create_dir_all(&dir_a).unwrap();
        std::fs::create_dir_all(&dir_b).unwrap();
        std::fs::write(&file_x, "x").unwrap();

        let result = filter_redundant_paths(&[&dir_a, &file_x, &dir_b]).unwrap();
        assert_eq!(sorted(result), sorted(vec![dir_a, dir_b]));
    }

    #[test]
    fn keeps_sibling_sharing_name_prefix() {
        let dir = tempdir().unwrap();
        let short = dir.path().join("dir");
        let long = dir.path().join("directory");
        std::fs::create_dir_all(&short).unwrap();
        std::fs::create_dir_all(&long).unwrap();

        let result = filter_redundant_paths(&[&long, &short]).unwrap();
        assert_eq!(sorted(result), sorted(vec![short, long]));
    }

    #[test]
    fn files_do_not_cover_anything() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        let other = dir.path().join("file.bak");
        std::fs::write(&file, "a").unwrap();
        std::fs::write(&other, "b").unwrap();

        let result = filter_redundant_paths(&[&file, &other]).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn duplicate_directories_collapse() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir_all(&sub).unwrap();

        let result = filter_redundant_paths(&[&sub, &sub]).unwrap();
        assert_eq!(result, vec![sub]);
    }

    #[test]
    fn unnormalized_descendant_is_dropped() {
        let dir = tempdir().unwrap();
        let parent = dir.path().join("parent");
        std::fs::create_dir_all(parent.join("child")).unwrap();
        let roundabout = parent.join("child/../child");

        let result = filter_redundant_paths(&[&roundabout, &parent]).unwrap();
        assert_eq!(result, vec![parent]);
    }

    #[test]
    fn missing_path_fails() {
        let dir = tempdir().unwrap();
        let present = dir.path().join("present");
        std::fs::create_dir_all(&present).unwrap();

        let result = filter_redundant_paths(&[present, dir.path().join("missing")]);
        assert!(matches!(result, Err(Error::PathResolution { .. })));
    }

    #[test]
    fn single_path_is_returned_untouched() {
        let result = filter_redundant_paths(&["does/not/exist"]).unwrap();
        assert_eq!(result, vec![PathBuf::from("does/not/exist")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_covers_nothing() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("real");
        let alias = dir.path().join("alias");
        let file = alias.join("file.txt");
        std::fs::create_dir_all(&real).unwrap();
        std::fs::write(real.join("file.txt"), "x").unwrap();
        std::os::unix::fs::symlink(&real, &alias).unwrap();

        let result = filter_redundant_paths(&[&alias, &file]).unwrap();
        assert_eq!(sorted(result), sorted(vec![alias, file]));
    }
}
