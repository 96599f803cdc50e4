use crate::{Error, Result};
use std::path::Path;

/// Permission bits restored onto an extracted file.
///
/// Unix applies the mode bits verbatim, bypassing the umask. Elsewhere the
/// only thing carried over is the read-only flag.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PermissionMode {
    /// Keep whatever the platform assigned at creation time.
    #[default]
    Inherit,

    /// Mode bits taken from an archive header.
    Custom(CustomPermissions),
}

/// Permission and special bits (`0o7777`) of a Unix mode; file-type bits are
/// masked off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CustomPermissions {
    pub unix_mode: u32,
}

impl CustomPermissions {
    pub fn from_unix_mode(mode: u32) -> Self {
        Self {
            unix_mode: mode & 0o7777,
        }
    }

    /// No write bit for anyone.
    pub fn is_readonly(self) -> bool {
        self.unix_mode & 0o222 == 0
    }
}

impl PermissionMode {
    pub fn custom(unix_mode: u32) -> Self {
        Self::Custom(CustomPermissions::from_unix_mode(unix_mode))
    }

    pub fn unix_mode(self) -> Option<u32> {
        match self {
            Self::Inherit => None,
            Self::Custom(custom) => Some(custom.unix_mode),
        }
    }

    /// Set the mode of an existing file or directory.
    ///
    /// # Errors
    /// [`Error::Metadata`] if `path` is missing or cannot be changed.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        let Self::Custom(custom) = self else {
            return Ok(());
        };
        let metadata_err = |e| Error::Metadata {
            path: path.to_path_buf(),
            source: e,
        };

        #[cfg(unix)]
        let permissions = {
            use std::os::unix::fs::PermissionsExt;
            std::fs::Permissions::from_mode(custom.unix_mode)
        };

        #[cfg(not(unix))]
        let permissions = {
            let mut permissions = std::fs::metadata(path).map_err(metadata_err)?.permissions();
            permissions.set_readonly(custom.is_readonly());
            permissions
        };

        std::fs::set_permissions(path, permissions).map_err(metadata_err)
    }
}

impl From<u32> for PermissionMode {
    fn from(mode: u32) -> Self {
        Self::custom(mode)
    }
}
