//! File-system primitives used when materialising archive entries.
//!
//! Every function here operates on exactly the path it is given. Callers are
//! responsible for confining those paths; nothing in this crate resolves or
//! validates them.

mod error;
pub mod permissions;
pub mod primitives;

pub use error::{Error, Result};
pub use permissions::{CustomPermissions, PermissionMode};
pub use primitives::{
    create_dir_all_with_mode, create_exclusive, hard_link, remove_any, set_mtime, symlink,
};
