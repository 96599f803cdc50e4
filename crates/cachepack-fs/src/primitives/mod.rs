pub mod create;
pub mod hardlink;
pub mod remove;
pub mod symlink;
pub mod times;

pub use create::{create_dir_all_with_mode, create_exclusive};
pub use hardlink::hard_link;
pub use remove::remove_any;
pub use symlink::symlink;
pub use times::set_mtime;
