//! Confined tar.gz archiving and extraction.
//!
//! # Architecture
//!
//! - `filter.rs` - Drop sources already covered by another source directory
//! - `walk.rs` / `archive.rs` - Deterministic tree walk into a gzip'd tar stream
//! - `entry.rs` - Header codec between file metadata and tar headers
//! - `sanitize.rs` - Path boundary guard (zip-slip prevention)
//! - `session.rs` - Per-extraction symlink chain validation
//! - `extract/` - Entry materialisation beneath the destination root
//! - `options.rs` - Format, compression level and configuration

mod archive;
mod archiver;
pub mod cancel;
pub mod entry;
mod error;
mod extract;
pub mod filter;
pub mod options;
pub mod sanitize;
pub mod session;
pub mod walk;

pub use archiver::{Archiver, TarGzArchiver};
pub use cancel::CancelToken;
pub use entry::{Entry, EntryKind};
pub use error::{Error, Result};
pub use filter::filter_redundant_paths;
pub use options::{ArchiveFormat, ArchiveOptions, ArchiverConfig, CompressionLevel, new_archiver};
pub use sanitize::{SanitizedPath, clean, is_within, sanitize_path};
pub use session::{MAX_SYMLINK_DEPTH, SymlinkSession};
