use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use tracing::{debug, trace, warn};

use crate::archiver::TarGzArchiver;
use crate::cancel::CancelToken;
use crate::entry::{Entry, EntryKind, Naming};
use crate::error::Result;
use crate::filter::filter_redundant_paths;
use crate::walk::TreeWalk;

impl TarGzArchiver {
    /// Archive `sources` into `sink` as a gzip-compressed tar stream.
    ///
    /// Sources nested inside another listed directory are archived once.
    /// On error the partially written stream is abandoned; the encoders are
    /// still closed on drop.
    pub fn archive_to<W: Write, P: AsRef<Path>>(
        &self,
        cancel: &CancelToken,
        sources: &[P],
        sink: W,
    ) -> Result<()> {
        cancel.check()?;

        let sources = filter_redundant_paths(sources)?;
        debug!(
            sources = sources.len(),
            level = self.compression.get(),
            preserve_path = self.preserve_path,
            "archiving"
        );

        let encoder = GzEncoder::new(sink, self.compression.to_flate2());
        let mut builder = tar::Builder::new(encoder);

        let mut entries = 0usize;
        for source in &sources {
            entries += self.archive_source(cancel, source, &mut builder)?;
            cancel.check()?;
        }

        builder.into_inner()?.finish()?;
        debug!(entries, "archive complete");
        Ok(())
    }

    fn archive_source<W: Write>(
        &self,
        cancel: &CancelToken,
        source: &Path,
        builder: &mut tar::Builder<W>,
    ) -> Result<usize> {
        let naming = Naming::for_source(source, self.preserve_path)?;
        let mut count = 0;

        for walked in TreeWalk::new(source) {
            let walked = walked?;
            cancel.check()?;

            let name = naming.stored_name(&walked.path, walked.metadata.is_dir());
            if name.as_os_str().is_empty() {
                continue;
            }

            let Some(entry) = Entry::from_metadata(&walked.path, &walked.metadata, name)? else {
                warn!(path = %walked.path.display(), "skipping unsupported file type");
                continue;
            };

            append_entry(builder, &entry, &walked.path)?;
            trace!(name = %entry.name.display(), kind = ?entry.kind, size = entry.size, "archived");
            count += 1;
        }

        Ok(count)
    }
}

fn append_entry<W: Write>(builder: &mut tar::Builder<W>, entry: &Entry, path: &Path) -> Result<()> {
    let mut header = entry.to_header();

    match (entry.kind, entry.link_target.as_deref()) {
        (EntryKind::Symlink, Some(target)) => {
            builder.append_link(&mut header, &entry.name, target)?;
        }
        (EntryKind::RegularFile, _) => {
            let file = File::open(path).map_err(|e| cachepack_fs::Error::Read {
                path: path.to_path_buf(),
                source: e,
            })?;

            // Never copy more than the header declares, even if the file grew.
            let mut content = file.take(entry.size);
            builder.append_data(&mut header, &entry.name, &mut content)?;

            if content.limit() > 0 {
                return Err(cachepack_fs::Error::Read {
                    path: path.to_path_buf(),
                    source: io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "file shrank while it was being archived",
                    ),
                }
                .into());
            }
        }
        _ => {
            builder.append_data(&mut header, &entry.name, io::empty())?;
        }
    }

    Ok(())
}
