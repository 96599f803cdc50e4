#![allow(dead_code)]

use std::io::Write;
use std::path::Path;

use cachepack_archive::{CancelToken, TarGzArchiver};
use flate2::Compression;
use flate2::write::GzEncoder;
use tar::{EntryType, Header};

/// One raw tar record, written without any of the name checks the tar
/// builder applies.
pub struct RawEntry<'a> {
    pub name: &'a str,
    pub kind: EntryType,
    pub link: Option<&'a str>,
    pub content: &'a [u8],
    pub mode: u32,
}

impl<'a> RawEntry<'a> {
    pub fn dir(name: &'a str) -> Self {
        Self {
            name,
            kind: EntryType::Directory,
            link: None,
            content: b"",
            mode: 0o755,
        }
    }

    pub fn file(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            kind: EntryType::Regular,
            link: None,
            content,
            mode: 0o644,
        }
    }

    pub fn symlink(name: &'a str, target: &'a str) -> Self {
        Self {
            name,
            kind: EntryType::Symlink,
            link: Some(target),
            content: b"",
            mode: 0o777,
        }
    }

    pub fn hard_link(name: &'a str, target: &'a str) -> Self {
        Self {
            name,
            kind: EntryType::Link,
            link: Some(target),
            content: b"",
            mode: 0o644,
        }
    }

    pub fn other(name: &'a str, kind: u8) -> Self {
        Self {
            name,
            kind: EntryType::new(kind),
            link: None,
            content: b"",
            mode: 0o644,
        }
    }
}

fn copy_field(field: &mut [u8], value: &str) {
    let bytes = value.as_bytes();
    assert!(bytes.len() < field.len(), "name too long for a raw header: {value}");
    field[..bytes.len()].copy_from_slice(bytes);
}

/// Build a tar.gz stream from raw records, including ones a well-behaved
/// archiver would refuse to write.
pub fn hostile_archive(entries: &[RawEntry<'_>]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for entry in entries {
        let mut header = Header::new_gnu();
        copy_field(&mut header.as_old_mut().name, entry.name);
        if let Some(link) = entry.link {
            copy_field(&mut header.as_old_mut().linkname, link);
        }
        header.set_entry_type(entry.kind);
        header.set_mode(entry.mode);
        header.set_mtime(1_700_000_000);
        header.set_size(entry.content.len() as u64);
        header.set_cksum();
        builder.append(&header, entry.content).unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

pub fn archive_to_vec(archiver: &TarGzArchiver, sources: &[&Path]) -> Vec<u8> {
    let mut out = Vec::new();
    archiver
        .archive_to(&CancelToken::new(), sources, &mut out)
        .unwrap();
    out
}

pub fn write_file(path: &Path, content: impl AsRef<[u8]>) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    let mut file = std::fs::File::create(path).unwrap();
    file.write_all(content.as_ref()).unwrap();
}

/// Names of the entries in a tar.gz stream, in stream order.
pub fn entry_names(archive: &[u8]) -> Vec<String> {
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(archive));
    archive
        .entries()
        .unwrap()
        .map(|e| e.unwrap().path().unwrap().to_string_lossy().into_owned())
        .collect()
}
