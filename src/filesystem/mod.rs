// src/filesystem/mod.rs

//! Archive handling for downloaded AUR snapshots and pacman sync databases
//!
//! Snapshots are unpacked into the download target directory. Before anything
//! is written we check that neither `<stem>.tar.gz` nor `<stem>/` already
//! exist, unless the caller asked to overwrite.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Component, Path, PathBuf};
use tar::Archive;
use tracing::{debug, warn};
use xz2::read::XzDecoder;

/// Archive compression format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Xz,
    Zstd,
    None,
}

/// Recognized archive suffixes, longest first
const ARCHIVE_SUFFIXES: &[(&str, Compression)] = &[
    (".tar.gz", Compression::Gzip),
    (".tar.xz", Compression::Xz),
    (".tar.zst", Compression::Zstd),
    (".tgz", Compression::Gzip),
    (".tar", Compression::None),
];

impl Compression {
    /// Detect compression from the leading magic bytes
    pub fn detect(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1F, 0x8B]) {
            Compression::Gzip
        } else if magic.starts_with(&[0xFD, 0x37, 0x7A, 0x58, 0x5A, 0x00]) {
            Compression::Xz
        } else if magic.starts_with(&[0x28, 0xB5, 0x2F, 0xFD]) {
            Compression::Zstd
        } else {
            Compression::None
        }
    }

    /// The canonical file suffix for this format
    pub fn suffix(self) -> &'static str {
        match self {
            Compression::Gzip => ".tar.gz",
            Compression::Xz => ".tar.xz",
            Compression::Zstd => ".tar.zst",
            Compression::None => ".tar",
        }
    }

    /// Wrap a reader in the matching decoder
    pub fn decoder<'a, R: Read + 'a>(self, reader: R) -> Result<Box<dyn Read + 'a>> {
        let reader: Box<dyn Read + 'a> = match self {
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
            Compression::Xz => Box::new(XzDecoder::new(reader)),
            Compression::Zstd => {
                let decoder = zstd::Decoder::new(reader).map_err(|e| {
                    Error::Extraction(format!("Failed to create zstd decoder: {}", e))
                })?;
                Box::new(decoder)
            }
            Compression::None => Box::new(reader),
        };
        Ok(reader)
    }
}

/// Split an archive file name into its stem and compression
///
/// "foo.tar.gz" → ("foo", Gzip). Names without a known suffix are treated as
/// gzip tarballs, which is what the AUR serves.
pub fn archive_stem(file_name: &str) -> (String, Compression) {
    for (suffix, compression) in ARCHIVE_SUFFIXES {
        if let Some(stem) = file_name.strip_suffix(suffix) {
            return (stem.to_string(), *compression);
        }
    }
    (file_name.to_string(), Compression::Gzip)
}

/// Refuse to clobber an earlier download unless `overwrite` is set
pub fn check_targets(dest_dir: &Path, stem: &str, overwrite: bool) -> Result<()> {
    if overwrite {
        return Ok(());
    }

    let archive = dest_dir.join(format!("{}.tar.gz", stem));
    if archive.exists() {
        return Err(Error::TargetExists(archive));
    }

    let dir = dest_dir.join(stem);
    if dir.exists() {
        return Err(Error::TargetExists(dir));
    }

    Ok(())
}

/// Verify the download target directory is usable
pub fn ensure_target_dir(path: &Path) -> Result<PathBuf> {
    if !path.is_dir() {
        return Err(Error::TargetDir(path.to_path_buf()));
    }
    path.canonicalize()
        .map_err(|_| Error::TargetDir(path.to_path_buf()))
}

/// Open an archive file for reading entries
pub fn open_archive(path: &Path, compression: Compression) -> Result<Archive<Box<dyn Read>>> {
    let file = File::open(path)?;
    Ok(Archive::new(compression.decoder(file)?))
}

/// Unpack `archive_path` into `dest_dir`
///
/// Returns the top-level directory of the archive if it has one. Entries
/// that would land outside `dest_dir` are skipped.
pub fn extract_archive(
    archive_path: &Path,
    compression: Compression,
    dest_dir: &Path,
) -> Result<Option<String>> {
    debug!("Extracting {} into {}", archive_path.display(), dest_dir.display());

    let mut archive = open_archive(archive_path, compression)?;
    let mut root = None;
    let mut count = 0usize;

    let entries = archive
        .entries()
        .map_err(|e| Error::Extraction(format!("Failed to read archive: {}", e)))?;

    for entry in entries {
        let mut entry =
            entry.map_err(|e| Error::Extraction(format!("Failed to read entry: {}", e)))?;

        let path = entry
            .path()
            .map_err(|e| Error::Extraction(format!("Invalid path in archive: {}", e)))?
            .into_owned();

        if root.is_none() {
            root = top_level_name(&path);
        }

        let unpacked = entry
            .unpack_in(dest_dir)
            .map_err(|e| Error::Extraction(format!("Failed to unpack {}: {}", path.display(), e)))?;
        if !unpacked {
            warn!("Skipping archive entry outside target: {}", path.display());
            continue;
        }
        count += 1;
    }

    if count == 0 {
        return Err(Error::Extraction(format!(
            "{} contains no files",
            archive_path.display()
        )));
    }

    debug!("Extracted {} entries", count);
    Ok(root)
}

/// Read a whole (possibly compressed) file into memory, decompressing by magic
pub fn read_decompressed(path: &Path) -> Result<Vec<u8>> {
    let data = std::fs::read(path)?;
    let compression = Compression::detect(&data);
    debug!("Reading {} ({:?})", path.display(), compression);

    let mut decoder = compression.decoder(io::Cursor::new(data))?;
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(|e| Error::Parse(format!("Failed to decompress {}: {}", path.display(), e)))?;
    Ok(out)
}

fn top_level_name(path: &Path) -> Option<String> {
    match path.components().next()? {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}
