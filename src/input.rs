//! Opening dump files, with decompression chosen by file extension.

use crate::progress::{ByteCounter, ProgressReader};
use anyhow::Context;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> std::io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            // Wikimedia dumps are often concatenated gzip members
            Compression::Gzip => Box::new(flate2::read::MultiGzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::MultiBzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new_multi_decoder(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// An opened dump: decompressed byte stream plus the raw byte counter
pub struct DumpInput {
    pub reader: Box<dyn Read>,
    pub file_size: u64,
    pub compression: Compression,
    pub bytes_read: ByteCounter,
}

/// Open `path` for streaming, reporting raw bytes read to `progress_fn`
pub fn open_dump(path: &Path, progress_fn: Option<Box<dyn Fn(u64)>>) -> anyhow::Result<DumpInput> {
    let file = File::open(path)
        .with_context(|| format!("failed to open input file {}", path.display()))?;
    let metadata = file
        .metadata()
        .with_context(|| format!("failed to read metadata of {}", path.display()))?;
    if metadata.is_dir() {
        anyhow::bail!("input path is a directory: {}", path.display());
    }
    let file_size = metadata.len();
    let compression = Compression::from_path(path);

    let mut counting = ProgressReader::new(file);
    if let Some(cb) = progress_fn {
        counting = counting.with_callback(cb);
    }
    let bytes_read = counting.counter();
    let reader = compression.wrap_reader(Box::new(counting))?;

    Ok(DumpInput {
        reader,
        file_size,
        compression,
        bytes_read,
    })
}
