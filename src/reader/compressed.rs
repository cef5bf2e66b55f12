//! Gzip and bzip2 stream readers.
//!
//! Compressed inputs are recognized by magic bytes (preferred) or by
//! extension, then decoded and fed to the plain line loop. When context
//! lines are requested the whole logical content is buffered first: the
//! decoded stream is not seekable, and context needs the surrounding
//! lines to be addressable. `bytes_scanned` counts post-decompression
//! bytes either way.

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::matcher::FileScanner;
use crate::stats::StatsCollector;
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const BZIP2_MAGIC: [u8; 3] = [0x42, 0x5a, 0x68];

/// Supported compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    Gzip,
    Bzip2,
}

/// Recognizes a compressed file by magic bytes, falling back to the
/// extension. Rewinds `file` to the start before returning.
pub fn detect(path: &Path, file: &mut File) -> io::Result<Option<Codec>> {
    let mut magic = [0u8; 3];
    let mut read = 0;
    while read < magic.len() {
        let n = file.read(&mut magic[read..])?;
        if n == 0 {
            break;
        }
        read += n;
    }
    file.seek(SeekFrom::Start(0))?;

    if read >= 2 && magic[..2] == GZIP_MAGIC {
        return Ok(Some(Codec::Gzip));
    }
    if read >= 3 && magic == BZIP2_MAGIC {
        return Ok(Some(Codec::Bzip2));
    }
    Ok(by_extension(path))
}

fn by_extension(path: &Path) -> Option<Codec> {
    match path.extension()?.to_str()? {
        "gz" | "gzip" => Some(Codec::Gzip),
        "bz2" | "bzip2" => Some(Codec::Bzip2),
        _ => None,
    }
}

/// Scans a compressed file through the matching decoder.
///
/// # Errors
///
/// Propagates decoder and I/O errors; the worker absorbs them by
/// skipping the file.
pub fn scan(
    codec: Codec,
    file: File,
    scanner: &mut FileScanner,
    config: &SearchConfig,
    cancel: &CancelToken,
    stats: &StatsCollector,
) -> io::Result<bool> {
    let decoder: Box<dyn Read> = match codec {
        Codec::Gzip => Box::new(MultiGzDecoder::new(file)),
        Codec::Bzip2 => Box::new(BzDecoder::new(file)),
    };

    if config.context_lines > 0 {
        // Context needs random access; the stream is not seekable, so
        // buffer the entire logical content up front.
        let mut data = Vec::new();
        BufReader::with_capacity(config.buffer_size, decoder).read_to_end(&mut data)?;
        Ok(super::scan_slice(&data, scanner, cancel, stats))
    } else {
        super::scan_plain(
            BufReader::with_capacity(config.buffer_size, decoder),
            scanner,
            cancel,
            stats,
        )
    }
}
