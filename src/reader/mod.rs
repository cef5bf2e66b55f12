//! File reader variants.
//!
//! Every variant turns a file into the same logical stream of
//! `(line_number, line_bytes)` pairs consumed by a
//! [`FileScanner`](crate::matcher::FileScanner), counts the bytes it
//! logically consumes, and checks cancellation at least every
//! [`CANCEL_CHECK_LINES`] lines or [`CANCEL_CHECK_BYTES`] of progress.
//!
//! Selection order per file: compressed inputs stream through a
//! decoder, large files are memory-mapped, files past the streaming
//! threshold use the sliding window, everything else takes the plain
//! buffered path.

pub mod compressed;
pub mod mmap;
pub mod streaming;

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::matcher::FileScanner;
use crate::scan::index_byte;
use crate::stats::StatsCollector;
use std::fs::File;
use std::io::{self, BufRead};
use std::path::Path;

pub use compressed::Codec;

/// Cancellation check cadence in lines.
pub const CANCEL_CHECK_LINES: u64 = 1000;
/// Cancellation check cadence in bytes.
pub const CANCEL_CHECK_BYTES: u64 = 64 * 1024;

/// The strategy a worker uses for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Plain,
    Mmap,
    Streaming,
    Compressed(Codec),
}

/// Applies the per-file selection policy.
///
/// Reads the leading magic bytes from `file` (and rewinds) to recognize
/// compressed inputs independent of their extension.
pub fn select_reader(
    path: &Path,
    file: &mut File,
    file_len: u64,
    config: &SearchConfig,
) -> io::Result<ReaderKind> {
    if let Some(codec) = compressed::detect(path, file)? {
        return Ok(ReaderKind::Compressed(codec));
    }
    if config.use_mmap && file_len >= config.mmap_min_bytes {
        return Ok(ReaderKind::Mmap);
    }
    if config.streaming_enabled && file_len >= config.streaming_threshold_bytes {
        return Ok(ReaderKind::Streaming);
    }
    Ok(ReaderKind::Plain)
}

/// Drops a trailing carriage return so CRLF input matches like LF input.
#[inline]
pub(crate) fn strip_cr(line: &[u8]) -> &[u8] {
    match line.split_last() {
        Some((b'\r', rest)) => rest,
        _ => line,
    }
}

/// Line loop over any buffered reader.
///
/// Returns false when the scan stopped early (cancellation or the
/// scanner's match limit); the caller treats both as a clean stop.
pub fn scan_plain(
    mut reader: impl BufRead,
    scanner: &mut FileScanner,
    cancel: &CancelToken,
    stats: &StatsCollector,
) -> io::Result<bool> {
    let mut buf: Vec<u8> = Vec::with_capacity(256);
    let mut line_number: u64 = 0;
    let mut lines_since_check: u64 = 0;
    let mut bytes_since_check: u64 = 0;

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(true);
        }
        stats.add_bytes(n as u64);
        line_number += 1;

        let mut line = buf.as_slice();
        if line.last() == Some(&b'\n') {
            line = &line[..line.len() - 1];
        }
        scanner.feed(line_number, strip_cr(line));
        if scanner.at_limit() {
            return Ok(false);
        }

        lines_since_check += 1;
        bytes_since_check += n as u64;
        if lines_since_check >= CANCEL_CHECK_LINES || bytes_since_check >= CANCEL_CHECK_BYTES {
            if cancel.is_cancelled() {
                return Ok(false);
            }
            lines_since_check = 0;
            bytes_since_check = 0;
        }
    }
}

/// Line loop over an in-memory slice (mmap regions, buffered
/// decompressed content).
pub fn scan_slice(
    data: &[u8],
    scanner: &mut FileScanner,
    cancel: &CancelToken,
    stats: &StatsCollector,
) -> bool {
    let mut offset = 0usize;
    let mut line_number: u64 = 0;
    let mut lines_since_check: u64 = 0;
    let mut bytes_since_check: u64 = 0;

    while offset < data.len() {
        let end = index_byte(&data[offset..], b'\n').map_or(data.len(), |p| offset + p);
        let consumed = end.saturating_sub(offset) + usize::from(end < data.len());
        stats.add_bytes(consumed as u64);
        line_number += 1;

        scanner.feed(line_number, strip_cr(&data[offset..end]));
        if scanner.at_limit() {
            return false;
        }
        offset = end + 1;

        lines_since_check += 1;
        bytes_since_check += consumed as u64;
        if lines_since_check >= CANCEL_CHECK_LINES || bytes_since_check >= CANCEL_CHECK_BYTES {
            if cancel.is_cancelled() {
                return false;
            }
            lines_since_check = 0;
            bytes_since_check = 0;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RegexCache;
    use crate::matcher::LineMatcher;
    use crate::pattern::analyze;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn scanner_for(pattern: &str) -> FileScanner {
        let cache = RegexCache::new();
        let compiled = Arc::new(analyze(pattern, false, &cache).unwrap());
        FileScanner::new(LineMatcher::new(compiled), PathBuf::from("mem.txt"), 0, 0)
    }

    #[test]
    fn test_scan_plain_lines_and_bytes() {
        let mut scanner = scanner_for("hello");
        let cancel = CancelToken::new();
        let stats = StatsCollector::new();
        let data = "hello\nworld\nhello again\n";
        let done = scan_plain(Cursor::new(data), &mut scanner, &cancel, &stats).unwrap();
        assert!(done);

        let matches = scanner.finish();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].line, 1);
        assert_eq!(matches[1].line, 3);
        assert_eq!(stats.finish(2).bytes_scanned, data.len() as u64);
    }

    #[test]
    fn test_scan_slice_equivalent_to_plain() {
        let data = b"alpha\nbeta hello\ngamma\nhello\n";
        let cancel = CancelToken::new();

        let mut s1 = scanner_for("hello");
        let stats1 = StatsCollector::new();
        scan_plain(Cursor::new(&data[..]), &mut s1, &cancel, &stats1).unwrap();

        let mut s2 = scanner_for("hello");
        let stats2 = StatsCollector::new();
        assert!(scan_slice(data, &mut s2, &cancel, &stats2));

        assert_eq!(s1.finish(), s2.finish());
        assert_eq!(
            stats1.finish(0).bytes_scanned,
            stats2.finish(0).bytes_scanned
        );
    }

    #[test]
    fn test_missing_trailing_newline() {
        let mut scanner = scanner_for("end");
        let cancel = CancelToken::new();
        let stats = StatsCollector::new();
        scan_plain(Cursor::new("start\nend"), &mut scanner, &cancel, &stats).unwrap();
        let matches = scanner.finish();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 2);
        assert_eq!(matches[0].content, "end");
    }

    #[test]
    fn test_crlf_stripped() {
        let mut scanner = scanner_for("world");
        let cancel = CancelToken::new();
        let stats = StatsCollector::new();
        scan_plain(
            Cursor::new("hello\r\nworld\r\n"),
            &mut scanner,
            &cancel,
            &stats,
        )
        .unwrap();
        let matches = scanner.finish();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].content, "world");
    }
}
