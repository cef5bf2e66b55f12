//! Memory-mapped reader for medium-large files.
//!
//! Maps the file read-only and runs the slice scanner over the mapping.
//! The map lives on the worker's stack and is dropped (unmapped) before
//! the file handle is released. Mapping failures are reported as I/O
//! errors; the worker falls back to the plain reader.

use crate::cancel::CancelToken;
use crate::matcher::FileScanner;
use crate::stats::StatsCollector;
use memmap2::Mmap;
use std::fs::File;
use std::io;

/// Scans `file` through a read-only memory map.
///
/// # Errors
///
/// Returns the underlying error when the mapping cannot be created; no
/// bytes have been consumed in that case.
pub fn scan(
    file: &File,
    scanner: &mut FileScanner,
    cancel: &CancelToken,
    stats: &StatsCollector,
) -> io::Result<bool> {
    // Safety: the map is read-only and private to this worker. A file
    // truncated concurrently can still fault; treated as acceptable for
    // a search tool reading regular files.
    let map = unsafe { Mmap::map(file)? };
    Ok(super::scan_slice(&map, scanner, cancel, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RegexCache;
    use crate::matcher::LineMatcher;
    use crate::pattern::analyze;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mmap_scan_matches() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "first line").unwrap();
        writeln!(tmp, "needle here").unwrap();
        writeln!(tmp, "last line").unwrap();
        tmp.flush().unwrap();

        let cache = RegexCache::new();
        let compiled = Arc::new(analyze("needle", false, &cache).unwrap());
        let mut scanner = FileScanner::new(
            LineMatcher::new(compiled),
            PathBuf::from(tmp.path()),
            0,
            0,
        );
        let cancel = CancelToken::new();
        let stats = StatsCollector::new();

        let file = File::open(tmp.path()).unwrap();
        assert!(scan(&file, &mut scanner, &cancel, &stats).unwrap());

        let matches = scanner.finish();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].line, 2);
        assert_eq!(matches[0].column, 1);
    }
}
