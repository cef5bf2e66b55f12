//! Sliding-window reader for large files.
//!
//! The file is consumed in chunks while a bounded window of bytes stays
//! in memory. Between iterations the window retains an overlap of at
//! least `max_pattern_length + slack` bytes, snapped back to a line
//! start, so no match short enough to fit the overlap can straddle a
//! boundary undetected.
//!
//! Duplicate suppression is byte-based: [`ProcessedRanges`] records the
//! file regions whose matches have been emitted, and a line is only fed
//! to the matcher when its first byte lies at or past the emission
//! floor. Window edges always sit on line boundaries (the unfinished
//! tail of a read stays in the window), so the floor test is exact.
//!
//! Line numbers stay globally consistent: a cumulative newline count
//! over retired bytes (via [`count_lines`]) anchors the numbering of
//! every window.

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::matcher::FileScanner;
use crate::scan::{count_lines, index_byte};
use crate::stats::{ProgressInfo, StatsCollector};
use std::fs::File;
use std::io::{self, Read};
use std::time::Instant;

/// Read granularity for filling the window.
const READ_STEP: usize = 64 * 1024;

/// File regions whose matches have already been emitted.
///
/// Ranges are appended in file order; the emission floor is the first
/// byte past the highest processed offset.
#[derive(Debug, Default)]
pub struct ProcessedRanges {
    ranges: Vec<(u64, u64)>,
}

impl ProcessedRanges {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `[start, end]` (inclusive) as processed.
    pub fn record(&mut self, start: u64, end: u64) {
        self.ranges.push((start, end));
    }

    /// First byte offset whose matches have not been emitted yet.
    #[must_use]
    pub fn emission_floor(&self) -> u64 {
        self.ranges.last().map_or(0, |&(_, end)| end + 1)
    }

    /// True when `offset` falls inside a processed region.
    #[must_use]
    pub fn contains(&self, offset: u64) -> bool {
        self.ranges
            .iter()
            .any(|&(start, end)| offset >= start && offset <= end)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

/// Scans `file` with the sliding window.
///
/// Progress callbacks fire once per chunk, monotone non-decreasing in
/// bytes processed, ending at exactly `file_len`.
///
/// # Errors
///
/// Propagates read errors; the worker absorbs them by skipping the file.
pub fn scan(
    mut file: File,
    file_len: u64,
    scanner: &mut FileScanner,
    config: &SearchConfig,
    cancel: &CancelToken,
    stats: &StatsCollector,
) -> io::Result<bool> {
    let overlap = config.effective_overlap();
    let started = Instant::now();

    let mut window: Vec<u8> = Vec::with_capacity(config.chunk_size.min(config.max_chunk_size));
    let mut read_buf = vec![0u8; READ_STEP];
    let mut window_start: u64 = 0;
    let mut retired_lines: u64 = 0;
    let mut processed = ProcessedRanges::new();
    let mut chunks_processed: u64 = 0;
    let mut eof = false;

    while !eof {
        if cancel.is_cancelled() {
            return Ok(false);
        }

        // Fill the window by roughly one chunk.
        let target = window.len().saturating_add(chunk_size(config));
        while window.len() < target {
            let step = READ_STEP.min(target - window.len());
            let n = file.read(&mut read_buf[..step])?;
            if n == 0 {
                eof = true;
                break;
            }
            window.extend_from_slice(&read_buf[..n]);
        }

        // Only complete lines are matched; the unfinished tail stays in
        // the window for the next iteration.
        let complete = if eof {
            window.len()
        } else {
            match last_newline(&window) {
                Some(pos) => pos + 1,
                None => continue, // no full line yet, keep reading
            }
        };

        let floor = processed.emission_floor();
        if complete > 0 {
            feed_window_lines(
                &window[..complete],
                window_start,
                retired_lines,
                floor,
                scanner,
                cancel,
            );
            processed.record(window_start, window_start + complete as u64 - 1);
            stats.add_bytes(processed.emission_floor() - floor);
        }

        chunks_processed += 1;
        let bytes_done = if eof {
            file_len
        } else {
            (window_start + complete as u64).min(file_len)
        };
        report_progress(
            config,
            bytes_done,
            file_len,
            started,
            chunks_processed,
            scanner.matches_found() as u64,
        );

        if scanner.at_limit() {
            return Ok(false);
        }
        if eof {
            break;
        }

        // Retire everything except the overlap tail, snapped back to a
        // line start so the window keeps beginning on a boundary.
        let desired = complete.saturating_sub(overlap);
        let cut = match last_newline(&window[..desired]) {
            Some(pos) => pos + 1,
            None => 0,
        };
        if cut > 0 {
            retired_lines += count_lines(&window[..cut]) as u64;
            window_start += cut as u64;
            window.drain(..cut);
        }
    }

    Ok(true)
}

/// Feeds the complete lines of the window, skipping lines that start
/// below the emission floor (their matches were already emitted by the
/// previous chunk).
fn feed_window_lines(
    window: &[u8],
    window_start: u64,
    retired_lines: u64,
    floor: u64,
    scanner: &mut FileScanner,
    cancel: &CancelToken,
) {
    let mut offset = 0usize;
    let mut line_index: u64 = 0;
    while offset < window.len() {
        let end = index_byte(&window[offset..], b'\n').map_or(window.len(), |p| offset + p);
        line_index += 1;
        let abs = window_start + offset as u64;
        if abs >= floor {
            scanner.feed(retired_lines + line_index, super::strip_cr(&window[offset..end]));
            if scanner.at_limit() {
                return;
            }
        }
        offset = end + 1;
        if line_index % super::CANCEL_CHECK_LINES == 0 && cancel.is_cancelled() {
            return;
        }
    }
}

fn last_newline(buf: &[u8]) -> Option<usize> {
    buf.iter().rposition(|&b| b == b'\n')
}

/// Chunk size for the next iteration. With adaptive resizing the target
/// is a quarter of available memory, clamped to the configured bounds;
/// under memory pressure it pins to the minimum.
fn chunk_size(config: &SearchConfig) -> usize {
    if !config.adaptive_resize {
        return config
            .chunk_size
            .clamp(config.min_chunk_size, config.max_chunk_size);
    }
    match available_memory() {
        Some(avail) if avail < config.memory_threshold_bytes => config.min_chunk_size,
        Some(avail) => {
            let target = (avail / 4).min(usize::MAX as u64) as usize;
            target.clamp(config.min_chunk_size, config.max_chunk_size)
        }
        None => config
            .chunk_size
            .clamp(config.min_chunk_size, config.max_chunk_size),
    }
}

/// Available system memory in bytes, when the platform exposes it.
#[cfg(target_os = "linux")]
fn available_memory() -> Option<u64> {
    let meminfo = std::fs::read_to_string("/proc/meminfo").ok()?;
    let line = meminfo
        .lines()
        .find(|line| line.starts_with("MemAvailable:"))?;
    let kb: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kb * 1024)
}

#[cfg(not(target_os = "linux"))]
fn available_memory() -> Option<u64> {
    None
}

fn report_progress(
    config: &SearchConfig,
    bytes_processed: u64,
    total_bytes: u64,
    started: Instant,
    chunks_processed: u64,
    matches_found: u64,
) {
    if config.on_progress.is_none() && config.on_progress_detailed.is_none() {
        return;
    }
    let info = ProgressInfo::new(
        bytes_processed,
        total_bytes,
        started,
        chunks_processed,
        matches_found,
    );
    if let Some(cb) = &config.on_progress {
        cb(info.bytes_processed, info.total_bytes, info.percent);
    }
    if let Some(cb) = &config.on_progress_detailed {
        cb(&info);
    }
}
