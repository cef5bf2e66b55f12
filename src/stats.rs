//! Atomic statistics counters and progress reporting.
//!
//! Counters are bumped with relaxed atomic additions from any worker
//! thread; the totals are eventually consistent and settle by the time
//! the facade snapshots them. Progress callbacks are only invoked by the
//! sliding-window reader, the one reader with a meaningful denominator.

use crate::results::SearchStats;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

/// Simple percent-level progress callback: `(bytes_processed, total_bytes, percent)`.
pub type ProgressFn = Arc<dyn Fn(u64, u64, f64) + Send + Sync>;

/// Detailed per-chunk progress callback.
pub type DetailedProgressFn = Arc<dyn Fn(&ProgressInfo) + Send + Sync>;

/// Snapshot handed to detailed progress callbacks after each chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressInfo {
    pub bytes_processed: u64,
    pub total_bytes: u64,
    pub percent: f64,
    /// Bytes per second since the file was opened.
    pub processing_rate: f64,
    /// Estimated seconds remaining at the current rate.
    pub eta_seconds: f64,
    pub elapsed: Duration,
    pub chunks_processed: u64,
    pub matches_found: u64,
}

/// Shared mutable counters for one search.
#[derive(Debug)]
pub struct StatsCollector {
    files_scanned: AtomicU64,
    files_skipped: AtomicU64,
    files_ignored: AtomicU64,
    bytes_scanned: AtomicU64,
    start_time: SystemTime,
    started: Instant,
}

impl StatsCollector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            files_scanned: AtomicU64::new(0),
            files_skipped: AtomicU64::new(0),
            files_ignored: AtomicU64::new(0),
            bytes_scanned: AtomicU64::new(0),
            start_time: SystemTime::now(),
            started: Instant::now(),
        }
    }

    pub fn add_scanned(&self) {
        self.files_scanned.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_ignored(&self) {
        self.files_ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes(&self, n: u64) {
        self.bytes_scanned.fetch_add(n, Ordering::Relaxed);
    }

    #[must_use]
    pub fn files_skipped(&self) -> u64 {
        self.files_skipped.load(Ordering::Relaxed)
    }

    /// Finalizes the counters into an owned `SearchStats`.
    ///
    /// `matches_found` is supplied by the caller so it always equals the
    /// length of the returned match list, including any truncation to
    /// `max_results`.
    #[must_use]
    pub fn finish(&self, matches_found: u64) -> SearchStats {
        SearchStats {
            files_scanned: self.files_scanned.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            files_ignored: self.files_ignored.load(Ordering::Relaxed),
            bytes_scanned: self.bytes_scanned.load(Ordering::Relaxed),
            matches_found,
            start_time: self.start_time,
            end_time: SystemTime::now(),
            duration: self.started.elapsed(),
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressInfo {
    /// Builds a progress snapshot for a file of `total_bytes`.
    #[must_use]
    pub fn new(
        bytes_processed: u64,
        total_bytes: u64,
        started: Instant,
        chunks_processed: u64,
        matches_found: u64,
    ) -> Self {
        let elapsed = started.elapsed();
        let secs = elapsed.as_secs_f64();
        let processing_rate = if secs > 0.0 {
            bytes_processed as f64 / secs
        } else {
            0.0
        };
        let remaining = total_bytes.saturating_sub(bytes_processed);
        let eta_seconds = if processing_rate > 0.0 {
            remaining as f64 / processing_rate
        } else {
            0.0
        };
        let percent = if total_bytes > 0 {
            bytes_processed as f64 * 100.0 / total_bytes as f64
        } else {
            100.0
        };
        Self {
            bytes_processed,
            total_bytes,
            percent,
            processing_rate,
            eta_seconds,
            elapsed,
            chunks_processed,
            matches_found,
        }
    }
}
