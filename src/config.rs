//! Search configuration and validation.

use crate::cancel::CancelToken;
use crate::error::{Result, SearchError};
use crate::gitignore::Glob;
use crate::stats::{DetailedProgressFn, ProgressFn};
use std::fmt;
use std::time::Duration;

/// Extra overlap beyond `max_pattern_length` so a match can never
/// straddle a window boundary undetected.
pub const OVERLAP_SLACK: usize = 128;

/// Options accepted by [`crate::find`].
///
/// All fields have working defaults; construct with `SearchConfig::default()`
/// and override what the caller needs.
#[derive(Clone)]
pub struct SearchConfig {
    /// Descend into subdirectories.
    pub recursive: bool,
    pub case_insensitive: bool,
    /// Also consider dotfiles and skip-listed directories.
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// Honor `.gitignore` files discovered during the walk.
    pub use_gitignore: bool,
    /// Basename glob filter, e.g. `*.rs`.
    pub file_glob: Option<String>,
    /// Stop collecting once this many matches have landed.
    pub max_results: usize,
    /// Context lines captured either side of each match.
    pub context_lines: usize,
    /// Worker thread count.
    pub workers: usize,
    /// Buffered reader capacity per worker.
    pub buffer_size: usize,
    /// Per-search timeout; cancellation fires when it elapses.
    pub timeout: Option<Duration>,

    // Sliding-window reader knobs.
    pub streaming_enabled: bool,
    /// Files at least this large use the sliding-window reader.
    pub streaming_threshold_bytes: u64,
    pub chunk_size: usize,
    pub overlap_size: usize,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
    /// Re-derive the chunk size from free memory before each chunk.
    pub adaptive_resize: bool,
    /// Below this much available memory, chunks clamp to `min_chunk_size`.
    pub memory_threshold_bytes: u64,
    /// Upper bound assumed for a single match; feeds the overlap floor.
    pub max_pattern_length: usize,

    // Memory-mapped reader knobs.
    pub use_mmap: bool,
    /// Files at least this large are memory-mapped (when `use_mmap`).
    pub mmap_min_bytes: u64,

    /// Caller-provided cancellation token, shared with all tasks.
    pub cancel: Option<CancelToken>,
    /// Percent-level progress callback (sliding-window reader only).
    pub on_progress: Option<ProgressFn>,
    /// Detailed per-chunk progress callback (sliding-window reader only).
    pub on_progress_detailed: Option<DetailedProgressFn>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            recursive: false,
            case_insensitive: false,
            include_hidden: false,
            follow_symlinks: false,
            use_gitignore: true,
            file_glob: None,
            max_results: 1000,
            context_lines: 0,
            workers: 4,
            buffer_size: 64 * 1024,
            timeout: None,
            streaming_enabled: true,
            streaming_threshold_bytes: 4 * 1024 * 1024,
            chunk_size: 1024 * 1024,
            overlap_size: 8 * 1024,
            min_chunk_size: 256 * 1024,
            max_chunk_size: 16 * 1024 * 1024,
            adaptive_resize: false,
            memory_threshold_bytes: 512 * 1024 * 1024,
            max_pattern_length: 1024,
            use_mmap: true,
            mmap_min_bytes: 1024 * 1024,
            cancel: None,
            on_progress: None,
            on_progress_detailed: None,
        }
    }
}

impl SearchConfig {
    /// Validates the configuration and compiles the file glob.
    ///
    /// # Errors
    ///
    /// Returns `InvalidGlob` for a malformed `file_glob` and `Config` for
    /// inconsistent numeric bounds.
    pub fn validate(&self) -> Result<Option<Glob>> {
        if self.min_chunk_size > self.max_chunk_size {
            return Err(SearchError::Config(format!(
                "min_chunk_size ({}) exceeds max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            )));
        }
        if self.buffer_size == 0 {
            return Err(SearchError::Config("buffer_size must be non-zero".into()));
        }
        if self.chunk_size == 0 {
            return Err(SearchError::Config("chunk_size must be non-zero".into()));
        }
        self.file_glob
            .as_deref()
            .map(|g| Glob::compile(g).map_err(SearchError::InvalidGlob))
            .transpose()
    }

    /// Worker count, never zero.
    #[must_use]
    pub fn effective_workers(&self) -> usize {
        self.workers.max(1)
    }

    /// Window overlap, raised to `max_pattern_length + OVERLAP_SLACK` so
    /// boundary matches are always covered.
    #[must_use]
    pub fn effective_overlap(&self) -> usize {
        self.overlap_size.max(self.max_pattern_length + OVERLAP_SLACK)
    }
}

impl fmt::Debug for SearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchConfig")
            .field("recursive", &self.recursive)
            .field("case_insensitive", &self.case_insensitive)
            .field("include_hidden", &self.include_hidden)
            .field("follow_symlinks", &self.follow_symlinks)
            .field("use_gitignore", &self.use_gitignore)
            .field("file_glob", &self.file_glob)
            .field("max_results", &self.max_results)
            .field("context_lines", &self.context_lines)
            .field("workers", &self.workers)
            .field("buffer_size", &self.buffer_size)
            .field("timeout", &self.timeout)
            .field("streaming_enabled", &self.streaming_enabled)
            .field("streaming_threshold_bytes", &self.streaming_threshold_bytes)
            .field("chunk_size", &self.chunk_size)
            .field("overlap_size", &self.overlap_size)
            .field("adaptive_resize", &self.adaptive_resize)
            .field("use_mmap", &self.use_mmap)
            .field("mmap_min_bytes", &self.mmap_min_bytes)
            .field("has_cancel", &self.cancel.is_some())
            .field("has_progress", &self.on_progress.is_some())
            .finish_non_exhaustive()
    }
}
