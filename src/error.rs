//! Error types for linehound.
//!
//! Uses thiserror for ergonomic error handling with proper
//! error chain propagation.
//!
//! Only five conditions terminate a search: an empty pattern or path, a
//! missing search root, a regex that fails to compile, a malformed file
//! glob, and cooperative cancellation. Per-file failures (permission
//! denied, broken symlinks, read errors, mmap failures, decompression
//! errors) are absorbed locally: the file is skipped and `files_skipped`
//! is incremented.

use crate::results::SearchResults;
use std::path::PathBuf;
use thiserror::Error;

/// Top-level search error.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Empty pattern or path argument")]
    EmptyPattern,

    #[error("Search path does not exist: {}", path.display())]
    PathMissing { path: PathBuf },

    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(String),

    #[error("Invalid file glob: {0}")]
    InvalidGlob(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Cooperative cancellation, including the per-search timeout.
    ///
    /// Carries everything collected before the signal fired so callers
    /// can still use the partial results.
    #[error("Search cancelled")]
    Cancelled { results: Box<SearchResults> },
}

impl SearchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyPattern => "EMPTY_PATTERN",
            Self::PathMissing { .. } => "PATH_MISSING",
            Self::InvalidPattern(_) => "INVALID_PATTERN",
            Self::InvalidGlob(_) => "INVALID_GLOB",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Cancelled { .. } => "CANCELLED",
        }
    }

    /// Returns the partial results carried by a `Cancelled` error, if any.
    #[must_use]
    pub fn partial_results(&self) -> Option<&SearchResults> {
        match self {
            Self::Cancelled { results } => Some(results),
            _ => None,
        }
    }
}

/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, SearchError>;
