//! Results model: matches, per-search statistics, and summaries.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

/// A context line captured around a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLine {
    /// 1-indexed line number within the file.
    pub line: u64,
    pub content: String,
}

/// A single found occurrence of the pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub file: PathBuf,
    /// 1-indexed line number.
    pub line: u64,
    /// 1-indexed byte column of the first matched byte, measured against
    /// the original (non-case-folded) line.
    pub column: u64,
    /// The full matched line.
    pub content: String,
    /// Up to `context_lines` lines either side of the match, in file
    /// order, excluding the matching line itself. Empty when no context
    /// was requested.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<ContextLine>,
}

impl Match {
    /// Context lines preceding the match, in file order.
    pub fn context_before(&self) -> impl Iterator<Item = &ContextLine> {
        let line = self.line;
        self.context.iter().filter(move |c| c.line < line)
    }

    /// Context lines following the match, in file order.
    pub fn context_after(&self) -> impl Iterator<Item = &ContextLine> {
        let line = self.line;
        self.context.iter().filter(move |c| c.line > line)
    }
}

/// Monotonic counters and timing for one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchStats {
    pub files_scanned: u64,
    pub files_skipped: u64,
    pub files_ignored: u64,
    pub bytes_scanned: u64,
    pub matches_found: u64,
    pub start_time: SystemTime,
    pub end_time: SystemTime,
    pub duration: Duration,
}

impl Default for SearchStats {
    fn default() -> Self {
        let now = SystemTime::now();
        Self {
            files_scanned: 0,
            files_skipped: 0,
            files_ignored: 0,
            bytes_scanned: 0,
            matches_found: 0,
            start_time: now,
            end_time: now,
            duration: Duration::ZERO,
        }
    }
}

/// Aggregated outcome of a single `find` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResults {
    pub query: String,
    pub matches: Vec<Match>,
    pub stats: SearchStats,
}

impl SearchResults {
    /// An empty result set for `query`, with zeroed stats.
    #[must_use]
    pub fn empty(query: &str) -> Self {
        Self {
            query: query.to_string(),
            matches: Vec::new(),
            stats: SearchStats::default(),
        }
    }

    #[must_use]
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.matches.len()
    }

    /// The distinct files that produced at least one match.
    ///
    /// First-seen order; callers must not rely on any particular ordering.
    #[must_use]
    pub fn unique_files(&self) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        self.matches
            .iter()
            .filter(|m| seen.insert(m.file.as_path()))
            .map(|m| m.file.clone())
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> SearchSummary {
        let secs = self.stats.duration.as_secs_f64();
        let files_per_second = if secs > 0.0 {
            self.stats.files_scanned as f64 / secs
        } else {
            0.0
        };
        SearchSummary {
            total_matches: self.matches.len() as u64,
            files_with_matches: self.unique_files().len() as u64,
            files_scanned: self.stats.files_scanned,
            bytes_scanned: self.stats.bytes_scanned,
            duration: self.stats.duration,
            files_per_second,
        }
    }
}

/// Derived per-search summary figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSummary {
    pub total_matches: u64,
    pub files_with_matches: u64,
    pub files_scanned: u64,
    pub bytes_scanned: u64,
    pub duration: Duration,
    pub files_per_second: f64,
}
