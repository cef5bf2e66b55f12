//! Search facade: validation, wiring, and result assembly.

use crate::cache::RegexCache;
use crate::config::SearchConfig;
use crate::error::{Result, SearchError};
use crate::pattern;
use crate::pool;
use crate::results::SearchResults;
use crate::stats::StatsCollector;
use crate::walker::WalkOptions;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Reusable search entry point owning a regex cache.
///
/// All searches through one `Searcher` share compiled patterns. The
/// free [`find`] function uses a lazily constructed process-wide cache
/// instead.
#[derive(Debug)]
pub struct Searcher {
    cache: Arc<RegexCache>,
}

impl Searcher {
    #[must_use]
    pub fn new() -> Self {
        Self {
            cache: Arc::new(RegexCache::new()),
        }
    }

    #[must_use]
    pub fn with_cache(cache: Arc<RegexCache>) -> Self {
        Self { cache }
    }

    #[must_use]
    pub fn cache(&self) -> &RegexCache {
        &self.cache
    }

    /// Searches `path` for `pattern`.
    ///
    /// # Errors
    ///
    /// `EmptyPattern` for an empty pattern or path argument,
    /// `PathMissing` when the root does not exist, `InvalidPattern` /
    /// `InvalidGlob` for malformed inputs (raised before any I/O), and
    /// `Cancelled` (carrying partial results) when the caller's token or
    /// the timeout fires.
    pub fn find(
        &self,
        pattern: &str,
        path: impl AsRef<Path>,
        config: &SearchConfig,
    ) -> Result<SearchResults> {
        let path = path.as_ref();
        if pattern.is_empty() || path.as_os_str().is_empty() {
            return Err(SearchError::EmptyPattern);
        }
        if !path.exists() {
            return Err(SearchError::PathMissing {
                path: path.to_path_buf(),
            });
        }

        let file_glob = config.validate()?;
        let compiled = Arc::new(pattern::analyze(
            pattern,
            config.case_insensitive,
            &self.cache,
        )?);

        let cancel = config.cancel.clone().unwrap_or_default();
        if let Some(timeout) = config.timeout {
            cancel.set_deadline(timeout);
        }

        let stats = StatsCollector::new();
        let walk_options = WalkOptions {
            recursive: config.recursive,
            include_hidden: config.include_hidden,
            follow_symlinks: config.follow_symlinks,
            use_gitignore: config.use_gitignore,
            file_glob,
        };

        tracing::debug!(
            "searching {} for {pattern:?} ({} workers)",
            path.display(),
            config.effective_workers()
        );
        let matches = pool::execute(path, config, walk_options, &compiled, &stats, &cancel);

        let snapshot = stats.finish(matches.len() as u64);
        let results = SearchResults {
            query: pattern.to_string(),
            matches,
            stats: snapshot,
        };

        if cancel.is_cancelled() {
            return Err(SearchError::Cancelled {
                results: Box::new(results),
            });
        }
        Ok(results)
    }
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Searches `path` for `pattern` using the process-wide regex cache.
///
/// # Errors
///
/// See [`Searcher::find`].
pub fn find(pattern: &str, path: impl AsRef<Path>, config: SearchConfig) -> Result<SearchResults> {
    static CACHE: OnceLock<Arc<RegexCache>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Arc::new(RegexCache::new()));
    Searcher::with_cache(Arc::clone(cache)).find(pattern, path, &config)
}
