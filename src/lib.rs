//! linehound: recursive text search engine.
//!
//! This library locates every line matching a pattern across a
//! directory tree, using:
//! - Literal fast paths with rare-byte scanning and word-at-a-time
//!   byte search
//! - Regex matching gated behind extracted required literals
//! - Size-aware reader selection: plain buffered, memory-mapped,
//!   sliding-window streaming, and gzip/bzip2 decoding
//! - A concurrent walker + worker pool with gitignore filtering
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              find() facade                  │
//! │    validation · pattern analysis · stats    │
//! └───────┬─────────────────────────┬───────────┘
//!         │                         │
//! ┌───────▼────────┐       ┌────────▼───────────┐
//! │    Walker      │ paths │    Worker pool     │
//! │ filters +      ├──────▶│  reader selection  │
//! │ gitignore      │       │  line matching     │
//! └────────────────┘       └────────┬───────────┘
//!                                   │ match batches
//!                          ┌────────▼───────────┐
//!                          │     Collector      │
//!                          │ max_results · stats│
//!                          └────────────────────┘
//! ```
//!
//! The walker streams candidate files into a bounded channel; workers
//! pick a reader per file and run the line matcher over it; the
//! collector assembles [`SearchResults`] under the `max_results` cap.
//! A shared [`CancelToken`](cancel::CancelToken) (optionally armed with
//! a timeout) winds the whole pipeline down cooperatively.

pub mod cache;
pub mod cancel;
pub mod config;
pub mod error;
pub mod fmt;
pub mod gitignore;
pub mod matcher;
pub mod pattern;
mod pool;
pub mod reader;
pub mod results;
pub mod scan;
pub mod search;
pub mod stats;
pub mod walker;

pub use cache::RegexCache;
pub use cancel::CancelToken;
pub use config::SearchConfig;
pub use error::{Result, SearchError};
pub use results::{ContextLine, Match, SearchResults, SearchStats, SearchSummary};
pub use search::{find, Searcher};
pub use stats::ProgressInfo;
