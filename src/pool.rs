//! Worker pool and result collection.
//!
//! The walker streams candidate paths into a bounded channel consumed
//! by `workers` threads; each worker picks a reader variant per file,
//! runs the scanner, and ships `Vec<Match>` batches to the collector
//! over a second bounded channel. The collector owns the accumulator,
//! stops accepting once `max_results` is reached, and signals the
//! internal stop token so the walker and workers wind down. Matches
//! already in flight may still land; the accumulator is truncated in
//! insertion order.
//!
//! Two tokens cooperate: `cancel` is the caller's token (plus timeout)
//! and makes the whole search report `Cancelled`; `stop` is internal
//! and only ends the pipeline early.

use crate::cancel::CancelToken;
use crate::config::SearchConfig;
use crate::matcher::{FileScanner, LineMatcher};
use crate::pattern::CompiledPattern;
use crate::reader::{self, ReaderKind};
use crate::results::Match;
use crate::stats::StatsCollector;
use crate::walker::{self, WalkOptions};
use crossbeam_channel::bounded;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Runs the full walk → match → collect pipeline for one root.
pub(crate) fn execute(
    root: &Path,
    config: &SearchConfig,
    walk_options: WalkOptions,
    pattern: &Arc<CompiledPattern>,
    stats: &StatsCollector,
    cancel: &CancelToken,
) -> Vec<Match> {
    let workers = config.effective_workers();
    let (file_tx, file_rx) = bounded::<PathBuf>(2 * workers);
    let (result_tx, result_rx) = bounded::<Vec<Match>>(2 * workers);
    let stop = CancelToken::new();

    let mut collected: Vec<Match> = Vec::new();

    std::thread::scope(|scope| {
        {
            let stop = stop.clone();
            let cancel = cancel.clone();
            scope.spawn(move || {
                walker::walk(root, &walk_options, stats, &cancel, &mut |path| {
                    if stop.is_cancelled() || cancel.is_cancelled() {
                        return false;
                    }
                    file_tx.send(path).is_ok()
                });
                // file_tx drops here, closing the channel for workers.
            });
        }

        for _ in 0..workers {
            let file_rx = file_rx.clone();
            let result_tx = result_tx.clone();
            let stop = stop.clone();
            let cancel = cancel.clone();
            scope.spawn(move || {
                while let Ok(path) = file_rx.recv() {
                    if stop.is_cancelled() || cancel.is_cancelled() {
                        break;
                    }
                    if let Some(matches) =
                        process_file(&path, config, pattern, stats, &cancel)
                    {
                        if result_tx.send(matches).is_err() {
                            break;
                        }
                    }
                }
            });
        }
        drop(file_rx);
        drop(result_tx);

        // Collector: runs on the scope's own thread, draining until every
        // worker has exited so senders never block forever.
        while let Ok(batch) = result_rx.recv() {
            if collected.len() < config.max_results {
                collected.extend(batch);
                if collected.len() >= config.max_results {
                    stop.cancel();
                }
            }
        }
    });

    collected.truncate(config.max_results);
    collected
}

/// Scans one file with the reader the selection policy picks.
///
/// All per-file errors are absorbed: the file is skipped and counted.
fn process_file(
    path: &PathBuf,
    config: &SearchConfig,
    pattern: &Arc<CompiledPattern>,
    stats: &StatsCollector,
    cancel: &CancelToken,
) -> Option<Vec<Match>> {
    let metadata = match std::fs::metadata(path) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!("skipping {}: {e}", path.display());
            stats.add_skipped();
            return None;
        }
    };
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::debug!("skipping {}: {e}", path.display());
            stats.add_skipped();
            return None;
        }
    };
    let kind = match reader::select_reader(path, &mut file, metadata.len(), config) {
        Ok(kind) => kind,
        Err(e) => {
            tracing::debug!("skipping {}: {e}", path.display());
            stats.add_skipped();
            return None;
        }
    };

    let matcher = LineMatcher::new(Arc::clone(pattern));
    let mut scanner = FileScanner::new(
        matcher,
        path.clone(),
        config.context_lines,
        config.max_results,
    );

    let outcome = match kind {
        ReaderKind::Plain => reader::scan_plain(
            BufReader::with_capacity(config.buffer_size, file),
            &mut scanner,
            cancel,
            stats,
        ),
        ReaderKind::Mmap => match reader::mmap::scan(&file, &mut scanner, cancel, stats) {
            Ok(done) => Ok(done),
            Err(e) => {
                tracing::debug!("mmap failed for {}, using plain reader: {e}", path.display());
                reader::scan_plain(
                    BufReader::with_capacity(config.buffer_size, file),
                    &mut scanner,
                    cancel,
                    stats,
                )
            }
        },
        ReaderKind::Streaming => {
            reader::streaming::scan(file, metadata.len(), &mut scanner, config, cancel, stats)
        }
        ReaderKind::Compressed(codec) => {
            reader::compressed::scan(codec, file, &mut scanner, config, cancel, stats)
        }
    };

    match outcome {
        Ok(_) => {
            stats.add_scanned();
            let matches = scanner.finish();
            (!matches.is_empty()).then_some(matches)
        }
        Err(e) => {
            tracing::debug!("read error in {}: {e}", path.display());
            stats.add_skipped();
            None
        }
    }
}
