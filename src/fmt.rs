//! Plain-text CLI output formatters.
//!
//! Matches print as `FILE:LINE:COLUMN:CONTENT`; context lines carry a
//! `-` (before) or `+` (after) marker on their line number. JSON output
//! is serialized directly from the results model in `main`.

use crate::results::{Match, SearchResults, SearchStats};
use std::io::{self, Write};

/// Writes every match with its context lines.
pub fn fmt_matches(w: &mut impl Write, results: &SearchResults) -> io::Result<()> {
    for m in &results.matches {
        fmt_match(w, m)?;
    }
    Ok(())
}

fn fmt_match(w: &mut impl Write, m: &Match) -> io::Result<()> {
    let file = m.file.display();
    for ctx in m.context_before() {
        writeln!(w, "{file}:{}-:{}", ctx.line, ctx.content)?;
    }
    writeln!(w, "{file}:{}:{}:{}", m.line, m.column, m.content)?;
    for ctx in m.context_after() {
        writeln!(w, "{file}:{}+:{}", ctx.line, ctx.content)?;
    }
    Ok(())
}

/// Writes the `--stats` summary block.
pub fn fmt_stats(w: &mut impl Write, results: &SearchResults) -> io::Result<()> {
    let stats: &SearchStats = &results.stats;
    let summary = results.summary();
    writeln!(w)?;
    writeln!(w, "matches:        {}", stats.matches_found)?;
    writeln!(w, "matching files: {}", summary.files_with_matches)?;
    writeln!(w, "files scanned:  {}", stats.files_scanned)?;
    writeln!(w, "files skipped:  {}", stats.files_skipped)?;
    writeln!(w, "files ignored:  {}", stats.files_ignored)?;
    writeln!(w, "bytes scanned:  {}", stats.bytes_scanned)?;
    writeln!(w, "elapsed:        {:.3}s", stats.duration.as_secs_f64())?;
    writeln!(w, "files/sec:      {:.1}", summary.files_per_second)?;
    Ok(())
}
