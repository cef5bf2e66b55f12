//! Per-line matching and match assembly with context capture.
//!
//! [`LineMatcher`] finds the byte offsets of matches within one line.
//! [`FileScanner`] consumes the `(line_number, line_bytes)` stream every
//! reader variant produces, runs the matcher, and assembles [`Match`]es
//! with up to `context_lines` lines either side of each hit.

use crate::pattern::{CompiledPattern, LiteralPattern, PatternKind};
use crate::results::{ContextLine, Match};
use crate::scan::index_byte;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;

/// Stateless per-line matcher over a shared compiled pattern.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    pattern: Arc<CompiledPattern>,
}

impl LineMatcher {
    #[must_use]
    pub fn new(pattern: Arc<CompiledPattern>) -> Self {
        Self { pattern }
    }

    #[must_use]
    pub fn pattern(&self) -> &CompiledPattern {
        &self.pattern
    }

    /// Appends the start offsets of all matches in `line` to `out`.
    ///
    /// Offsets are relative to the original line bytes even in
    /// case-insensitive mode; `fold` is scratch space reused across
    /// lines for the lower-cased copy.
    pub fn find_in_line(&self, line: &[u8], fold: &mut Vec<u8>, out: &mut Vec<usize>) {
        match &self.pattern.kind {
            PatternKind::Literal(lit) => {
                let hay = self.folded(line, fold);
                find_literal(lit, hay, out);
            }
            PatternKind::Regex { regex, required } => {
                if let Some(req) = required {
                    let hay = self.folded(line, fold);
                    if !contains_literal(req, hay) {
                        return;
                    }
                }
                // The automaton carries the case-insensitive flag itself,
                // so it runs over the original bytes.
                out.extend(regex.find_iter(line).map(|m| m.start()));
            }
        }
    }

    /// Lower-cases `line` into `fold` when the search is case-insensitive.
    /// ASCII folding is position-preserving, so offsets into the folded
    /// buffer are valid for the original line.
    fn folded<'a>(&self, line: &'a [u8], fold: &'a mut Vec<u8>) -> &'a [u8] {
        if !self.pattern.case_insensitive {
            return line;
        }
        fold.clear();
        fold.extend(line.iter().map(u8::to_ascii_lowercase));
        fold
    }
}

/// Rare-byte literal scan: find the anchor byte, back up to the implied
/// start, verify the whole needle, advance past verified matches.
fn find_literal(lit: &LiteralPattern, hay: &[u8], out: &mut Vec<usize>) {
    let needle = lit.needle.as_slice();
    if needle.is_empty() || hay.len() < needle.len() {
        return;
    }
    if needle.len() == 1 {
        let mut pos = 0;
        while let Some(p) = index_byte(&hay[pos..], needle[0]) {
            out.push(pos + p);
            pos += p + 1;
        }
        return;
    }

    let mut pos = 0;
    while let Some(p) = index_byte(&hay[pos..], lit.rare_byte) {
        let anchor = pos + p;
        let Some(start) = anchor.checked_sub(lit.rare_offset) else {
            pos = anchor + 1;
            continue;
        };
        let end = start + needle.len();
        if end <= hay.len() && &hay[start..end] == needle {
            out.push(start);
            pos = end;
        } else {
            pos = anchor + 1;
        }
    }
}

fn contains_literal(lit: &LiteralPattern, hay: &[u8]) -> bool {
    let needle = lit.needle.as_slice();
    if needle.is_empty() {
        return true;
    }
    let mut pos = 0;
    while let Some(p) = index_byte(&hay[pos..], lit.rare_byte) {
        let anchor = pos + p;
        if let Some(start) = anchor.checked_sub(lit.rare_offset) {
            let end = start + needle.len();
            if end <= hay.len() && &hay[start..end] == needle {
                return true;
            }
        }
        pos = anchor + 1;
    }
    false
}

/// A match waiting for its trailing context lines.
struct PendingMatch {
    inner: Match,
    remaining_after: usize,
}

/// Streaming match assembler for one file.
///
/// Feed lines in order with [`feed`](Self::feed); call
/// [`finish`](Self::finish) at end of file to flush matches still
/// waiting on trailing context. Matches are produced in line order.
pub struct FileScanner {
    matcher: LineMatcher,
    file: PathBuf,
    context_lines: usize,
    /// Stop collecting once this many matches exist (0 = unlimited).
    limit: usize,
    before: VecDeque<ContextLine>,
    pending: VecDeque<PendingMatch>,
    matches: Vec<Match>,
    fold_buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl FileScanner {
    #[must_use]
    pub fn new(matcher: LineMatcher, file: PathBuf, context_lines: usize, limit: usize) -> Self {
        Self {
            matcher,
            file,
            context_lines,
            limit,
            before: VecDeque::with_capacity(context_lines + 1),
            pending: VecDeque::new(),
            matches: Vec::new(),
            fold_buf: Vec::new(),
            offsets: Vec::new(),
        }
    }

    /// Total matches assembled so far, including those still pending
    /// trailing context.
    #[must_use]
    pub fn matches_found(&self) -> usize {
        self.matches.len() + self.pending.len()
    }

    /// True once the match limit has been reached; callers may stop
    /// feeding lines (trailing context may still be incomplete).
    #[must_use]
    pub fn at_limit(&self) -> bool {
        self.limit > 0 && self.matches_found() >= self.limit
    }

    /// Processes one line of the file. Lines must arrive in order and
    /// without their trailing newline.
    pub fn feed(&mut self, line_number: u64, line: &[u8]) {
        let mut text: Option<String> = None;

        // Complete trailing context of earlier matches first: the current
        // line is "after" context for them, never for itself.
        if !self.pending.is_empty() {
            let content = text
                .get_or_insert_with(|| String::from_utf8_lossy(line).into_owned())
                .clone();
            for p in &mut self.pending {
                if p.remaining_after > 0 {
                    p.inner.context.push(ContextLine {
                        line: line_number,
                        content: content.clone(),
                    });
                    p.remaining_after -= 1;
                }
            }
            while self
                .pending
                .front()
                .is_some_and(|p| p.remaining_after == 0)
            {
                if let Some(p) = self.pending.pop_front() {
                    self.matches.push(p.inner);
                }
            }
        }

        if !self.at_limit() {
            self.offsets.clear();
            self.matcher
                .find_in_line(line, &mut self.fold_buf, &mut self.offsets);
            // Split borrows: drain offsets into locals before mutating self.
            let offsets = std::mem::take(&mut self.offsets);
            for &col in &offsets {
                if self.at_limit() {
                    break;
                }
                let content = text
                    .get_or_insert_with(|| String::from_utf8_lossy(line).into_owned())
                    .clone();
                let m = Match {
                    file: self.file.clone(),
                    line: line_number,
                    column: col as u64 + 1,
                    content,
                    context: self.before.iter().cloned().collect(),
                };
                if self.context_lines > 0 {
                    self.pending.push_back(PendingMatch {
                        inner: m,
                        remaining_after: self.context_lines,
                    });
                } else {
                    self.matches.push(m);
                }
            }
            self.offsets = offsets;
        }

        if self.context_lines > 0 {
            let content = text
                .unwrap_or_else(|| String::from_utf8_lossy(line).into_owned());
            self.before.push_back(ContextLine {
                line: line_number,
                content,
            });
            if self.before.len() > self.context_lines {
                self.before.pop_front();
            }
        }
    }

    /// Flushes matches still waiting on trailing context (clipped at end
    /// of file) and returns everything collected.
    #[must_use]
    pub fn finish(mut self) -> Vec<Match> {
        while let Some(p) = self.pending.pop_front() {
            self.matches.push(p.inner);
        }
        self.matches
    }
}
