//! Pattern compilation and literal optimization.
//!
//! A pattern with no regex metacharacter is matched by byte comparison.
//! Regex patterns are compiled through the [`RegexCache`] and, where
//! possible, carry a *required literal*: a substring every match must
//! contain, used to rule lines out before the automaton runs.
//!
//! Every chosen literal also records its *rare byte*: the byte expected
//! least often in real text per a fixed frequency table. Scanning for
//! the rare byte instead of the first byte keeps false candidate starts
//! low on prose-heavy input.

use crate::cache::RegexCache;
use crate::error::{Result, SearchError};
use regex::bytes::Regex;
use std::sync::Arc;

/// Bytes that give a pattern regex semantics.
pub const REGEX_METACHARS: &[u8] = b".*+?^$|()[]{}\\";

/// Extracted literals shorter than this are not worth pre-filtering on.
const MIN_REQUIRED_LITERAL: usize = 2;

/// Relative frequency of each byte in typical text corpora. Higher means
/// more common. Only the ordering matters: control and high-bit bytes
/// score lowest, common lowercase letters and space highest.
#[rustfmt::skip]
const BYTE_FREQ: [u16; 256] = [
       0,    1,    1,    1,    1,    1,    1,    1,    1,  120,  200,    1,    1,   80,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
    1000,   12,   40,   15,    8,    8,   10,   35,   30,   30,   12,   10,   60,   50,   70,   40,
      45,   40,   30,   25,   22,   20,   20,   20,   22,   25,   35,   30,   12,   35,   12,    8,
       5,   50,   25,   35,   30,   50,   30,   20,   25,   45,    8,   10,   35,   30,   35,   35,
      35,    4,   40,   45,   45,   20,   10,   20,    6,   12,    4,   12,   10,   12,    3,   55,
       6,  650,  120,  220,  340, 1020,  180,  160,  490,  560,   12,   60,  320,  190,  540,  600,
     150,    8,  480,  510,  730,  220,   80,  190,   15,  160,    6,   10,    8,   10,    4,    0,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
       1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,    1,
];

/// A literal needle with its rare-byte scanning anchor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralPattern {
    /// The needle, lower-cased when the search is case-insensitive.
    pub needle: Vec<u8>,
    /// The least-frequent byte of `needle`.
    pub rare_byte: u8,
    /// Index of `rare_byte` within `needle`.
    pub rare_offset: usize,
}

impl LiteralPattern {
    fn new(mut needle: Vec<u8>, case_insensitive: bool) -> Self {
        if case_insensitive {
            needle.make_ascii_lowercase();
        }
        let (rare_offset, rare_byte) = needle
            .iter()
            .copied()
            .enumerate()
            .min_by_key(|&(_, b)| BYTE_FREQ[b as usize])
            .unwrap_or((0, 0));
        Self {
            needle,
            rare_byte,
            rare_offset,
        }
    }
}

/// How the pattern will be matched.
#[derive(Debug, Clone)]
pub enum PatternKind {
    Literal(LiteralPattern),
    Regex {
        regex: Arc<Regex>,
        /// Pre-filter literal; lines without it cannot match.
        required: Option<LiteralPattern>,
    },
}

/// A pattern compiled once per search and shared read-only by workers.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub raw: String,
    pub case_insensitive: bool,
    pub kind: PatternKind,
}

/// Compiles `raw` into a [`CompiledPattern`].
///
/// # Errors
///
/// Returns `EmptyPattern` for an empty input and `InvalidPattern` when a
/// regex form fails to compile.
pub fn analyze(
    raw: &str,
    case_insensitive: bool,
    cache: &RegexCache,
) -> Result<CompiledPattern> {
    if raw.is_empty() {
        return Err(SearchError::EmptyPattern);
    }

    let kind = if is_literal(raw) {
        PatternKind::Literal(LiteralPattern::new(raw.as_bytes().to_vec(), case_insensitive))
    } else {
        let regex = cache.get_or_compile(raw, case_insensitive)?;
        let required =
            extract_required_literal(raw).map(|lit| LiteralPattern::new(lit, case_insensitive));
        PatternKind::Regex { regex, required }
    };

    Ok(CompiledPattern {
        raw: raw.to_string(),
        case_insensitive,
        kind,
    })
}

/// True iff `raw` contains no regex metacharacter.
#[must_use]
pub fn is_literal(raw: &str) -> bool {
    !raw.bytes().any(|b| REGEX_METACHARS.contains(&b))
}

/// Attempts to extract a literal that every match of `raw` must contain.
///
/// Alternations take the longest common prefix of all branches (or the
/// first branch when it is itself a pure literal). Other patterns are
/// scanned byte-by-byte for literal runs, skipping escapes and character
/// classes, and discarding anything made optional by a quantifier or an
/// optional group. Literals shorter than two bytes are not used.
#[must_use]
pub fn extract_required_literal(raw: &str) -> Option<Vec<u8>> {
    if has_unescaped_alternation(raw) {
        return extract_from_alternation(raw);
    }
    extract_longest_run(raw)
}

fn has_unescaped_alternation(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => return true,
            _ => i += 1,
        }
    }
    false
}

fn extract_from_alternation(raw: &str) -> Option<Vec<u8>> {
    let mut alternatives: Vec<&[u8]> = Vec::new();
    let bytes = raw.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'|' => {
                alternatives.push(&bytes[start..i]);
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    alternatives.push(&bytes[start..]);

    let first = *alternatives.first()?;
    let mut prefix_len = first.len();
    for alt in &alternatives[1..] {
        prefix_len = prefix_len
            .min(alt.len())
            .min(first.iter().zip(alt.iter()).take_while(|(a, b)| a == b).count());
    }
    // A prefix is only literal up to the first metacharacter.
    let literal_len = first[..prefix_len]
        .iter()
        .position(|b| REGEX_METACHARS.contains(b))
        .unwrap_or(prefix_len);

    if literal_len >= MIN_REQUIRED_LITERAL {
        return Some(first[..literal_len].to_vec());
    }
    // Fall back to the first alternative when it is a pure literal.
    if !first.iter().any(|b| REGEX_METACHARS.contains(b)) && first.len() >= MIN_REQUIRED_LITERAL {
        return Some(first.to_vec());
    }
    None
}

/// Scans for the longest contiguous literal run that survives quantifier
/// analysis. `\x` escapes are passed over, `[...]` classes are skipped
/// wholesale, and a group closed with `)*`, `)?`, or `){` drops every
/// candidate collected inside it.
fn extract_longest_run(raw: &str) -> Option<Vec<u8>> {
    let bytes = raw.as_bytes();
    let mut candidates: Vec<Vec<u8>> = Vec::new();
    let mut run: Vec<u8> = Vec::new();
    let mut group_marks: Vec<usize> = Vec::new();
    let mut i = 0;

    macro_rules! flush {
        () => {
            if !run.is_empty() {
                candidates.push(std::mem::take(&mut run));
            }
        };
    }

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => {
                flush!();
                i += 2;
            }
            b'[' => {
                flush!();
                i = skip_class(bytes, i);
            }
            b'(' => {
                flush!();
                if bytes.get(i + 1) == Some(&b'?') {
                    if bytes.get(i + 2) == Some(&b':') {
                        group_marks.push(candidates.len());
                        i += 3;
                    } else {
                        // Flags, lookarounds, named groups: bail out
                        // rather than risk a literal that is not required.
                        return None;
                    }
                } else {
                    group_marks.push(candidates.len());
                    i += 1;
                }
            }
            b')' => {
                flush!();
                let mark = group_marks.pop().unwrap_or(0);
                if matches!(bytes.get(i + 1), Some(&b'*') | Some(&b'?') | Some(&b'{')) {
                    // The whole group may repeat zero times.
                    candidates.truncate(mark);
                }
                i += 1;
            }
            b'*' | b'?' => {
                // The preceding byte is optional.
                let _ = run.pop();
                flush!();
                i += 1;
            }
            b'{' => {
                // Counted repetition may allow zero occurrences.
                let _ = run.pop();
                flush!();
                while i < bytes.len() && bytes[i] != b'}' {
                    i += 1;
                }
                i += 1;
            }
            b'+' | b'^' | b'$' | b'.' => {
                flush!();
                i += 1;
            }
            b => {
                run.push(b);
                i += 1;
            }
        }
    }
    flush!();

    candidates
        .into_iter()
        .filter(|c| c.len() >= MIN_REQUIRED_LITERAL)
        .max_by_key(Vec::len)
}

/// Advances past a `[...]` character class starting at `open`.
fn skip_class(bytes: &[u8], open: usize) -> usize {
    let mut i = open + 1;
    if bytes.get(i) == Some(&b'^') {
        i += 1;
    }
    // A leading `]` is a literal member of the class.
    if bytes.get(i) == Some(&b']') {
        i += 1;
    }
    while i < bytes.len() && bytes[i] != b']' {
        if bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    i + 1
}
