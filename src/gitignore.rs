//! Gitignore-style pattern matching.
//!
//! [`Glob`] compiles one wildcard pattern (`*`, `**`, `?`, `[set]`)
//! over `/`-separated paths; it also backs the `file_glob` config
//! option. [`GitignoreEngine`] holds every rule loaded from the
//! `.gitignore` files discovered during a walk and answers
//! [`should_ignore`](GitignoreEngine::should_ignore): rules are walked
//! in insertion order and the last matching rule decides, with `!`
//! negation re-including previously excluded paths.
//!
//! Evaluation is total: malformed lines are dropped at load time and
//! matching never panics.

use std::path::{Path, PathBuf};

/// A compiled wildcard pattern.
///
/// `*` matches any run of non-`/` bytes, `**` any run including `/`,
/// `?` one non-`/` byte, `[set]` a character class (leading `!` or `^`
/// negates, `a-z` ranges allowed).
#[derive(Debug, Clone)]
pub struct Glob {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone)]
enum Token {
    Byte(u8),
    AnyChar,
    Star,
    /// Bare `**`: any run of bytes including `/`.
    DoubleStar,
    /// `**/`: zero or more whole path components.
    DoubleStarSlash,
    Class { negated: bool, ranges: Vec<(u8, u8)> },
}

impl Glob {
    /// Compiles `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a description of the defect (currently only an unclosed
    /// character class).
    pub fn compile(pattern: &str) -> Result<Self, String> {
        let bytes = pattern.as_bytes();
        let mut tokens = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'*' => {
                    if bytes.get(i + 1) == Some(&b'*') {
                        if bytes.get(i + 2) == Some(&b'/') {
                            tokens.push(Token::DoubleStarSlash);
                            i += 3;
                        } else {
                            tokens.push(Token::DoubleStar);
                            i += 2;
                        }
                    } else {
                        tokens.push(Token::Star);
                        i += 1;
                    }
                }
                b'?' => {
                    tokens.push(Token::AnyChar);
                    i += 1;
                }
                b'[' => {
                    let (token, next) = parse_class(bytes, i)
                        .ok_or_else(|| format!("unclosed character class in {pattern:?}"))?;
                    tokens.push(token);
                    i = next;
                }
                b'\\' if i + 1 < bytes.len() => {
                    tokens.push(Token::Byte(bytes[i + 1]));
                    i += 2;
                }
                b => {
                    tokens.push(Token::Byte(b));
                    i += 1;
                }
            }
        }
        Ok(Self { tokens })
    }

    /// Matches `path` (already `/`-normalized) against the pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        matches_at(&self.tokens, path.as_bytes())
    }
}

fn parse_class(bytes: &[u8], open: usize) -> Option<(Token, usize)> {
    let mut i = open + 1;
    let negated = matches!(bytes.get(i), Some(&b'!') | Some(&b'^'));
    if negated {
        i += 1;
    }
    let mut ranges = Vec::new();
    let mut first = true;
    while i < bytes.len() {
        match bytes[i] {
            b']' if !first => {
                return Some((Token::Class { negated, ranges }, i + 1));
            }
            lo => {
                first = false;
                if bytes.get(i + 1) == Some(&b'-')
                    && bytes.get(i + 2).is_some_and(|&hi| hi != b']')
                {
                    ranges.push((lo, bytes[i + 2]));
                    i += 3;
                } else {
                    ranges.push((lo, lo));
                    i += 1;
                }
            }
        }
    }
    None
}

/// Recursive backtracking matcher. Gitignore rules are short, so the
/// worst case stays negligible.
fn matches_at(tokens: &[Token], path: &[u8]) -> bool {
    let Some((token, rest)) = tokens.split_first() else {
        return path.is_empty();
    };
    match token {
        Token::Byte(b) => path.first() == Some(b) && matches_at(rest, &path[1..]),
        Token::AnyChar => path
            .first()
            .is_some_and(|&c| c != b'/' && matches_at(rest, &path[1..])),
        Token::Class { negated, ranges } => path.first().is_some_and(|&c| {
            let inside = ranges.iter().any(|&(lo, hi)| c >= lo && c <= hi);
            c != b'/' && inside != *negated && matches_at(rest, &path[1..])
        }),
        Token::Star => {
            // Zero or more non-'/' bytes.
            if matches_at(rest, path) {
                return true;
            }
            for (i, &c) in path.iter().enumerate() {
                if c == b'/' {
                    return false;
                }
                if matches_at(rest, &path[i + 1..]) {
                    return true;
                }
            }
            false
        }
        Token::DoubleStar => {
            if matches_at(rest, path) {
                return true;
            }
            (0..path.len()).any(|i| matches_at(rest, &path[i + 1..]))
        }
        Token::DoubleStarSlash => {
            // Zero components first, then each deeper component boundary.
            if matches_at(rest, path) {
                return true;
            }
            path.iter()
                .enumerate()
                .any(|(i, &c)| c == b'/' && matches_at(rest, &path[i + 1..]))
        }
    }
}

/// One parsed `.gitignore` rule.
#[derive(Debug, Clone)]
pub struct GitignorePattern {
    pub raw: String,
    pub negation: bool,
    pub directory_only: bool,
    pub anchored: bool,
    /// Directory of the owning `.gitignore`, relative to the engine root.
    base: PathBuf,
    glob: Glob,
}

impl GitignorePattern {
    /// Parses one `.gitignore` line. Returns `None` for blanks,
    /// comments, and malformed patterns.
    fn parse(line: &str, base: &Path) -> Option<Self> {
        let mut text = line.trim();
        if text.is_empty() || text.starts_with('#') {
            return None;
        }
        let negation = text.starts_with('!');
        if negation {
            text = &text[1..];
        }
        let directory_only = text.ends_with('/');
        if directory_only {
            text = &text[..text.len() - 1];
        }
        // A leading slash anchors the rule; so does any interior slash.
        let anchored = if text.starts_with('/') {
            text = &text[1..];
            true
        } else {
            text.contains('/')
        };
        if text.is_empty() {
            return None;
        }
        let glob = Glob::compile(text).ok()?;
        Some(Self {
            raw: line.trim().to_string(),
            negation,
            directory_only,
            anchored,
            base: base.to_path_buf(),
            glob,
        })
    }

    /// Whether this rule matches `rel` (engine-root-relative,
    /// `/`-separated). `is_dir` reflects what the walker knows about the
    /// path.
    fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.directory_only && !is_dir {
            return false;
        }
        let base = normalize(&self.base);
        let sub = if base.is_empty() {
            rel
        } else {
            // Rules only apply beneath their .gitignore's directory.
            match rel.strip_prefix(base.as_str()).and_then(|s| s.strip_prefix('/')) {
                Some(sub) => sub,
                None => return false,
            }
        };
        if self.anchored {
            self.glob.matches(sub)
        } else {
            // Unanchored rules match any path component.
            sub.rsplit('/').next().is_some_and(|name| self.glob.matches(name))
        }
    }
}

/// Ordered rule set accumulated over a directory walk.
#[derive(Debug)]
pub struct GitignoreEngine {
    root: PathBuf,
    patterns: Vec<GitignorePattern>,
}

impl GitignoreEngine {
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            patterns: Vec::new(),
        }
    }

    /// Loads `dir/.gitignore` if present, appending its rules after
    /// everything loaded so far. Later rules override earlier ones, so
    /// deeper files take precedence as the walk descends.
    pub fn load_dir(&mut self, dir: &Path) {
        let path = dir.join(".gitignore");
        let Ok(content) = std::fs::read_to_string(&path) else {
            return;
        };
        let base = dir.strip_prefix(&self.root).unwrap_or(Path::new(""));
        for line in content.lines() {
            if let Some(pattern) = GitignorePattern::parse(line, base) {
                self.patterns.push(pattern);
            }
        }
    }

    /// Appends rules from raw text, as if read from a `.gitignore` in
    /// `base` (engine-root-relative).
    pub fn add_rules(&mut self, text: &str, base: &Path) {
        for line in text.lines() {
            if let Some(pattern) = GitignorePattern::parse(line, base) {
                self.patterns.push(pattern);
            }
        }
    }

    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Decides whether `path` is excluded. The last matching rule wins.
    #[must_use]
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let rel = normalize(rel);
        let mut ignored = false;
        for pattern in &self.patterns {
            if pattern.matches(&rel, is_dir) {
                ignored = !pattern.negation;
            }
        }
        ignored
    }
}

/// Joins path components with `/` regardless of platform separator.
fn normalize(path: &Path) -> String {
    let mut out = String::new();
    for component in path.components() {
        if !out.is_empty() {
            out.push('/');
        }
        out.push_str(&component.as_os_str().to_string_lossy());
    }
    out
}
