//! Directory traversal with filtering.
//!
//! Produces the lazy sequence of candidate files the worker pool scans.
//! Filters run before a path is emitted: symlink policy, hidden names,
//! the fixed skip-set and binary-extension set, the optional basename
//! glob, gitignore rules, and a 512-byte content probe that rejects
//! binary data early. Traversal errors are never fatal; the offending
//! entry is skipped and counted.
//!
//! Symlink cycles are prevented by carrying the set of canonicalized
//! directories already entered; an entry is removed again on backtrack.

use crate::cancel::CancelToken;
use crate::gitignore::{GitignoreEngine, Glob};
use crate::reader::compressed;
use crate::stats::StatsCollector;
use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

/// Directories never descended into (unless hidden files are included).
const SKIP_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "target",
    "build",
    "dist",
    "out",
    "bin",
    "pkg",
    "vendor",
    ".vscode",
    ".idea",
    "__pycache__",
    ".pytest_cache",
    ".cache",
    ".tmp",
    ".DS_Store",
];

/// Extensions with no text content worth scanning. Compressed text
/// formats (`gz`, `bz2`) are deliberately absent: the compressed reader
/// handles those.
const BINARY_EXTS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "ico", "webp", "tif", "tiff",
    // video
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v",
    // audio
    "mp3", "wav", "flac", "ogg", "m4a", "aac", "wma",
    // archives
    "zip", "tar", "7z", "rar", "xz", "zst", "jar", "war",
    // executables and objects
    "exe", "dll", "so", "dylib", "a", "o", "obj", "lib", "class", "pyc", "wasm",
    // office documents
    "doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf", "odt", "ods",
    // fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // databases and raw blobs
    "db", "sqlite", "sqlite3", "mdb", "iso", "img", "dmg", "bin", "dat",
];

const BINARY_PROBE_BYTES: usize = 512;

/// Walk-time options distilled from the search configuration.
#[derive(Debug)]
pub struct WalkOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    pub use_gitignore: bool,
    pub file_glob: Option<Glob>,
}

/// Traverses `root`, invoking `emit` for every file that passes all
/// filters. `emit` returns false to stop the walk (channel closed or
/// limit reached).
pub fn walk(
    root: &Path,
    options: &WalkOptions,
    stats: &StatsCollector,
    cancel: &CancelToken,
    emit: &mut dyn FnMut(PathBuf) -> bool,
) {
    // A file root bypasses the directory filters: the caller asked for
    // that file explicitly.
    if root.is_file() {
        emit(root.to_path_buf());
        return;
    }

    let mut walker = Walker {
        options,
        stats,
        cancel,
        engine: GitignoreEngine::new(root),
        visited: HashSet::new(),
    };
    if options.follow_symlinks {
        if let Ok(canonical) = fs::canonicalize(root) {
            walker.visited.insert(canonical);
        }
    }
    walker.walk_dir(root, emit);
}

struct Walker<'a> {
    options: &'a WalkOptions,
    stats: &'a StatsCollector,
    cancel: &'a CancelToken,
    engine: GitignoreEngine,
    /// Canonicalized directories on the current descent path.
    visited: HashSet<PathBuf>,
}

impl Walker<'_> {
    /// Returns false when the walk should stop entirely.
    fn walk_dir(&mut self, dir: &Path, emit: &mut dyn FnMut(PathBuf) -> bool) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        if self.options.use_gitignore {
            self.engine.load_dir(dir);
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("cannot read directory {}: {e}", dir.display());
                self.stats.add_skipped();
                return true;
            }
        };
        let mut entries: Vec<_> = entries.filter_map(std::result::Result::ok).collect();
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            if self.cancel.is_cancelled() {
                return false;
            }
            let path = entry.path();
            let name = entry.file_name();
            let name = name.to_string_lossy();

            let Ok(file_type) = entry.file_type() else {
                self.stats.add_skipped();
                continue;
            };

            let is_dir = if file_type.is_symlink() {
                if !self.options.follow_symlinks {
                    self.stats.add_skipped();
                    continue;
                }
                match fs::metadata(&path) {
                    Ok(meta) => meta.is_dir(),
                    Err(e) => {
                        // Broken symlink.
                        tracing::debug!("skipping {}: {e}", path.display());
                        self.stats.add_skipped();
                        continue;
                    }
                }
            } else {
                file_type.is_dir()
            };

            if is_dir {
                if !self.descend(&path, &name, emit) {
                    return false;
                }
            } else if !self.consider_file(&path, &name, emit) {
                return false;
            }
        }
        true
    }

    fn descend(&mut self, path: &Path, name: &str, emit: &mut dyn FnMut(PathBuf) -> bool) -> bool {
        if !self.options.recursive {
            return true;
        }
        // Gitignore first: a directory excluded by a rule counts toward
        // files_ignored even when the skip-set would also prune it.
        if self.options.use_gitignore && self.engine.should_ignore(path, true) {
            self.stats.add_ignored();
            return true;
        }
        if !self.options.include_hidden && (name.starts_with('.') || SKIP_DIRS.contains(&name)) {
            return true;
        }

        if self.options.follow_symlinks {
            // Cycle guard: canonical identity of every directory on the
            // current descent path.
            let Ok(canonical) = fs::canonicalize(path) else {
                self.stats.add_skipped();
                return true;
            };
            if !self.visited.insert(canonical.clone()) {
                tracing::debug!("symlink cycle at {}", path.display());
                return true;
            }
            let keep_going = self.walk_dir(path, emit);
            self.visited.remove(&canonical);
            keep_going
        } else {
            self.walk_dir(path, emit)
        }
    }

    fn consider_file(
        &mut self,
        path: &Path,
        name: &str,
        emit: &mut dyn FnMut(PathBuf) -> bool,
    ) -> bool {
        if !self.options.include_hidden && name.starts_with('.') {
            self.stats.add_skipped();
            return true;
        }
        if let Some(glob) = &self.options.file_glob {
            if !glob.matches(name) {
                self.stats.add_skipped();
                return true;
            }
        }
        if has_binary_extension(path) {
            self.stats.add_skipped();
            return true;
        }
        if self.options.use_gitignore && self.engine.should_ignore(path, false) {
            self.stats.add_ignored();
            return true;
        }
        // Compressed files look binary to the probe but decompress to text.
        if compressed_extension(path).is_none() && probe_is_binary(path) {
            self.stats.add_skipped();
            return true;
        }
        emit(path.to_path_buf())
    }
}

fn has_binary_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            BINARY_EXTS.contains(&ext.as_str())
        })
}

fn compressed_extension(path: &Path) -> Option<compressed::Codec> {
    match path.extension()?.to_str()? {
        "gz" | "gzip" => Some(compressed::Codec::Gzip),
        "bz2" | "bzip2" => Some(compressed::Codec::Bzip2),
        _ => None,
    }
}

/// Early binary detection over the first 512 bytes: more than 0.1% NUL
/// bytes or more than 5% non-printable bytes disqualifies the file.
/// Probe failures count as binary; the worker would fail on the file
/// anyway.
fn probe_is_binary(path: &Path) -> bool {
    let Ok(mut file) = File::open(path) else {
        return true;
    };
    let mut buf = [0u8; BINARY_PROBE_BYTES];
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(_) => return true,
        }
    }
    if filled == 0 {
        return false;
    }

    let sample = &buf[..filled];
    let nulls = sample.iter().filter(|&&b| b == 0).count();
    if nulls * 1000 > filled {
        return true;
    }
    let non_printable = sample
        .iter()
        .filter(|&&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r')) || b == 0x7f)
        .count();
    non_printable * 20 > filled
}
