//! Common test utilities for linehound integration tests.
//!
//! Provides `TestEnv` for setting up isolated directory trees and
//! running searches against them with tweaked configurations.

#![allow(dead_code)] // Test utilities may not all be used in every test file

use linehound::{SearchConfig, SearchResults};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// An isolated directory tree for one test.
pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    /// Creates a new empty test environment.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Writes a file to the test directory, creating parents as needed.
    pub fn write_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write test file");
    }

    /// Writes raw bytes to the test directory.
    pub fn write_bytes(&self, name: &str, content: &[u8]) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write test file");
    }

    /// Gets the full path to a file in the test directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Searches the whole environment with defaults plus overrides.
    pub fn find(&self, pattern: &str, config: SearchConfig) -> linehound::Result<SearchResults> {
        linehound::find(pattern, self.dir.path(), config)
    }

    /// Non-recursive search with default options.
    pub fn find_flat(&self, pattern: &str) -> SearchResults {
        self.find(pattern, SearchConfig::default())
            .expect("search failed")
    }

    /// Recursive search with default options.
    pub fn find_recursive(&self, pattern: &str) -> SearchResults {
        self.find(
            pattern,
            SearchConfig {
                recursive: true,
                ..SearchConfig::default()
            },
        )
        .expect("search failed")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Sorts matches by (file, line, column) for order-insensitive asserts.
pub fn sorted(results: &SearchResults) -> Vec<(String, u64, u64, String)> {
    let mut rows: Vec<_> = results
        .matches
        .iter()
        .map(|m| {
            (
                m.file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                m.line,
                m.column,
                m.content.clone(),
            )
        })
        .collect();
    rows.sort();
    rows
}
