//! End-to-end search tests over real directory trees.
//!
//! Covers the literal and regex paths, case folding, context capture,
//! gitignore filtering, and the documented result invariants.

mod common;

use common::{sorted, TestEnv};
use linehound::SearchConfig;
use std::fs;

#[test]
fn test_basic_literal_two_files() {
    let env = TestEnv::new();
    env.write_file("a.txt", "hello\nworld\n");
    env.write_file("b.go", "hello go\n");

    let results = env.find_flat("hello");
    assert_eq!(results.count(), 2);
    assert_eq!(
        sorted(&results),
        vec![
            ("a.txt".to_string(), 1, 1, "hello".to_string()),
            ("b.go".to_string(), 1, 1, "hello go".to_string()),
        ]
    );
    assert_eq!(results.stats.matches_found, 2);
    assert_eq!(results.query, "hello");
}

#[test]
fn test_case_insensitive_matches_all_variants() {
    let env = TestEnv::new();
    env.write_file("mixed.txt", "Hello\nhello\nHELLO\n");

    let results = env
        .find(
            "hello",
            SearchConfig {
                case_insensitive: true,
                ..SearchConfig::default()
            },
        )
        .unwrap();

    assert_eq!(results.count(), 3);
    for (expected_line, m) in (1..=3).zip(results.matches.iter()) {
        assert_eq!(m.line, expected_line);
        assert_eq!(m.column, 1);
    }
}

#[test]
fn test_case_insensitive_is_superset_of_sensitive() {
    let env = TestEnv::new();
    env.write_file("data.txt", "Alpha\nalpha\nALPHA beta\nunrelated\n");

    let sensitive = env.find_flat("alpha");
    let folded = env
        .find(
            "alpha",
            SearchConfig {
                case_insensitive: true,
                ..SearchConfig::default()
            },
        )
        .unwrap();

    let sensitive_rows = sorted(&sensitive);
    let folded_rows = sorted(&folded);
    for row in &sensitive_rows {
        assert!(folded_rows.contains(row), "missing {row:?}");
    }
    assert!(folded_rows.len() > sensitive_rows.len());
}

#[test]
fn test_context_lines_around_match() {
    let env = TestEnv::new();
    env.write_file("ctx.txt", "L1\nL2\nTARGET\nL4\nL5\n");

    let results = env
        .find(
            "TARGET",
            SearchConfig {
                context_lines: 1,
                ..SearchConfig::default()
            },
        )
        .unwrap();

    assert_eq!(results.count(), 1);
    let m = &results.matches[0];
    assert_eq!(m.line, 3);
    let ctx: Vec<_> = m.context.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(ctx, vec!["L2", "L4"]);
}

#[test]
fn test_context_excludes_match_line_and_caps_length() {
    let env = TestEnv::new();
    env.write_file("ctx.txt", "a\nb\nc\nTARGET\nd\ne\nf\n");

    let k = 2;
    let results = env
        .find(
            "TARGET",
            SearchConfig {
                context_lines: k,
                ..SearchConfig::default()
            },
        )
        .unwrap();

    let m = &results.matches[0];
    assert!(m.context.len() <= 2 * k);
    assert!(m.context.iter().all(|c| c.line != m.line));
    let ctx: Vec<_> = m.context.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(ctx, vec!["b", "c", "d", "e"]);
}

#[test]
fn test_gitignore_excludes_build_dir() {
    let env = TestEnv::new();
    env.write_file("main.go", "package main\n");
    env.write_file("generated/out.txt", "package main\n");
    env.write_file(".gitignore", "generated/\n");

    let results = env.find_recursive("package");
    let files = results.unique_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("main.go"));
    assert!(results.stats.files_ignored >= 1);
}

#[test]
fn test_gitignore_negation_reincludes() {
    let env = TestEnv::new();
    env.write_file(".gitignore", "*.log\n!keep.log\n");
    env.write_file("drop.log", "needle\n");
    env.write_file("keep.log", "needle\n");

    let results = env.find_flat("needle");
    let files = results.unique_files();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("keep.log"));
}

#[test]
fn test_regex_search_with_columns() {
    let env = TestEnv::new();
    env.write_file("code.rs", "fn main() {\n    let x = 42;\n}\n");

    let results = env.find_flat(r"\d+");
    assert_eq!(results.count(), 1);
    assert_eq!(results.matches[0].line, 2);
    assert_eq!(results.matches[0].column, 13);
}

#[test]
fn test_multiple_matches_per_line() {
    let env = TestEnv::new();
    env.write_file("multi.txt", "ab xx ab yy ab\n");

    let results = env.find_flat("ab");
    assert_eq!(results.count(), 3);
    let cols: Vec<_> = results.matches.iter().map(|m| m.column).collect();
    assert_eq!(cols, vec![1, 7, 13]);
}

#[test]
fn test_matches_verifiable_against_file() {
    let env = TestEnv::new();
    env.write_file("verify.txt", "zero\nalpha beta\ngamma alpha\n");

    let results = env.find_flat("alpha");
    assert_eq!(results.count(), 2);
    for m in &results.matches {
        let content = fs::read_to_string(&m.file).unwrap();
        let line = content.lines().nth(m.line as usize - 1).unwrap();
        assert_eq!(line, m.content);
        let col = m.column as usize - 1;
        assert_eq!(&line[col..col + "alpha".len()], "alpha");
    }
}

#[test]
fn test_non_recursive_ignores_subdirs() {
    let env = TestEnv::new();
    env.write_file("top.txt", "needle\n");
    env.write_file("sub/inner.txt", "needle\n");

    let results = env.find_flat("needle");
    assert_eq!(results.count(), 1);
    assert!(results.matches[0].file.ends_with("top.txt"));
}

#[test]
fn test_glob_restricts_files() {
    let env = TestEnv::new();
    env.write_file("lib.rs", "needle\n");
    env.write_file("doc.md", "needle\n");

    let results = env
        .find(
            "needle",
            SearchConfig {
                file_glob: Some("*.rs".to_string()),
                ..SearchConfig::default()
            },
        )
        .unwrap();
    assert_eq!(results.count(), 1);
    assert!(results.matches[0].file.ends_with("lib.rs"));
}

#[test]
fn test_max_results_truncates() {
    let env = TestEnv::new();
    let mut content = String::new();
    for i in 0..100 {
        content.push_str(&format!("needle {i}\n"));
    }
    env.write_file("many.txt", &content);

    let results = env
        .find(
            "needle",
            SearchConfig {
                max_results: 10,
                ..SearchConfig::default()
            },
        )
        .unwrap();
    assert_eq!(results.count(), 10);
    assert_eq!(results.stats.matches_found, 10);
}

#[test]
fn test_matches_found_equals_len() {
    let env = TestEnv::new();
    env.write_file("a.txt", "x\nneedle\nx\nneedle\n");
    env.write_file("b.txt", "needle\n");

    let results = env.find_flat("needle");
    assert_eq!(results.stats.matches_found as usize, results.count());
}

#[test]
fn test_compressed_gzip_file_searched() {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let env = TestEnv::new();
    let file = std::fs::File::create(env.path("log.gz")).unwrap();
    let mut enc = GzEncoder::new(file, Compression::default());
    enc.write_all(b"plain line\ncompressed needle\n").unwrap();
    enc.finish().unwrap();

    let results = env.find_flat("compressed needle");
    assert_eq!(results.count(), 1);
    assert_eq!(results.matches[0].line, 2);
    assert_eq!(results.matches[0].content, "compressed needle");
}

#[test]
fn test_binary_files_not_searched() {
    let env = TestEnv::new();
    env.write_bytes("blob.weird", b"\x00\x01needle\x00\x02");
    env.write_file("ok.txt", "needle\n");

    let results = env.find_flat("needle");
    assert_eq!(results.count(), 1);
    assert!(results.matches[0].file.ends_with("ok.txt"));
    assert!(results.stats.files_skipped >= 1);
}

#[test]
fn test_unique_files_and_summary() {
    let env = TestEnv::new();
    env.write_file("a.txt", "needle\nneedle\n");
    env.write_file("b.txt", "needle\n");

    let results = env.find_flat("needle");
    assert_eq!(results.unique_files().len(), 2);
    let summary = results.summary();
    assert_eq!(summary.total_matches, 3);
    assert_eq!(summary.files_with_matches, 2);
}
