//! Sliding-window reader tests through the public facade.
//!
//! Forces the streaming threshold low so ordinary test files take the
//! chunked path, then checks equivalence with the plain reader,
//! boundary deduplication, and progress reporting.

mod common;

use common::{sorted, TestEnv};
use linehound::SearchConfig;
use std::sync::{Arc, Mutex};

/// Streaming with small windows; mmap disabled so the streaming path
/// actually runs.
fn streaming_config() -> SearchConfig {
    SearchConfig {
        streaming_enabled: true,
        streaming_threshold_bytes: 1,
        use_mmap: false,
        chunk_size: 64 * 1024,
        min_chunk_size: 64 * 1024,
        max_chunk_size: 64 * 1024,
        overlap_size: 64 * 1024,
        ..SearchConfig::default()
    }
}

fn plain_config() -> SearchConfig {
    SearchConfig {
        streaming_enabled: false,
        use_mmap: false,
        ..SearchConfig::default()
    }
}

fn big_file_content(needle_lines: &[usize], total: usize) -> String {
    let mut content = String::with_capacity(total * 32);
    for i in 0..total {
        if needle_lines.contains(&i) {
            content.push_str(&format!("line {i} carries the XYZPQR token\n"));
        } else {
            content.push_str(&format!("line {i} is ordinary filler text\n"));
        }
    }
    content
}

#[test]
fn test_streaming_and_plain_agree() {
    let env = TestEnv::new();
    env.write_file(
        "big.txt",
        &big_file_content(&[3, 1000, 4999, 70000], 80_000),
    );

    let streamed = env.find("XYZPQR", streaming_config()).unwrap();
    let plain = env.find("XYZPQR", plain_config()).unwrap();

    assert_eq!(sorted(&streamed), sorted(&plain));
    assert_eq!(streamed.count(), 4);
}

#[test]
fn test_boundary_match_reported_once() {
    // A ~2 MiB file whose only occurrence straddles the 64 KiB chunk
    // edge: a long first line ends just short of it.
    let env = TestEnv::new();
    let chunk = 64 * 1024;
    let mut content = String::new();
    content.push_str(&"x".repeat(chunk - 10));
    content.push('\n');
    content.push_str("prefix XYZPQR suffix\n");
    while content.len() < 2 * 1024 * 1024 {
        content.push_str("nothing to see on this filler line\n");
    }
    env.write_file("straddle.txt", &content);

    let results = env.find("XYZPQR", streaming_config()).unwrap();
    assert_eq!(results.count(), 1);
    assert_eq!(results.matches[0].line, 2);
    assert_eq!(results.matches[0].column, 8);
}

#[test]
fn test_streaming_line_numbers_match_file() {
    let env = TestEnv::new();
    env.write_file("numbered.txt", &big_file_content(&[12345], 20_000));

    let results = env.find("XYZPQR", streaming_config()).unwrap();
    assert_eq!(results.count(), 1);
    // Line index 12345 is the 12346th line.
    assert_eq!(results.matches[0].line, 12346);
}

#[test]
fn test_streaming_context_across_chunks() {
    let env = TestEnv::new();
    env.write_file("ctx.txt", &big_file_content(&[9000], 20_000));

    let config = SearchConfig {
        context_lines: 2,
        ..streaming_config()
    };
    let results = env.find("XYZPQR", config).unwrap();
    assert_eq!(results.count(), 1);
    let m = &results.matches[0];
    let ctx: Vec<_> = m.context.iter().map(|c| c.line).collect();
    assert_eq!(ctx, vec![8999, 9000, 9002, 9003]);
}

#[test]
fn test_progress_monotone_ends_at_total() {
    let env = TestEnv::new();
    let content = big_file_content(&[], 50_000);
    env.write_file("tracked.txt", &content);
    let total = content.len() as u64;

    let seen: Arc<Mutex<Vec<(u64, u64, f64)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let config = SearchConfig {
        on_progress: Some(Arc::new(move |bytes, total, percent| {
            sink.lock().unwrap().push((bytes, total, percent));
        })),
        ..streaming_config()
    };

    env.find("XYZPQR", config).unwrap();

    let seen = seen.lock().unwrap();
    assert!(seen.len() > 1, "expected one callback per chunk");
    assert!(seen.windows(2).all(|w| w[0].0 <= w[1].0));
    let last = seen.last().unwrap();
    assert_eq!(last.0, total);
    assert_eq!(last.1, total);
    assert!((last.2 - 100.0).abs() < f64::EPSILON);
}

#[test]
fn test_detailed_progress_counts_chunks() {
    let env = TestEnv::new();
    env.write_file("chunky.txt", &big_file_content(&[100], 50_000));

    let chunks: Arc<Mutex<Vec<u64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&chunks);
    let config = SearchConfig {
        on_progress_detailed: Some(Arc::new(move |info| {
            sink.lock().unwrap().push(info.chunks_processed);
        })),
        ..streaming_config()
    };

    env.find("XYZPQR", config).unwrap();

    let chunks = chunks.lock().unwrap();
    assert!(chunks.len() > 1);
    // Strictly increasing chunk counter, one callback per chunk.
    assert!(chunks.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn test_mmap_path_agrees_with_plain() {
    let env = TestEnv::new();
    env.write_file("mapped.txt", &big_file_content(&[5, 60_000], 70_000));

    let mmap_config = SearchConfig {
        use_mmap: true,
        mmap_min_bytes: 1,
        streaming_enabled: false,
        ..SearchConfig::default()
    };
    let mapped = env.find("XYZPQR", mmap_config).unwrap();
    let plain = env.find("XYZPQR", plain_config()).unwrap();
    assert_eq!(sorted(&mapped), sorted(&plain));
    assert_eq!(mapped.count(), 2);
}
