//! Large output tests
//!
//! A child that fills both pipes must never deadlock the runners.

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use slotshell::{Engine, InvocationState, Session, ShellKind, TIMEOUT_MARKER_PREFIX};
use tempfile::TempDir;

/// 50,000 lines on each stream, well past any pipe buffer
const BOTH_STREAMS: &str = "yes out | head -n 50000; yes err | head -n 50000 1>&2";

fn engine_in(temp: &TempDir) -> Engine {
    Engine::with_session(Arc::new(Session::new(
        temp.path().to_path_buf(),
        ShellKind::Primary,
    )))
}

#[tokio::test]
async fn test_batch_captures_both_full_streams() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine
        .run_batch(BOTH_STREAMS, Some(Duration::from_secs(60)))
        .await
        .unwrap();

    assert!(!outcome.text.contains(TIMEOUT_MARKER_PREFIX));
    let lines: Vec<&str> = outcome.text.lines().collect();
    assert_eq!(lines.len(), 100_000);
    assert!(lines[..50_000].iter().all(|line| *line == "out"));
    assert!(lines[50_000..].iter().all(|line| *line == "err"));
}

#[tokio::test]
async fn test_batch_interleaved_writers() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    // stderr fills first while stdout is still being written
    let outcome = engine
        .run_batch(
            "yes e | head -c 200000 1>&2; yes o | head -c 200000",
            Some(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(outcome.text.len(), 399_999);
    assert!(outcome.text.starts_with("o\n"));
    assert!(outcome.text.ends_with("\ne"));
}

#[tokio::test]
async fn test_streaming_delivers_every_line() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let mut out = 0usize;
    let mut err = 0usize;
    let state = engine
        .run_streaming(
            BOTH_STREAMS,
            |line| match line.as_str() {
                "out" => out += 1,
                "err" => err += 1,
                other => panic!("unexpected line {:?}", other),
            },
            |_| {},
            Some(Duration::from_secs(60)),
        )
        .await
        .unwrap();

    assert_eq!(state, InvocationState::Completed);
    assert_eq!(out, 50_000);
    assert_eq!(err, 50_000);
}
