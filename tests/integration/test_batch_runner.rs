//! Integration tests for the Batch Runner
//!
//! These run real commands through the platform interpreter, so they are
//! limited to unix hosts where `/bin/sh` and `sleep` are known to exist.

#![cfg(unix)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use slotshell::config::{ExecutionConfig, ShellConfig};
use slotshell::shell::ShellResolver;
use slotshell::{Engine, Error, Session, ShellKind, TIMEOUT_MARKER_PREFIX};
use tempfile::TempDir;

fn engine_in(temp: &TempDir) -> Engine {
    Engine::with_session(Arc::new(Session::new(
        temp.path().to_path_buf(),
        ShellKind::Primary,
    )))
}

/// State of a process from /proc, `None` once it is gone
#[cfg(target_os = "linux")]
fn process_state(pid: u32) -> Option<char> {
    let stat = std::fs::read_to_string(format!("/proc/{}/stat", pid)).ok()?;
    let after_name = stat.rfind(')')?;
    stat[after_name + 1..].trim_start().chars().next()
}

#[tokio::test]
async fn test_echo_returns_trimmed_output() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("echo hello", None).await.unwrap();
    assert_eq!(outcome.text, "hello");
}

#[tokio::test]
async fn test_stdout_precedes_stderr() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine
        .run_batch("echo err 1>&2; echo out", Some(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(outcome.text, "out\nerr");
}

#[tokio::test]
async fn test_stderr_only_has_no_leading_newline() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("echo oops 1>&2", None).await.unwrap();
    assert_eq!(outcome.text, "oops");
}

#[tokio::test]
async fn test_nonzero_exit_is_not_an_error() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("echo partial; exit 3", None).await.unwrap();
    assert_eq!(outcome.text, "partial");
}

#[tokio::test]
async fn test_runs_in_session_directory() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("marker.txt"), "x").unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("ls", None).await.unwrap();
    assert!(outcome.text.contains("marker.txt"));
}

#[tokio::test]
async fn test_timeout_kills_and_appends_marker() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let start = Instant::now();
    let outcome = engine
        .run_batch("echo started; sleep 30", Some(Duration::from_millis(500)))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(outcome.text.starts_with("started\n"));
    assert!(outcome.text.ends_with("[timed out after 500ms]"));
}

#[tokio::test]
async fn test_timeout_with_no_output_is_marker_only() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine
        .run_batch("sleep 30", Some(Duration::from_secs(1)))
        .await
        .unwrap();
    assert_eq!(outcome.text, "[timed out after 1s]");
}

#[tokio::test]
async fn test_timeout_kills_grandchildren_holding_pipes() {
    let temp = TempDir::new().unwrap();
    // A long grace means only the tree kill can close the pipes quickly
    let engine = engine_in(&temp).with_execution_config(ExecutionConfig {
        drain_grace_ms: 20_000,
        ..ExecutionConfig::default()
    });

    let start = Instant::now();
    let outcome = engine
        .run_batch("sleep 30 & echo $!; wait", Some(Duration::from_millis(500)))
        .await
        .unwrap();

    assert!(start.elapsed() < Duration::from_secs(10));
    assert!(outcome.text.contains(TIMEOUT_MARKER_PREFIX));

    #[cfg(target_os = "linux")]
    {
        let pid: u32 = outcome.text.lines().next().unwrap().trim().parse().unwrap();
        let deadline = Instant::now() + Duration::from_secs(3);
        loop {
            match process_state(pid) {
                None | Some('Z') | Some('X') => break,
                Some(state) if Instant::now() >= deadline => {
                    panic!("grandchild {} still alive in state {}", pid, state)
                }
                Some(_) => tokio::time::sleep(Duration::from_millis(50)).await,
            }
        }
    }
}

#[tokio::test]
async fn test_finished_command_is_not_annotated() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine
        .run_batch("echo quick", Some(Duration::from_secs(10)))
        .await
        .unwrap();
    assert_eq!(outcome.text, "quick");
    assert!(!outcome.text.contains(TIMEOUT_MARKER_PREFIX));
}

#[tokio::test]
async fn test_spawn_failure_is_an_error() {
    let temp = TempDir::new().unwrap();
    let resolver = ShellResolver::from_config(&ShellConfig {
        primary_program: Some(PathBuf::from("/nonexistent/slotshell-test-sh")),
        ..ShellConfig::default()
    });
    let engine = engine_in(&temp).with_resolver(resolver);

    let result = engine.run_batch("echo hello", None).await;
    assert!(matches!(result, Err(Error::CommandSpawnFailed { .. })));
}

#[tokio::test]
async fn test_empty_command_is_rejected() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    assert!(matches!(engine.run_batch("   ", None).await, Err(Error::EmptyCommand)));
}

#[tokio::test]
async fn test_cd_changes_directory_of_later_commands() {
    let temp = TempDir::new().unwrap();
    std::fs::create_dir(temp.path().join("inner")).unwrap();
    std::fs::write(temp.path().join("inner").join("only-here.txt"), "x").unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("cd inner", None).await.unwrap();
    assert_eq!(outcome.text, temp.path().join("inner").display().to_string());

    let listing = engine.run_batch("ls", None).await.unwrap();
    assert!(listing.text.contains("only-here.txt"));
}

#[tokio::test]
async fn test_cd_to_missing_directory_reports_and_stays() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("cd missing-dir", None).await.unwrap();
    assert_eq!(outcome.text, "cd: cannot find path 'missing-dir'");
    assert_eq!(engine.current_directory(), temp.path());
}

#[tokio::test]
async fn test_concurrent_runs_are_independent() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let slow = engine.run_batch("sleep 1; echo slow", Some(Duration::from_secs(10)));
    let fast = engine.run_batch("echo fast", Some(Duration::from_secs(10)));
    let (slow, fast) = tokio::join!(slow, fast);

    assert_eq!(slow.unwrap().text, "slow");
    assert_eq!(fast.unwrap().text, "fast");
}

#[tokio::test]
async fn test_shell_kind_change_applies_to_later_runs() {
    let temp = TempDir::new().unwrap();
    // Neither alternate interpreter can be found or spawned
    let resolver = ShellResolver::from_config(&ShellConfig {
        alternate_preferred: "slotshell-no-such-pwsh".to_string(),
        alternate_fallback: "slotshell-no-such-powershell".to_string(),
        ..ShellConfig::default()
    })
    .with_path_list("");
    let engine = engine_in(&temp).with_resolver(resolver);

    let running = engine.clone();
    let first = tokio::spawn(async move {
        running
            .run_batch("sleep 1; echo primary", Some(Duration::from_secs(10)))
            .await
    });

    tokio::time::sleep(Duration::from_millis(200)).await;
    engine.set_shell_kind(ShellKind::Alternate);

    assert_eq!(first.await.unwrap().unwrap().text, "primary");

    let later = engine.run_batch("echo later", None).await;
    assert!(matches!(later, Err(Error::CommandSpawnFailed { .. })));
}

#[tokio::test]
async fn test_unbounded_timeout_runs_normally() {
    let temp = TempDir::new().unwrap();
    let engine = engine_in(&temp);

    let outcome = engine.run_batch("echo hi", Some(Duration::MAX)).await.unwrap();
    assert_eq!(outcome.text, "hi");
}
