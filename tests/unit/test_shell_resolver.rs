//! Unit tests for the Shell Resolver

use std::path::PathBuf;

use slotshell::config::ShellConfig;
use slotshell::shell::{find_in_path, ShellResolver, ALTERNATE_SWITCHES, PRIMARY_SWITCHES};
use slotshell::ShellKind;
use tempfile::TempDir;

/// Temp dir holding an empty file called `name`
fn dir_with(name: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join(name), "").unwrap();
    dir
}

fn joined(dirs: &[&std::path::Path]) -> std::ffi::OsString {
    std::env::join_paths(dirs).unwrap()
}

#[test]
fn test_primary_uses_configured_program() {
    let resolver = ShellResolver::from_config(&ShellConfig {
        primary_program: Some(PathBuf::from("/opt/custom/sh")),
        ..ShellConfig::default()
    });

    let invocation = resolver.resolve(ShellKind::Primary, "dir");
    assert_eq!(invocation.program, PathBuf::from("/opt/custom/sh"));
    assert_eq!(invocation.switches, PRIMARY_SWITCHES);
    assert_eq!(invocation.command, "dir");
}

#[test]
fn test_alternate_prefers_first_match_on_path() {
    let first = dir_with("pwsh-test");
    let second = dir_with("pwsh-test");
    let resolver = ShellResolver::from_config(&ShellConfig {
        alternate_preferred: "pwsh-test".to_string(),
        alternate_fallback: "powershell-test".to_string(),
        ..ShellConfig::default()
    })
    .with_path_list(joined(&[first.path(), second.path()]));

    let invocation = resolver.resolve(ShellKind::Alternate, "Get-Date");
    assert_eq!(invocation.program, first.path().join("pwsh-test"));
    assert_eq!(invocation.switches, ALTERNATE_SWITCHES);
    assert_eq!(invocation.command, "Get-Date");
}

#[test]
fn test_alternate_falls_back_to_bare_name() {
    let empty = TempDir::new().unwrap();
    let resolver = ShellResolver::from_config(&ShellConfig {
        alternate_preferred: "pwsh-test".to_string(),
        alternate_fallback: "powershell-test".to_string(),
        ..ShellConfig::default()
    })
    .with_path_list(joined(&[empty.path()]));

    let invocation = resolver.resolve(ShellKind::Alternate, "Get-Date");
    assert_eq!(invocation.program, PathBuf::from("powershell-test"));
}

#[test]
fn test_find_in_path_ignores_directories_and_empty_entries() {
    let holder = TempDir::new().unwrap();
    std::fs::create_dir(holder.path().join("pwsh-test")).unwrap();
    let real = dir_with("pwsh-test");

    let mut list = std::ffi::OsString::new();
    list.push(joined(&[holder.path()]));
    list.push(if cfg!(windows) { ";;" } else { "::" });
    list.push(joined(&[real.path()]));

    assert_eq!(
        find_in_path("pwsh-test", &list),
        Some(real.path().join("pwsh-test"))
    );
    assert_eq!(find_in_path("pwsh-test", std::ffi::OsStr::new("")), None);
}

#[test]
fn test_resolution_follows_path_changes() {
    let dir = TempDir::new().unwrap();
    let list = joined(&[dir.path()]);
    let resolver = ShellResolver::from_config(&ShellConfig {
        alternate_preferred: "late-pwsh".to_string(),
        alternate_fallback: "fallback".to_string(),
        ..ShellConfig::default()
    })
    .with_path_list(list);

    assert_eq!(
        resolver.resolve(ShellKind::Alternate, "x").program,
        PathBuf::from("fallback")
    );

    std::fs::write(dir.path().join("late-pwsh"), "").unwrap();
    assert_eq!(
        resolver.resolve(ShellKind::Alternate, "x").program,
        dir.path().join("late-pwsh")
    );
}

#[test]
fn test_argument_string_appends_command_verbatim() {
    let invocation = ShellResolver::new().resolve(ShellKind::Alternate, "Write-Output \"a  b\"");
    assert!(invocation
        .argument_string()
        .ends_with("-NoProfile -Command Write-Output \"a  b\""));
}
