//! Unit tests for the `cd` Directory Resolver

use std::sync::Arc;

use slotshell::directory::{parse_cd, resolve, resolve_to_text};
use slotshell::{Error, Session, ShellKind};
use tempfile::TempDir;

struct Fixture {
    home: TempDir,
    work: TempDir,
    session: Arc<Session>,
}

impl Fixture {
    /// Session whose home is one temp dir and whose working directory is another
    fn new() -> Self {
        let home = TempDir::new().unwrap();
        let work = TempDir::new().unwrap();
        let session = Arc::new(Session::new(home.path().to_path_buf(), ShellKind::Primary));
        resolve(work.path().to_str().unwrap(), &session).unwrap();
        Self { home, work, session }
    }

    fn cd(&self, command: &str) -> String {
        let argument = parse_cd(command).expect("not a cd command");
        resolve_to_text(argument, &self.session)
    }
}

#[test]
fn test_bare_cd_goes_home() {
    let fixture = Fixture::new();
    assert_eq!(fixture.session.current_directory(), fixture.work.path());

    let text = fixture.cd("cd");
    assert_eq!(text, fixture.home.path().display().to_string());
    assert_eq!(fixture.session.current_directory(), fixture.home.path());
}

#[test]
fn test_empty_quoted_target_stays_put() {
    let fixture = Fixture::new();
    std::fs::create_dir(fixture.work.path().join("sub")).unwrap();
    fixture.cd("cd sub");

    let text = fixture.cd("cd \"\"");
    let sub = fixture.work.path().join("sub");
    assert_eq!(text, sub.display().to_string());
    assert_eq!(fixture.session.current_directory(), sub);
}

#[test]
fn test_tilde_goes_home() {
    let fixture = Fixture::new();
    fixture.cd("cd ~");
    assert_eq!(fixture.session.current_directory(), fixture.home.path());
}

#[test]
fn test_relative_and_parent() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.work.path().join("a").join("b")).unwrap();

    fixture.cd("cd a/b");
    assert_eq!(
        fixture.session.current_directory(),
        fixture.work.path().join("a").join("b")
    );

    fixture.cd("cd ..");
    assert_eq!(fixture.session.current_directory(), fixture.work.path().join("a"));
}

#[test]
fn test_quoted_target_with_spaces() {
    let fixture = Fixture::new();
    std::fs::create_dir(fixture.work.path().join("with space")).unwrap();

    let text = fixture.cd("cd \"with space\"");
    assert_eq!(
        text,
        fixture.work.path().join("with space").display().to_string()
    );
}

#[test]
fn test_drive_flag_is_ignored() {
    let fixture = Fixture::new();
    std::fs::create_dir(fixture.work.path().join("target")).unwrap();

    fixture.cd("CD /D target");
    assert_eq!(
        fixture.session.current_directory(),
        fixture.work.path().join("target")
    );
}

#[test]
fn test_absolute_target() {
    let fixture = Fixture::new();
    let elsewhere = TempDir::new().unwrap();

    fixture.cd(&format!("cd {}", elsewhere.path().display()));
    assert_eq!(fixture.session.current_directory(), elsewhere.path());
}

#[test]
fn test_missing_target_reports_and_keeps_directory() {
    let fixture = Fixture::new();

    let text = fixture.cd("cd \"no such place\"");
    assert_eq!(text, "cd: cannot find path 'no such place'");
    assert_eq!(fixture.session.current_directory(), fixture.work.path());

    let err = resolve("nowhere", &fixture.session).unwrap_err();
    assert!(matches!(err, Error::PathNotFound { .. }));
}

#[test]
fn test_file_is_not_a_directory() {
    let fixture = Fixture::new();
    std::fs::write(fixture.work.path().join("plain.txt"), "x").unwrap();

    let text = fixture.cd("cd plain.txt");
    assert_eq!(text, "cd: cannot find path 'plain.txt'");
    assert_eq!(fixture.session.current_directory(), fixture.work.path());
}

#[test]
fn test_other_commands_are_not_cd() {
    assert_eq!(parse_cd("cdrom"), None);
    assert_eq!(parse_cd("ls cd"), None);
    assert_eq!(parse_cd("cd.."), None);
    assert_eq!(parse_cd("Cd x"), Some("x"));
}
