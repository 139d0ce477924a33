//! Directory Resolver
//!
//! Interprets the `cd` pseudo-command against a [`Session`]. No process is
//! spawned: the target is normalized lexically, checked for existence and,
//! when it exists, stored as the session's working directory.

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::session::Session;

/// Drive-change flag accepted (and ignored) before the target, as in `cd /d C:\`
const DRIVE_FLAG: &str = "/d ";

/// If `command` is the `cd` pseudo-command, return its argument text
/// (empty for a bare `cd`).
///
/// Only `cd` on its own or followed by whitespace matches; `cdrom` and
/// `cd..` are left for the interpreter.
pub fn parse_cd(command: &str) -> Option<&str> {
    let trimmed = command.trim();
    let head = trimmed.get(..2)?;
    if !head.eq_ignore_ascii_case("cd") {
        return None;
    }

    let rest = &trimmed[2..];
    if rest.is_empty() {
        Some("")
    } else if rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

/// Reduce a `cd` argument to the target text the user meant: drive flag
/// stripped, one layer of symmetric double quotes removed.
pub fn target_text(argument: &str) -> &str {
    let mut target = argument.trim();

    if target
        .get(..DRIVE_FLAG.len())
        .is_some_and(|flag| flag.eq_ignore_ascii_case(DRIVE_FLAG))
    {
        target = target[DRIVE_FLAG.len()..].trim();
    }

    if target.len() >= 2 && target.starts_with('"') && target.ends_with('"') {
        target = &target[1..target.len() - 1];
    }

    target
}

/// Join `target` onto `base` and resolve `.`/`..` lexically.
///
/// An absolute `target` replaces `base`. `..` never climbs above the root.
/// Symlinks are not followed.
pub fn normalize(base: &Path, target: &Path) -> PathBuf {
    let joined = base.join(target);
    let mut normalized = PathBuf::new();

    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {
                normalized.push(component.as_os_str());
            }
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            Component::Normal(name) => normalized.push(name),
        }
    }

    normalized
}

/// Resolve a `cd` argument against the session.
///
/// On success the session's working directory is updated and the new path
/// returned. A missing target leaves the session untouched and yields
/// [`Error::PathNotFound`] carrying the target as typed.
pub fn resolve(argument: &str, session: &Session) -> Result<PathBuf> {
    let target = target_text(argument);

    // Only a bare `cd` goes home; `cd ""` stays put
    if argument.trim().is_empty() || target == "~" {
        let home = session.home().to_path_buf();
        session.set_current_directory(home.clone());
        return Ok(home);
    }

    let candidate = normalize(&session.current_directory(), Path::new(target));
    if candidate.is_dir() {
        session.set_current_directory(candidate.clone());
        Ok(candidate)
    } else {
        debug!("cd target '{}' not found ({})", target, candidate.display());
        Err(Error::PathNotFound {
            target: target.to_string(),
        })
    }
}

/// Resolve a `cd` argument and render the result as output text: the new
/// directory, or the not-found message.
pub fn resolve_to_text(argument: &str, session: &Session) -> String {
    match resolve(argument, session) {
        Ok(path) => path.display().to_string(),
        Err(err) => err.to_string(),
    }
}
