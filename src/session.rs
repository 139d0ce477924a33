//! Session State
//!
//! The shared cursor every invocation reads: current working directory and
//! selected shell kind. One session is owned by an engine and shared by
//! reference with every invocation it runs.
//!
//! Reads and writes are individually consistent but a `cd` is not
//! serialized against other invocations. An invocation that spawns while a
//! `cd` resolves sees whichever directory was stored first.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::directory;
use crate::models::ShellKind;

/// Working directory and shell kind shared by all invocations of an engine
#[derive(Debug)]
pub struct Session {
    /// Always an existing absolute directory
    working_directory: RwLock<PathBuf>,
    /// Interpreter family for new invocations
    shell_kind: RwLock<ShellKind>,
    /// Target of bare `cd` and `cd ~`
    home: PathBuf,
}

impl Session {
    /// Create a session rooted at `home`. A relative `home` is taken
    /// against the process working directory.
    pub fn new(home: PathBuf, shell_kind: ShellKind) -> Self {
        let home = absolute(&home);
        Self {
            working_directory: RwLock::new(home.clone()),
            shell_kind: RwLock::new(shell_kind),
            home,
        }
    }

    /// Create a session from the user's home directory, falling back to the
    /// process working directory when no home is known
    pub fn from_env(shell_kind: ShellKind) -> Self {
        let home = dirs::home_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("/"));
        Self::new(home, shell_kind)
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn current_directory(&self) -> PathBuf {
        match self.working_directory.read() {
            Ok(dir) => dir.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the working directory. Callers are responsible for checking
    /// the directory exists.
    pub(crate) fn set_current_directory(&self, dir: PathBuf) {
        let dir = absolute(&dir);
        debug!("Session working directory -> {}", dir.display());
        match self.working_directory.write() {
            Ok(mut current) => *current = dir,
            Err(poisoned) => *poisoned.into_inner() = dir,
        }
    }

    pub fn shell_kind(&self) -> ShellKind {
        match self.shell_kind.read() {
            Ok(kind) => *kind,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn set_shell_kind(&self, kind: ShellKind) {
        debug!("Session shell kind -> {}", kind);
        match self.shell_kind.write() {
            Ok(mut current) => *current = kind,
            Err(poisoned) => *poisoned.into_inner() = kind,
        }
    }
}

/// `path` made absolute and normalized against the process working directory
fn absolute(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return directory::normalize(path, Path::new(""));
    }
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    directory::normalize(&base, path)
}
