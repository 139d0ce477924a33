//! Shell Resolver
//!
//! Turns a shell kind and the user's command text into the interpreter
//! executable and its argument list. The command text is wrapped behind the
//! interpreter's "run one command and exit" switch without re-quoting.
//!
//! Resolution happens on every invocation: the shell kind and the path list
//! may both change between commands.

use std::ffi::{OsStr, OsString};
use std::path::PathBuf;

use crate::config::ShellConfig;
use crate::models::ShellKind;

/// Default primary interpreter for this platform
#[cfg(windows)]
pub const DEFAULT_PRIMARY_PROGRAM: &str = "cmd.exe";
#[cfg(not(windows))]
pub const DEFAULT_PRIMARY_PROGRAM: &str = "/bin/sh";

/// Switch telling the primary interpreter to run one command and exit
#[cfg(windows)]
pub const PRIMARY_SWITCHES: &[&str] = &["/c"];
#[cfg(not(windows))]
pub const PRIMARY_SWITCHES: &[&str] = &["-c"];

/// Alternate interpreter searched for on the path list
#[cfg(windows)]
pub const DEFAULT_ALTERNATE_PREFERRED: &str = "pwsh.exe";
#[cfg(not(windows))]
pub const DEFAULT_ALTERNATE_PREFERRED: &str = "pwsh";

/// Bare name used when the preferred alternate is not on the path list
#[cfg(windows)]
pub const DEFAULT_ALTERNATE_FALLBACK: &str = "powershell.exe";
#[cfg(not(windows))]
pub const DEFAULT_ALTERNATE_FALLBACK: &str = "powershell";

/// Skip profile loading, then run one command
pub const ALTERNATE_SWITCHES: &[&str] = &["-NoProfile", "-Command"];

/// Resolved interpreter and arguments for one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellInvocation {
    /// Full path, or a bare name left to the OS search
    pub program: PathBuf,
    /// Interpreter switches preceding the command text
    pub switches: Vec<String>,
    /// Command text exactly as typed
    pub command: String,
}

impl ShellInvocation {
    /// The switches followed by the command text, as one argument string
    pub fn argument_string(&self) -> String {
        let mut args = self.switches.join(" ");
        if !args.is_empty() {
            args.push(' ');
        }
        args.push_str(&self.command);
        args
    }
}

/// Where the path list comes from
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathList {
    /// Read `PATH` at resolution time
    Environment,
    /// Fixed list (tests, embedders)
    Fixed(OsString),
}

/// Picks the interpreter for each invocation
#[derive(Debug, Clone)]
pub struct ShellResolver {
    primary_program: PathBuf,
    alternate_preferred: String,
    alternate_fallback: String,
    path_list: PathList,
}

impl ShellResolver {
    /// Create a resolver with the platform defaults
    pub fn new() -> Self {
        Self::from_config(&ShellConfig::default())
    }

    /// Create a resolver from shell configuration
    pub fn from_config(config: &ShellConfig) -> Self {
        Self {
            primary_program: config
                .primary_program
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIMARY_PROGRAM)),
            alternate_preferred: config.alternate_preferred.clone(),
            alternate_fallback: config.alternate_fallback.clone(),
            path_list: PathList::Environment,
        }
    }

    /// Search `path_list` instead of the `PATH` environment variable
    pub fn with_path_list(mut self, path_list: impl Into<OsString>) -> Self {
        self.path_list = PathList::Fixed(path_list.into());
        self
    }

    /// Resolve the interpreter and arguments for `command`
    pub fn resolve(&self, kind: ShellKind, command: &str) -> ShellInvocation {
        let (program, switches) = match kind {
            ShellKind::Primary => (self.primary_program.clone(), PRIMARY_SWITCHES),
            ShellKind::Alternate => (self.alternate_program(), ALTERNATE_SWITCHES),
        };

        ShellInvocation {
            program,
            switches: switches.iter().map(|s| s.to_string()).collect(),
            command: command.to_string(),
        }
    }

    /// Preferred alternate interpreter if it is on the path list, else the
    /// fallback's bare name
    fn alternate_program(&self) -> PathBuf {
        let found = match &self.path_list {
            PathList::Environment => std::env::var_os("PATH")
                .and_then(|paths| find_in_path(&self.alternate_preferred, &paths)),
            PathList::Fixed(paths) => find_in_path(&self.alternate_preferred, paths),
        };

        match found {
            Some(path) => {
                trace!("Using alternate shell at {}", path.display());
                path
            }
            None => {
                trace!(
                    "'{}' not on path list, falling back to '{}'",
                    self.alternate_preferred,
                    self.alternate_fallback
                );
                PathBuf::from(&self.alternate_fallback)
            }
        }
    }
}

impl Default for ShellResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Find the first directory in `path_list` containing a file called `name`
pub fn find_in_path(name: &str, path_list: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(path_list)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
}
