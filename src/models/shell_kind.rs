//! Shell Kind Definitions
//!
//! The two interpreter families a session can run commands through.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which interpreter family the session invokes commands with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShellKind {
    /// The platform's default command interpreter (`cmd.exe`, `/bin/sh`)
    #[default]
    Primary,
    /// PowerShell, preferring `pwsh` when it is on the path list
    Alternate,
}

impl ShellKind {
    /// Get a string representation of the shell kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ShellKind::Primary => "primary",
            ShellKind::Alternate => "alternate",
        }
    }

    /// Parse a shell kind (case-insensitive). Accepts the interpreter
    /// names as aliases.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "primary" | "cmd" | "sh" => Some(ShellKind::Primary),
            "alternate" | "powershell" | "pwsh" => Some(ShellKind::Alternate),
            _ => None,
        }
    }

    /// The other kind
    pub fn toggled(&self) -> Self {
        match self {
            ShellKind::Primary => ShellKind::Alternate,
            ShellKind::Alternate => ShellKind::Primary,
        }
    }
}

impl fmt::Display for ShellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
