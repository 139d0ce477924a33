//! Configuration management for slotshell
//!
//! Execution defaults (timeout, drain window, starting shell kind and
//! directory), interpreter overrides and logging level, loaded from TOML.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Error;
use crate::models::ShellKind;
use crate::shell::{DEFAULT_ALTERNATE_FALLBACK, DEFAULT_ALTERNATE_PREFERRED};

pub use loader::ConfigLoader;

/// Largest accepted drain window
pub const MAX_DRAIN_GRACE_MS: u64 = 60_000;

/// Main configuration structure for slotshell
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Invocation defaults
    pub execution: ExecutionConfig,

    /// Interpreter selection
    pub shell: ShellConfig,

    /// Logging
    pub logging: LoggingConfig,
}

impl Config {
    /// Check field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.execution.validate()?;
        self.shell.validate()
    }
}

/// Invocation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Timeout applied when the caller passes none (None = unlimited)
    pub default_timeout_ms: Option<u64>,

    /// Bounded wait for stream reads after exit or kill
    pub drain_grace_ms: u64,

    /// Shell kind a new session starts with
    pub shell_kind: ShellKind,

    /// Starting directory (defaults to home)
    pub start_directory: Option<PathBuf>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: None,
            drain_grace_ms: 2000,
            shell_kind: ShellKind::Primary,
            start_directory: None,
        }
    }
}

impl ExecutionConfig {
    pub fn default_timeout(&self) -> Option<Duration> {
        self.default_timeout_ms.map(Duration::from_millis)
    }

    pub fn drain_grace(&self) -> Duration {
        Duration::from_millis(self.drain_grace_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.drain_grace_ms == 0 || self.drain_grace_ms > MAX_DRAIN_GRACE_MS {
            return Err(ConfigError::InvalidDrainGrace(self.drain_grace_ms));
        }
        if self.default_timeout_ms == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        if let Some(dir) = &self.start_directory {
            if !dir.is_dir() {
                return Err(ConfigError::StartDirectoryNotFound(dir.clone()));
            }
        }
        Ok(())
    }
}

/// Interpreter selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Override for the primary interpreter
    pub primary_program: Option<PathBuf>,

    /// Alternate interpreter searched for on the path list
    pub alternate_preferred: String,

    /// Bare alternate interpreter name used when the preferred one is missing
    pub alternate_fallback: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            primary_program: None,
            alternate_preferred: DEFAULT_ALTERNATE_PREFERRED.to_string(),
            alternate_fallback: DEFAULT_ALTERNATE_FALLBACK.to_string(),
        }
    }
}

impl ShellConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.alternate_preferred.trim().is_empty() {
            return Err(ConfigError::EmptyShellName("alternate_preferred"));
        }
        if self.alternate_fallback.trim().is_empty() {
            return Err(ConfigError::EmptyShellName("alternate_fallback"));
        }
        if let Some(program) = &self.primary_program {
            if program.as_os_str().is_empty() {
                return Err(ConfigError::EmptyShellName("primary_program"));
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid drain grace: {0}ms (must be between 1 and 60000)")]
    InvalidDrainGrace(u64),

    #[error("Default timeout must be greater than 0")]
    ZeroTimeout,

    #[error("Start directory not found: {0}")]
    StartDirectoryNotFound(PathBuf),

    #[error("Shell name '{0}' cannot be empty")]
    EmptyShellName(&'static str),
}

impl ConfigError {
    /// Dotted name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::InvalidDrainGrace(_) => "execution.drain_grace_ms",
            ConfigError::ZeroTimeout => "execution.default_timeout_ms",
            ConfigError::StartDirectoryNotFound(_) => "execution.start_directory",
            ConfigError::EmptyShellName("alternate_preferred") => "shell.alternate_preferred",
            ConfigError::EmptyShellName("alternate_fallback") => "shell.alternate_fallback",
            ConfigError::EmptyShellName(_) => "shell.primary_program",
        }
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Error::ConfigValidationFailed {
            field: err.field().to_string(),
            reason: err.to_string(),
        }
    }
}
