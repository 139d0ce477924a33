//! slotshell - a slot-based shell command execution engine
//!
//! Each command a user types is one "slot": it runs through the platform
//! interpreter (or PowerShell) and its output is delivered either as one
//! merged text or line by line as it arrives.
//!
//! ## Module Organization
//!
//! - [`engine`] - The [`Engine`] facade: batch and streaming runs, session accessors
//! - [`execution`] - Spawning, concurrent stream draining, timeouts, process handles
//! - [`directory`] - The in-process `cd` pseudo-command
//! - [`shell`] - Interpreter resolution per shell kind
//! - [`session`] - Shared working directory and shell kind
//! - [`platform`] - Process-tree termination per host OS
//! - [`config`] - TOML configuration loading and validation
//! - [`models`] - Shell kinds, requests, outcomes, invocation states
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use slotshell::Engine;
//! use std::time::Duration;
//!
//! # async fn demo() -> slotshell::Result<()> {
//! let engine = Engine::new();
//!
//! let outcome = engine.run_batch("echo hello", Some(Duration::from_secs(5))).await?;
//! assert_eq!(outcome.text, "hello");
//!
//! engine
//!     .run_streaming("ls", |line| println!("{}", line), |_handle| {}, None)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Concurrency
//!
//! Every invocation spawns one child process. Its stdout and stderr are
//! drained by independent tasks while the runner races the exit wait
//! against the timeout, so a chatty child can never deadlock on a full pipe.
//! Timeouts and cancellation always hard-kill the child and every
//! descendant.
//!
//! The session is shared by all invocations of an engine. A `cd` is not
//! serialized against other running invocations: whichever read happens
//! first wins.

#[macro_use]
extern crate tracing;

pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod execution;
pub mod models;
pub mod platform;
pub mod session;
pub mod shell;

// Re-exports for core functionality
pub use config::{Config, ConfigLoader};
pub use engine::Engine;
pub use error::{Error, Result};
pub use execution::{ProcessHandle, TIMEOUT_MARKER_PREFIX};
pub use models::{InvocationOutcome, InvocationRequest, InvocationState, ShellKind};
pub use session::Session;

/// The current version of slotshell from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The application name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Load configuration from the default locations and build an engine.
///
/// A broken or invalid configuration file is reported and replaced by
/// defaults; the engine always starts.
pub fn init() -> Engine {
    info!("Initializing {} v{}", NAME, VERSION);

    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            warn!("Failed to load configuration: {}. Using defaults", e);
            Config::default()
        }
    };

    init_with_config(&config)
}

/// Build an engine from an already loaded configuration
pub fn init_with_config(config: &Config) -> Engine {
    let engine = Engine::from_config(config);
    info!(
        "Engine ready in {} ({} shell)",
        engine.current_directory().display(),
        engine.shell_kind()
    );
    engine
}
