//! Command execution engine
//!
//! The caller-facing facade. An [`Engine`] owns one [`Session`] and runs
//! commands against it in batch or streaming mode. Clones share the
//! session, so several slots can run at once against one working directory.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ExecutionConfig};
use crate::error::Result;
use crate::execution::{batch, streaming, ExecutionContext, ProcessHandle};
use crate::models::{InvocationOutcome, InvocationRequest, InvocationState, ShellKind};
use crate::platform::{Platform, ProcessTreeOps};
use crate::session::Session;
use crate::shell::ShellResolver;

/// Runs shell commands against a shared session
#[derive(Clone)]
pub struct Engine {
    session: Arc<Session>,
    resolver: ShellResolver,
    execution: ExecutionConfig,
    process_tree: Arc<dyn ProcessTreeOps>,
}

impl Engine {
    /// Create an engine with default configuration, rooted at the user's
    /// home directory
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Create an engine from configuration
    pub fn from_config(config: &Config) -> Self {
        let session = Session::from_env(config.execution.shell_kind);
        if let Some(dir) = &config.execution.start_directory {
            if dir.is_dir() {
                session.set_current_directory(dir.clone());
            } else {
                warn!("Start directory {} not found, staying home", dir.display());
            }
        }

        Self {
            session: Arc::new(session),
            resolver: ShellResolver::from_config(&config.shell),
            execution: config.execution.clone(),
            process_tree: Arc::from(Platform::process_tree()),
        }
    }

    /// Create an engine over an existing session
    pub fn with_session(session: Arc<Session>) -> Self {
        Self {
            session,
            ..Self::new()
        }
    }

    /// Replace the shell resolver
    pub fn with_resolver(mut self, resolver: ShellResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replace the execution defaults
    pub fn with_execution_config(mut self, execution: ExecutionConfig) -> Self {
        self.execution = execution;
        self
    }

    /// Replace the process-tree implementation used to kill children
    pub fn with_process_tree(mut self, process_tree: Arc<dyn ProcessTreeOps>) -> Self {
        self.process_tree = process_tree;
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn current_directory(&self) -> PathBuf {
        self.session.current_directory()
    }

    pub fn shell_kind(&self) -> ShellKind {
        self.session.shell_kind()
    }

    /// Switch shell kind. Invocations already running keep the interpreter
    /// they were started with.
    pub fn set_shell_kind(&self, kind: ShellKind) {
        self.session.set_shell_kind(kind);
    }

    /// Run a command to completion and return its merged output.
    ///
    /// `cd` is resolved in-process. A timeout kills the whole process tree
    /// and returns the captured output with a timeout marker; it is not an
    /// error. Spawn failures are.
    pub async fn run_batch(
        &self,
        command: &str,
        timeout: Option<Duration>,
    ) -> Result<InvocationOutcome> {
        let timeout = self.effective_timeout(timeout);
        batch::run_batch(&self.context(), command, timeout).await
    }

    /// Run an [`InvocationRequest`] in batch mode
    pub async fn run_request(&self, request: &InvocationRequest) -> Result<InvocationOutcome> {
        self.run_batch(&request.command, request.timeout).await
    }

    /// Run a command, delivering each output line to `on_line` as it
    /// arrives.
    ///
    /// `on_handle` receives the live handle right after spawn and `None`
    /// once the invocation finalizes. Killing the handle ends the run
    /// without any extra line; a timeout appends one marker line.
    pub async fn run_streaming<L, H>(
        &self,
        command: &str,
        on_line: L,
        on_handle: H,
        timeout: Option<Duration>,
    ) -> Result<InvocationState>
    where
        L: FnMut(String),
        H: FnMut(Option<ProcessHandle>),
    {
        let timeout = self.effective_timeout(timeout);
        streaming::run_streaming(&self.context(), command, on_line, on_handle, timeout).await
    }

    fn effective_timeout(&self, timeout: Option<Duration>) -> Option<Duration> {
        timeout.or_else(|| self.execution.default_timeout())
    }

    fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext {
            session: &self.session,
            resolver: &self.resolver,
            process_tree: self.process_tree.clone(),
            drain_grace: self.execution.drain_grace(),
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}
