//! Command execution
//!
//! Spawns the interpreter for one command, drains both output streams
//! concurrently with the exit wait, and enforces timeouts with a full
//! process-tree kill. [`batch`] returns one merged text; [`streaming`]
//! delivers lines as they arrive and publishes a cancellable handle.

pub mod batch;
pub mod handle;
pub mod streaming;

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use tokio::process::{Child, Command};

use crate::error::{Error, Result};
use crate::models::invocation::Invocation;
use crate::platform::ProcessTreeOps;
use crate::session::Session;
use crate::shell::{ShellInvocation, ShellResolver};

pub use handle::ProcessHandle;
pub(crate) use handle::KillGuard;

/// Leading text of the annotation appended to timed-out output
pub const TIMEOUT_MARKER_PREFIX: &str = "[timed out after ";

/// Everything a runner needs from the engine for one invocation
pub(crate) struct ExecutionContext<'a> {
    pub session: &'a Session,
    pub resolver: &'a ShellResolver,
    pub process_tree: Arc<dyn ProcessTreeOps>,
    pub drain_grace: Duration,
}

impl ExecutionContext<'_> {
    /// Resolve the interpreter from the current shell kind and spawn it in
    /// the session's working directory
    pub(crate) fn spawn(&self, invocation: &Invocation) -> Result<(Child, ProcessHandle)> {
        let kind = self.session.shell_kind();
        let shell = self.resolver.resolve(kind, invocation.command());
        let working_directory = self.session.current_directory();

        let child = spawn_shell(&shell, &working_directory)?;
        let handle = ProcessHandle::new(
            invocation.id(),
            child.id(),
            invocation.command(),
            self.process_tree.clone(),
        );

        debug!(
            "Spawned {} (pid {:?}, {} shell) in {}: {}",
            shell.program.display(),
            handle.pid(),
            kind,
            working_directory.display(),
            shell.argument_string()
        );

        Ok((child, handle))
    }

    /// Bounded wait for a killed child to be reaped
    pub(crate) async fn reap(&self, child: &mut Child) {
        match tokio::time::timeout(self.drain_grace, child.wait()).await {
            Ok(Ok(status)) => trace!("Killed child reaped: {}", status),
            Ok(Err(e)) => warn!("Failed to reap killed child: {}", e),
            Err(_) => warn!("Killed child not reaped within {:?}", self.drain_grace),
        }
    }
}

/// Spawn the interpreter with both output streams piped and no console
fn spawn_shell(shell: &ShellInvocation, working_directory: &Path) -> Result<Child> {
    let mut command = Command::new(&shell.program);

    #[cfg(windows)]
    {
        use windows_sys::Win32::System::Threading::CREATE_NO_WINDOW;

        // The command text is appended as typed; cmd.exe and PowerShell do
        // their own parsing
        command.raw_arg(shell.argument_string());
        command.creation_flags(CREATE_NO_WINDOW);
    }

    #[cfg(not(windows))]
    {
        command.args(&shell.switches).arg(&shell.command);
    }

    // Own process group so the whole tree can be killed with killpg
    #[cfg(unix)]
    command.process_group(0);

    command
        .current_dir(working_directory)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    command.spawn().map_err(|e| Error::CommandSpawnFailed {
        command: shell.command.clone(),
        reason: e.to_string(),
    })
}

/// Reject blank commands before anything is spawned
pub(crate) fn ensure_not_empty(command: &str) -> Result<()> {
    if command.trim().is_empty() {
        Err(Error::EmptyCommand)
    } else {
        Ok(())
    }
}

/// Stdout followed by stderr, separated by a newline, trailing CR/LF
/// removed
pub fn merge_output(stdout: &str, stderr: &str) -> String {
    let mut text = stdout.trim_end_matches(['\r', '\n']).to_string();
    if !stderr.is_empty() {
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(stderr);
    }
    text.truncate(text.trim_end_matches(['\r', '\n']).len());
    text
}

/// The annotation for a command killed after `limit`
pub fn timeout_marker(limit: Duration) -> String {
    format!("{}{}]", TIMEOUT_MARKER_PREFIX, format_limit(limit))
}

/// Append the timeout marker to captured output
pub fn annotate_timeout(text: String, limit: Duration) -> String {
    let marker = timeout_marker(limit);
    if text.is_empty() {
        marker
    } else {
        format!("{}\n{}", text, marker)
    }
}

/// `5s` for whole seconds, `1500ms` otherwise
fn format_limit(limit: Duration) -> String {
    let millis = limit.as_millis();
    if millis % 1000 == 0 {
        format!("{}s", limit.as_secs())
    } else {
        format!("{}ms", millis)
    }
}
