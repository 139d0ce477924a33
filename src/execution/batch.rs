//! Batch Runner
//!
//! Runs a command to completion and returns stdout and stderr merged into
//! one text. Both streams are read into unbounded buffers by their own
//! tasks, started before the exit wait, so a child filling one pipe can
//! never stall on a stream nobody is reading.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

use super::{annotate_timeout, ensure_not_empty, merge_output, ExecutionContext, KillGuard};
use crate::directory;
use crate::error::Result;
use crate::models::invocation::Invocation;
use crate::models::{InvocationOutcome, InvocationState};

/// Shared byte buffer a drain task appends to. Readable at any time, so a
/// timed-out invocation can return whatever arrived.
#[derive(Debug, Clone, Default)]
struct CaptureBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    fn extend(&self, chunk: &[u8]) {
        match self.bytes.lock() {
            Ok(mut bytes) => bytes.extend_from_slice(chunk),
            Err(poisoned) => poisoned.into_inner().extend_from_slice(chunk),
        }
    }

    fn text(&self) -> String {
        match self.bytes.lock() {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(poisoned) => String::from_utf8_lossy(&poisoned.into_inner()).into_owned(),
        }
    }

    /// Read `reader` to EOF on its own task
    fn drain<R>(&self, reader: Option<R>) -> Option<JoinHandle<()>>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let mut reader = reader?;
        let buffer = self.clone();

        Some(tokio::spawn(async move {
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => buffer.extend(&chunk[..n]),
                    Err(e) => {
                        debug!("Stream read ended with error: {}", e);
                        break;
                    }
                }
            }
        }))
    }
}

/// Run `command` to completion (or `timeout`) and return the merged output
pub(crate) async fn run_batch(
    ctx: &ExecutionContext<'_>,
    command: &str,
    timeout: Option<Duration>,
) -> Result<InvocationOutcome> {
    ensure_not_empty(command)?;

    if let Some(argument) = directory::parse_cd(command) {
        return Ok(InvocationOutcome::new(directory::resolve_to_text(
            argument,
            ctx.session,
        )));
    }

    let mut invocation = Invocation::new(command);
    let (mut child, handle) = ctx.spawn(&invocation)?;
    let guard = KillGuard::new(handle.clone());
    invocation.advance(InvocationState::Running);

    let stdout = CaptureBuffer::default();
    let stderr = CaptureBuffer::default();
    let mut readers: Vec<JoinHandle<()>> = [
        stdout.drain(child.stdout.take()),
        stderr.drain(child.stderr.take()),
    ]
    .into_iter()
    .flatten()
    .collect();

    let exit = match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait()).await.ok(),
        None => Some(child.wait().await),
    };

    match exit {
        Some(Ok(status)) => {
            debug!("Invocation {} exited: {}", invocation.id(), status);
            invocation.advance(InvocationState::Completed);
        }
        Some(Err(e)) => {
            warn!("Waiting on invocation {} failed: {}", invocation.id(), e);
            invocation.advance(InvocationState::Completed);
        }
        None => {
            info!(
                "Invocation {} timed out after {:?}: {}",
                invocation.id(),
                invocation.elapsed(),
                command
            );
            handle.terminate();
            invocation.advance(InvocationState::TimedOut);
            ctx.reap(&mut child).await;
        }
    }
    // The pid may be recycled from here on
    handle.mark_finished();

    let drained = {
        let readers_done = futures::future::join_all(readers.iter_mut());
        tokio::time::timeout(ctx.drain_grace, readers_done).await.is_ok()
    };
    if !drained {
        warn!(
            "Output of invocation {} still open after {:?}, returning what was captured",
            invocation.id(),
            ctx.drain_grace
        );
    }
    for reader in &readers {
        reader.abort();
    }

    let mut text = merge_output(&stdout.text(), &stderr.text());
    if invocation.state() == InvocationState::TimedOut {
        if let Some(limit) = timeout {
            text = annotate_timeout(text, limit);
        }
    }

    guard.finish();
    invocation.advance(InvocationState::Finalized);
    Ok(InvocationOutcome::new(text))
}
