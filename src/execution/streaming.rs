//! Streaming Runner
//!
//! Runs a command while pumping every completed line, from either stream,
//! to a caller-supplied sink in arrival order. The live process handle is
//! published right after spawn and cleared once the invocation finalizes.
//! Nothing is retained: callers keep their own transcript.

use std::future::Future;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::{ensure_not_empty, timeout_marker, ExecutionContext, KillGuard, ProcessHandle};
use crate::directory;
use crate::error::Result;
use crate::models::invocation::Invocation;
use crate::models::InvocationState;

/// Forward each line of `reader` into `lines` on its own task
fn pump_lines<R>(reader: Option<R>, lines: UnboundedSender<String>) -> Option<JoinHandle<()>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let reader = reader?;

    Some(tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if lines.send(decode_line(&buf)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    debug!("Line reader ended with error: {}", e);
                    break;
                }
            }
        }
    }))
}

/// Lossy UTF-8 with the line terminator removed
fn decode_line(bytes: &[u8]) -> String {
    let line = String::from_utf8_lossy(bytes);
    line.trim_end_matches(['\r', '\n']).to_string()
}

/// Resolves at `deadline`, or never
fn expiry(deadline: Option<Instant>) -> impl Future<Output = ()> {
    async move {
        match deadline {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending().await,
        }
    }
}

/// Run `command`, delivering lines to `on_line` and the live handle to
/// `on_handle`. Returns the terminal state reached.
pub(crate) async fn run_streaming<L, H>(
    ctx: &ExecutionContext<'_>,
    command: &str,
    mut on_line: L,
    mut on_handle: H,
    timeout: Option<Duration>,
) -> Result<InvocationState>
where
    L: FnMut(String),
    H: FnMut(Option<ProcessHandle>),
{
    ensure_not_empty(command)?;

    if let Some(argument) = directory::parse_cd(command) {
        on_line(directory::resolve_to_text(argument, ctx.session));
        return Ok(InvocationState::Completed);
    }

    let mut invocation = Invocation::new(command);
    let (mut child, handle) = ctx.spawn(&invocation)?;
    let guard = KillGuard::new(handle.clone());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let readers: Vec<JoinHandle<()>> = [
        pump_lines(child.stdout.take(), tx.clone()),
        pump_lines(child.stderr.take(), tx),
    ]
    .into_iter()
    .flatten()
    .collect();

    on_handle(Some(handle.clone()));
    invocation.advance(InvocationState::Running);

    // A limit past the end of the clock means no deadline
    let deadline = timeout.and_then(|limit| Instant::now().checked_add(limit));
    let expired = expiry(deadline);
    tokio::pin!(expired);

    // Completion is gated on the exit signal, not on the streams closing
    let timed_out = loop {
        tokio::select! {
            Some(line) = rx.recv() => on_line(line),
            status = child.wait() => {
                match status {
                    Ok(status) => debug!("Invocation {} exited: {}", invocation.id(), status),
                    Err(e) => warn!("Waiting on invocation {} failed: {}", invocation.id(), e),
                }
                break false;
            }
            _ = &mut expired => {
                info!(
                    "Invocation {} timed out after {:?}: {}",
                    invocation.id(),
                    invocation.elapsed(),
                    command
                );
                handle.terminate();
                break true;
            }
        }
    };

    if timed_out {
        ctx.reap(&mut child).await;
    }
    // The pid may be recycled from here on
    handle.mark_finished();

    let state = if timed_out {
        InvocationState::TimedOut
    } else if handle.was_terminated() {
        InvocationState::KilledExternally
    } else {
        InvocationState::Completed
    };
    invocation.advance(state);

    // Flush lines that raced the exit notification
    let drained = {
        let flush = async {
            while let Some(line) = rx.recv().await {
                on_line(line);
            }
        };
        tokio::time::timeout(ctx.drain_grace, flush).await.is_ok()
    };
    if !drained {
        warn!(
            "Output of invocation {} still open after {:?}, dropping the rest",
            invocation.id(),
            ctx.drain_grace
        );
    }
    for reader in &readers {
        reader.abort();
    }

    if let (InvocationState::TimedOut, Some(limit)) = (state, timeout) {
        on_line(timeout_marker(limit));
    }

    guard.finish();
    on_handle(None);
    invocation.advance(InvocationState::Finalized);
    Ok(state)
}
