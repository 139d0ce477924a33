//! Process Handle
//!
//! The one capability an invocation publishes about its child: terminate
//! the process and every descendant.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use uuid::Uuid;

use crate::platform::ProcessTreeOps;

#[derive(Debug, Default)]
struct HandleFlags {
    /// `terminate` was called while the process was live
    terminated: bool,
    /// Invocation finalized; the pid may be recycled
    finished: bool,
}

struct HandleInner {
    id: Uuid,
    pid: Option<u32>,
    command: String,
    flags: Mutex<HandleFlags>,
    process_tree: Arc<dyn ProcessTreeOps>,
}

/// Cloneable reference to a running child process and its descendants
#[derive(Clone)]
pub struct ProcessHandle {
    inner: Arc<HandleInner>,
}

impl ProcessHandle {
    pub(crate) fn new(
        id: Uuid,
        pid: Option<u32>,
        command: &str,
        process_tree: Arc<dyn ProcessTreeOps>,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                id,
                pid,
                command: command.to_string(),
                flags: Mutex::new(HandleFlags::default()),
                process_tree,
            }),
        }
    }

    /// Invocation id
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// OS process id of the interpreter
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid
    }

    /// Command text the process was started for
    pub fn command(&self) -> &str {
        &self.inner.command
    }

    /// Hard-kill the process and all its descendants.
    ///
    /// Safe to call any number of times from any thread. Failures are
    /// logged, never returned. Does nothing once the invocation finalized.
    pub fn terminate(&self) {
        let mut flags = self.flags();
        if flags.finished {
            debug!("Ignoring terminate for finished invocation {}", self.inner.id);
            return;
        }
        let Some(pid) = self.inner.pid else {
            return;
        };

        flags.terminated = true;
        info!("Terminating process tree {} ({})", pid, self.inner.command);
        if let Err(e) = self.inner.process_tree.kill_process_tree(pid) {
            warn!("Failed to terminate process tree {}: {}", pid, e);
        }
    }

    /// Whether `terminate` reached a live process
    pub fn was_terminated(&self) -> bool {
        self.flags().terminated
    }

    /// Whether the invocation has finalized
    pub fn is_finished(&self) -> bool {
        self.flags().finished
    }

    pub(crate) fn mark_finished(&self) {
        self.flags().finished = true;
    }

    fn flags(&self) -> MutexGuard<'_, HandleFlags> {
        match self.inner.flags.lock() {
            Ok(flags) => flags,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("id", &self.inner.id)
            .field("pid", &self.inner.pid)
            .field("command", &self.inner.command)
            .finish()
    }
}

/// Tree-kills the child if the invocation is abandoned before it finalizes
/// (for example when the runner future is dropped).
pub(crate) struct KillGuard {
    handle: Option<ProcessHandle>,
}

impl KillGuard {
    pub(crate) fn new(handle: ProcessHandle) -> Self {
        Self {
            handle: Some(handle),
        }
    }

    /// Finalize normally: mark the handle finished, skip the kill
    pub(crate) fn finish(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.mark_finished();
        }
    }
}

impl Drop for KillGuard {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Invocation {} abandoned, killing its process tree", handle.id());
            handle.terminate();
            handle.mark_finished();
        }
    }
}
