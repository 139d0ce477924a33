//! Invocation Model
//!
//! A single submitted command ("slot"), the merged text it produced, and
//! the lifecycle states both runners walk through.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// A command submitted to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Command text, passed to the interpreter unmodified
    pub command: String,
    /// Wall-clock limit (None = unlimited)
    pub timeout: Option<Duration>,
}

impl InvocationRequest {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Result of a batch invocation.
///
/// `text` is stdout followed by stderr with trailing newlines trimmed. It
/// carries no exit status and no stream provenance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InvocationOutcome {
    pub text: String,
}

impl InvocationOutcome {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Lifecycle state of an invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum InvocationState {
    /// Submitted, no process yet
    #[default]
    NotStarted,
    /// Child process spawned and being drained
    Running,
    /// Child exited on its own
    Completed,
    /// Timeout elapsed first and the tree was killed
    TimedOut,
    /// Handle consumer killed the tree
    KilledExternally,
    /// Streams drained, handle cleared
    Finalized,
}

impl InvocationState {
    /// Whether the invocation has stopped running (before finalization)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvocationState::Completed
                | InvocationState::TimedOut
                | InvocationState::KilledExternally
        )
    }

    /// Whether `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: InvocationState) -> bool {
        use InvocationState::*;
        match (self, next) {
            (NotStarted, Running) => true,
            (Running, Completed) | (Running, TimedOut) | (Running, KilledExternally) => true,
            (state, Finalized) => state.is_terminal(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvocationState::NotStarted => "not-started",
            InvocationState::Running => "running",
            InvocationState::Completed => "completed",
            InvocationState::TimedOut => "timed-out",
            InvocationState::KilledExternally => "killed",
            InvocationState::Finalized => "finalized",
        }
    }
}

/// Tracks one invocation through its states for logging
#[derive(Debug)]
pub struct Invocation {
    id: Uuid,
    command: String,
    state: InvocationState,
    started: Instant,
}

impl Invocation {
    pub fn new(command: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            command: command.to_string(),
            state: InvocationState::NotStarted,
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn state(&self) -> InvocationState {
        self.state
    }

    /// Time since the invocation was created
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: InvocationState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!(
                "Invocation {} ignoring transition {} -> {}",
                self.id,
                self.state.as_str(),
                next.as_str()
            );
            return false;
        }

        trace!(
            "Invocation {} {} -> {} after {:?}",
            self.id,
            self.state.as_str(),
            next.as_str(),
            self.elapsed()
        );
        self.state = next;
        true
    }
}
