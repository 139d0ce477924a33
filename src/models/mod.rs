//! Core data models for slotshell
//!
//! Shell kinds, invocation requests and outcomes, and the invocation
//! state machine shared by both runners.

pub mod invocation;
pub mod shell_kind;

// Re-exports for convenience
pub use invocation::{InvocationOutcome, InvocationRequest, InvocationState};
pub use shell_kind::ShellKind;
