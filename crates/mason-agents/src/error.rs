//! Error types for the mason-agents crate.
//!
//! Dispatch failures are the only errors this crate raises. Everything that
//! goes wrong while an action runs is reported through its
//! [`ActionResult`](mason_types::ActionResult) instead, so one agent's
//! failures never escape into the scheduler.

use mason_types::{ActionKind, TaskParamError, UnknownActionKind};

/// Errors that can occur when turning a task into an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// The task names a capability outside the closed action set.
    #[error(transparent)]
    UnknownActionKind(#[from] UnknownActionKind),

    /// The task names a known capability but its parameters are unusable.
    #[error("invalid parameters for {kind}: {source}")]
    InvalidParameters {
        /// The action kind being built.
        kind: ActionKind,
        /// What was wrong with the parameters.
        source: TaskParamError,
    },
}

impl AgentError {
    /// Attach an action kind to a parameter error.
    pub const fn params(kind: ActionKind, source: TaskParamError) -> Self {
        Self::InvalidParameters { kind, source }
    }
}
