//! Actions and the per-agent task executor for Mason.
//!
//! A planner turns a natural-language command into a list of
//! [`Task`](mason_types::Task)s. This crate turns each task into a stateful
//! [`Action`] and runs the queue one action at a time through a
//! [`TaskExecutor`], which also handles idle following and preempts work to
//! defend nearby players under attack.
//!
//! # Modules
//!
//! - [`actions`] -- The eleven action kinds and the task-to-action dispatch.
//! - [`executor`] -- [`TaskExecutor`], the per-agent tick state machine.
//! - [`config`] -- [`ExecutorConfig`] tunables.
//! - [`history`] -- Bounded record of finished actions.
//! - [`notice`] -- [`Notice`] values queued for the user.
//! - [`error`] -- Error types ([`AgentError`]).

pub mod actions;
pub mod config;
pub mod error;
pub mod executor;
pub mod history;
pub mod notice;

// Re-export primary types at crate root.
pub use actions::{Action, ActionContext};
pub use config::ExecutorConfig;
pub use error::AgentError;
pub use executor::TaskExecutor;
pub use history::{ActionHistory, HistoryEntry};
pub use notice::Notice;
