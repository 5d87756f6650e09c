//! User-facing notifications raised by an executor.
//!
//! The executor never talks to the user directly. It queues [`Notice`]
//! values that the surrounding application drains and renders.

use core::fmt;

/// Something the user should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A new plan replaced the queue.
    PlanAccepted {
        /// Goal of the plan.
        goal: String,
        /// Number of queued tasks.
        tasks: usize,
    },
    /// The planner produced nothing usable for a command.
    CouldNotUnderstand {
        /// The command as submitted.
        command: String,
        /// Why planning failed.
        reason: String,
    },
    /// An action failed in a way that invalidates the plan.
    ActionFailed {
        /// Description of the failed action.
        action: String,
        /// Failure message.
        message: String,
    },
    /// The queue for the current goal drained.
    GoalComplete {
        /// The finished goal.
        goal: String,
        /// Actions that failed along the way.
        failures: u32,
    },
    /// Defense preemption took over.
    Defending {
        /// Name of the entity being protected.
        entity: String,
        /// The goal that was dropped to respond, if any.
        abandoned_goal: Option<String>,
    },
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlanAccepted { goal, tasks } => {
                write!(f, "On it: {goal} ({tasks} steps)")
            }
            Self::CouldNotUnderstand { command, reason } => {
                write!(f, "I could not understand \"{command}\": {reason}")
            }
            Self::ActionFailed { action, message } => {
                write!(f, "{action} failed: {message}")
            }
            Self::GoalComplete { goal, failures: 0 } => write!(f, "Done: {goal}"),
            Self::GoalComplete { goal, failures } => {
                write!(f, "Finished {goal} with {failures} failed steps")
            }
            Self::Defending {
                entity,
                abandoned_goal: Some(goal),
            } => write!(f, "{entity} is under attack, dropping \"{goal}\" to help"),
            Self::Defending { entity, .. } => write!(f, "{entity} is under attack, defending"),
        }
    }
}
