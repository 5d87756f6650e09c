//! Planner trait and stub implementation.
//!
//! A [`Planner`] turns one natural-language command into a [`Plan`]: a goal
//! description plus an ordered task list. It might be a language model, a
//! rule table, or a test script. The runtime calls it off the tick path, so
//! implementations may block.
//!
//! [`ScriptedPlanner`] replays fixed plans keyed by command text and is the
//! planner used in tests. The rule-based planner used by the engine demo
//! lives in [`rules`](crate::rules).

use std::collections::BTreeMap;

use mason_build::BuildProgress;
use mason_types::{AgentId, BlockPos, EntitySnapshot, Task};
use serde::{Deserialize, Serialize};

/// Errors a planner can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlanningError {
    /// The command could not be interpreted.
    #[error("could not understand \"{command}\"")]
    NotUnderstood {
        /// The command as submitted.
        command: String,
    },

    /// A textual plan did not have the expected shape.
    #[error("malformed plan: {message}")]
    Malformed {
        /// Description of the parse failure.
        message: String,
    },

    /// An internal error in the planner.
    #[error("planner error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

impl PlanningError {
    /// Shorthand for [`PlanningError::NotUnderstood`].
    pub fn not_understood(command: &str) -> Self {
        Self::NotUnderstood {
            command: command.to_owned(),
        }
    }
}

/// A goal with the tasks that achieve it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Short description of what the plan achieves.
    pub goal: String,
    /// Tasks in execution order.
    pub tasks: Vec<Task>,
}

impl Plan {
    /// Create a plan.
    pub fn new(goal: impl Into<String>, tasks: Vec<Task>) -> Self {
        Self {
            goal: goal.into(),
            tasks,
        }
    }

    /// Parse a plan from JSON of the form
    /// `{"goal": "...", "tasks": [{"action": "mine", "parameters": {...}}]}`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError::Malformed`] if the text is not such an
    /// object.
    pub fn from_json(text: &str) -> Result<Self, PlanningError> {
        serde_json::from_str(text).map_err(|e| PlanningError::Malformed {
            message: e.to_string(),
        })
    }
}

/// What a planner knows about the agent it plans for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanningContext {
    /// The agent receiving the command.
    pub agent: AgentId,
    /// The agent's display name.
    pub agent_name: String,
    /// Where the agent stands, if the world knows.
    pub position: Option<BlockPos>,
    /// Living entities around the agent, nearest first.
    pub nearby_entities: Vec<EntitySnapshot>,
    /// Builds other agents are working on.
    pub active_builds: Vec<BuildProgress>,
}

/// A source of plans.
pub trait Planner: Send + Sync {
    /// Produce a plan for `command`.
    ///
    /// # Errors
    ///
    /// Returns [`PlanningError`] when no usable plan can be produced. The
    /// runtime turns this into a "could not understand" notice; it never
    /// retries.
    fn plan(&self, ctx: &PlanningContext, command: &str) -> Result<Plan, PlanningError>;
}

/// A planner that replays fixed plans keyed by command text.
///
/// Lookup ignores case and surrounding whitespace. Unknown commands are
/// [`PlanningError::NotUnderstood`].
#[derive(Debug, Clone, Default)]
pub struct ScriptedPlanner {
    scripts: BTreeMap<String, Plan>,
}

impl ScriptedPlanner {
    /// Create a planner with no scripts.
    pub const fn new() -> Self {
        Self {
            scripts: BTreeMap::new(),
        }
    }

    /// Builder-style registration of the plan for `command`.
    #[must_use]
    pub fn with(mut self, command: &str, plan: Plan) -> Self {
        self.scripts.insert(normalize(command), plan);
        self
    }
}

impl Planner for ScriptedPlanner {
    fn plan(&self, _ctx: &PlanningContext, command: &str) -> Result<Plan, PlanningError> {
        self.scripts
            .get(&normalize(command))
            .cloned()
            .ok_or_else(|| PlanningError::not_understood(command))
    }
}

fn normalize(command: &str) -> String {
    command.trim().to_ascii_lowercase()
}
