//! Executable actions and the closed task-to-action dispatch table.
//!
//! An [`Action`] is the stateful realization of one [`Task`]. Its lifecycle
//! is `start()`, then `tick()` until [`Action::is_complete`] turns true, then
//! [`Action::result`]. [`Action::cancel`] may be called at any point before
//! that; afterwards `tick()` does nothing and `is_complete()` stays false, so
//! no result is ever consumed from a cancelled action.
//!
//! # Submodules
//!
//! - [`movement`] -- Pathfind and follow, plus the shared walking helper.
//! - [`blocks`] -- Mine, place, and gather.
//! - [`crafting`] -- Craft.
//! - [`combat`] -- Attack, kill, defend, and spawn.
//! - [`build`] -- Collaborative build participation.

pub mod blocks;
pub mod build;
pub mod combat;
pub mod crafting;
pub mod movement;

use mason_build::BuildCoordinator;
use mason_types::{ActionKind, ActionResult, AgentId, EntityId, Task};
use mason_world::World;

use crate::error::AgentError;

/// Everything an action may touch while it runs.
#[derive(Clone, Copy)]
pub struct ActionContext<'a> {
    /// The agent performing the action.
    pub agent: AgentId,
    /// World primitives.
    pub world: &'a dyn World,
    /// Shared collaborative build registry.
    pub builds: &'a BuildCoordinator,
}

impl core::fmt::Debug for ActionContext<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionContext")
            .field("agent", &self.agent)
            .field("builds", &self.builds.len())
            .finish_non_exhaustive()
    }
}

/// What one call into a behavior produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Step {
    /// Keep ticking.
    Continue,
    /// The action is over.
    Done(ActionResult),
}

/// Per-variant behavior. The wrapping [`Action`] owns the lifecycle.
pub(crate) trait Behavior {
    /// Called once when the action starts. Most variants do all their work
    /// in `tick`.
    fn start(&mut self, _ctx: &ActionContext<'_>) -> Step {
        Step::Continue
    }

    /// Advance by one scheduler tick.
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step;

    /// Release anything held outside the action. Called at most once.
    fn cancel(&mut self) {}
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Phase {
    Ready,
    Running,
    Finished(ActionResult),
    Cancelled,
}

#[derive(Debug)]
enum Variant {
    Pathfind(movement::Pathfind),
    Mine(blocks::Mine),
    Place(blocks::Place),
    Craft(crafting::Craft),
    Attack(combat::Hunt),
    Kill(combat::Hunt),
    Spawn(combat::Spawn),
    Follow(movement::Follow),
    Gather(blocks::Gather),
    Build(Box<build::Build>),
    Defend(combat::Defend),
}

impl Variant {
    fn behavior(&mut self) -> &mut dyn Behavior {
        match self {
            Self::Pathfind(b) => b,
            Self::Mine(b) => b,
            Self::Place(b) => b,
            Self::Craft(b) => b,
            Self::Attack(b) | Self::Kill(b) => b,
            Self::Spawn(b) => b,
            Self::Follow(b) => b,
            Self::Gather(b) => b,
            Self::Build(b) => b.as_mut(),
            Self::Defend(b) => b,
        }
    }

    const fn kind(&self) -> ActionKind {
        match self {
            Self::Pathfind(_) => ActionKind::Pathfind,
            Self::Mine(_) => ActionKind::Mine,
            Self::Place(_) => ActionKind::Place,
            Self::Craft(_) => ActionKind::Craft,
            Self::Attack(_) => ActionKind::Attack,
            Self::Kill(_) => ActionKind::Kill,
            Self::Spawn(_) => ActionKind::Spawn,
            Self::Follow(_) => ActionKind::Follow,
            Self::Gather(_) => ActionKind::Gather,
            Self::Build(_) => ActionKind::Build,
            Self::Defend(_) => ActionKind::Defend,
        }
    }
}

/// A running (or runnable) unit of agent work.
#[derive(Debug)]
pub struct Action {
    variant: Variant,
    phase: Phase,
    description: String,
}

impl Action {
    /// Build the action a task describes.
    ///
    /// # Errors
    ///
    /// [`AgentError::UnknownActionKind`] if the task names a capability
    /// outside the closed set, [`AgentError::InvalidParameters`] if its
    /// parameters do not fit the kind.
    pub fn from_task(task: &Task) -> Result<Self, AgentError> {
        let kind = task.kind()?;
        let params = |e| AgentError::params(kind, e);
        let (variant, description) = match kind {
            ActionKind::Pathfind => {
                let (b, d) = movement::Pathfind::from_task(task).map_err(params)?;
                (Variant::Pathfind(b), d)
            }
            ActionKind::Mine => {
                let (b, d) = blocks::Mine::from_task(task).map_err(params)?;
                (Variant::Mine(b), d)
            }
            ActionKind::Place => {
                let (b, d) = blocks::Place::from_task(task).map_err(params)?;
                (Variant::Place(b), d)
            }
            ActionKind::Craft => {
                let (b, d) = crafting::Craft::from_task(task).map_err(params)?;
                (Variant::Craft(b), d)
            }
            ActionKind::Attack => {
                let (b, d) = combat::Hunt::attack_from_task(task).map_err(params)?;
                (Variant::Attack(b), d)
            }
            ActionKind::Kill => {
                let (b, d) = combat::Hunt::kill_from_task(task).map_err(params)?;
                (Variant::Kill(b), d)
            }
            ActionKind::Spawn => {
                let (b, d) = combat::Spawn::from_task(task).map_err(params)?;
                (Variant::Spawn(b), d)
            }
            ActionKind::Follow => {
                let (b, d) = movement::Follow::from_task(task).map_err(params)?;
                (Variant::Follow(b), d)
            }
            ActionKind::Gather => {
                let (b, d) = blocks::Gather::from_task(task).map_err(params)?;
                (Variant::Gather(b), d)
            }
            ActionKind::Build => {
                let (b, d) = build::Build::from_task(task).map_err(params)?;
                (Variant::Build(Box::new(b)), d)
            }
            ActionKind::Defend => {
                let (b, d) = combat::Defend::from_task(task).map_err(params)?;
                (Variant::Defend(b), d)
            }
        };
        Ok(Self::new(variant, description))
    }

    /// The idle behavior: follow the nearest recognized entity within
    /// `radius`, waiting quietly when there is none. Never completes.
    pub fn idle_follow(radius: u32) -> Self {
        Self::new(
            Variant::Follow(movement::Follow::nearest_recognized(radius)),
            "follow whoever is nearby".to_owned(),
        )
    }

    /// Guard `ward` until it has been left alone for `calm_ticks` ticks.
    pub fn defend(ward: EntityId, ward_name: &str, calm_ticks: u32) -> Self {
        Self::new(
            Variant::Defend(combat::Defend::new(ward, ward_name, calm_ticks)),
            format!("defend {ward_name}"),
        )
    }

    const fn new(variant: Variant, description: String) -> Self {
        Self {
            variant,
            phase: Phase::Ready,
            description,
        }
    }

    /// Begin the action. Calling it again, or after cancellation, does
    /// nothing.
    pub fn start(&mut self, ctx: &ActionContext<'_>) {
        if self.phase != Phase::Ready {
            return;
        }
        self.phase = Phase::Running;
        let step = self.variant.behavior().start(ctx);
        self.apply(step);
    }

    /// Advance by one tick. Does nothing unless the action is running.
    pub fn tick(&mut self, ctx: &ActionContext<'_>) {
        if self.phase != Phase::Running {
            return;
        }
        let step = self.variant.behavior().tick(ctx);
        self.apply(step);
    }

    /// Stop early. The action will never report completion.
    pub fn cancel(&mut self) {
        if matches!(self.phase, Phase::Finished(_) | Phase::Cancelled) {
            return;
        }
        self.variant.behavior().cancel();
        self.phase = Phase::Cancelled;
    }

    fn apply(&mut self, step: Step) {
        if let Step::Done(result) = step {
            self.phase = Phase::Finished(result);
        }
    }

    /// Whether the action has finished and holds a result.
    pub const fn is_complete(&self) -> bool {
        matches!(self.phase, Phase::Finished(_))
    }

    /// Whether the action was cancelled.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self.phase, Phase::Cancelled)
    }

    /// The result, once complete.
    pub const fn result(&self) -> Option<&ActionResult> {
        match &self.phase {
            Phase::Finished(result) => Some(result),
            _ => None,
        }
    }

    /// Consume the action, yielding its result if it completed.
    pub fn into_result(self) -> Option<ActionResult> {
        match self.phase {
            Phase::Finished(result) => Some(result),
            _ => None,
        }
    }

    /// The capability this action realizes.
    pub const fn kind(&self) -> ActionKind {
        self.variant.kind()
    }

    /// Human-readable description (`"mine 10 dirt"`).
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.description)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use mason_types::{BlockPos, TaskParamError};
    use mason_world::GridWorld;

    use super::*;

    #[test]
    fn every_kind_dispatches_to_its_own_variant() {
        let tasks = [
            Task::of(ActionKind::Pathfind).with_position(BlockPos::new(1, 0, 1)),
            Task::of(ActionKind::Mine).with("block", "dirt"),
            Task::of(ActionKind::Place)
                .with("block", "stone")
                .with_position(BlockPos::ORIGIN),
            Task::of(ActionKind::Craft).with("item", "stick"),
            Task::of(ActionKind::Attack).with("target", "zombie"),
            Task::of(ActionKind::Kill).with("target", "zombie").with("count", 2),
            Task::of(ActionKind::Spawn).with("entity", "wolf"),
            Task::of(ActionKind::Follow).with("target", "Steve"),
            Task::of(ActionKind::Gather).with("resource", "wheat"),
            Task::of(ActionKind::Build).with("structure", "house"),
            Task::of(ActionKind::Defend).with("entity", "Steve"),
        ];
        for (task, kind) in tasks.iter().zip(ActionKind::ALL) {
            let action = Action::from_task(task).unwrap();
            assert_eq!(action.kind(), kind, "task {task}");
            assert!(!action.description().is_empty());
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = Action::from_task(&Task::new("teleport")).unwrap_err();
        assert!(matches!(err, AgentError::UnknownActionKind(_)));
    }

    #[test]
    fn missing_parameter_is_reported_with_kind() {
        let err = Action::from_task(&Task::of(ActionKind::Mine)).unwrap_err();
        assert_eq!(
            err,
            AgentError::params(ActionKind::Mine, TaskParamError::Missing("block".to_owned()))
        );
    }

    #[test]
    fn cancelled_action_never_completes() {
        let world = GridWorld::new(1);
        let builds = BuildCoordinator::new();
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::ORIGIN);
        let ctx = ActionContext {
            agent,
            world: &world,
            builds: &builds,
        };

        let task = Task::of(ActionKind::Pathfind).with_position(BlockPos::new(5, 0, 0));
        let mut action = Action::from_task(&task).unwrap();
        action.start(&ctx);
        action.tick(&ctx);
        action.cancel();
        for _ in 0..20 {
            action.tick(&ctx);
        }
        assert!(action.is_cancelled());
        assert!(!action.is_complete());
        assert!(action.result().is_none());
        assert_eq!(world.agent_position(agent), Some(BlockPos::new(1, 0, 0)));
    }

    #[test]
    fn cancel_after_completion_keeps_result() {
        let world = GridWorld::new(1);
        let builds = BuildCoordinator::new();
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::ORIGIN);
        let ctx = ActionContext {
            agent,
            world: &world,
            builds: &builds,
        };

        let task = Task::of(ActionKind::Pathfind).with_position(BlockPos::new(1, 0, 0));
        let mut action = Action::from_task(&task).unwrap();
        action.start(&ctx);
        action.tick(&ctx);
        assert!(action.is_complete());
        action.cancel();
        assert!(action.is_complete());
        assert!(action.result().is_some_and(|r| r.success));
    }
}
