//! Pathfind and follow, plus the shared walking helper.

use mason_types::{ActionResult, BlockPos, EntityId, EntitySnapshot, Task, TaskParamError};
use mason_world::{MoveStatus, nearest_entity};

use super::{ActionContext, Behavior, Step};

/// Steps a walker takes toward one target before giving up.
const MAX_APPROACH_STEPS: u32 = 256;

/// How close a follower stays to its target.
const FOLLOW_DISTANCE: u32 = 2;

/// Search radius for follow targets named in a task.
const FOLLOW_SEARCH_RADIUS: u32 = 32;

// ---------------------------------------------------------------------------
// Walking
// ---------------------------------------------------------------------------

/// Result of one approach step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Approach {
    /// The target is within the requested distance.
    InReach,
    /// Took a step; not there yet.
    Moving,
    /// Cannot get closer.
    Blocked(String),
}

/// Walks an agent toward successive targets with a per-target step budget.
#[derive(Debug, Clone, Default)]
pub(crate) struct Walker {
    steps: u32,
}

impl Walker {
    pub(crate) const fn new() -> Self {
        Self { steps: 0 }
    }

    /// Forget progress toward the previous target.
    pub(crate) const fn reset(&mut self) {
        self.steps = 0;
    }

    /// Step toward `target` unless already within `within` blocks of it.
    pub(crate) fn approach(
        &mut self,
        ctx: &ActionContext<'_>,
        target: BlockPos,
        within: u32,
    ) -> Approach {
        let Some(position) = ctx.world.agent_position(ctx.agent) else {
            return Approach::Blocked("agent has no body in the world".to_owned());
        };
        if position.within(target, within) {
            return Approach::InReach;
        }
        if self.steps >= MAX_APPROACH_STEPS {
            return Approach::Blocked(format!("gave up walking to {target}"));
        }
        self.steps = self.steps.saturating_add(1);
        match ctx.world.step_toward(ctx.agent, target) {
            Ok(MoveStatus::Arrived) => Approach::InReach,
            Ok(MoveStatus::Moving) => Approach::Moving,
            Ok(MoveStatus::Blocked) => Approach::Blocked(format!("path to {target} is blocked")),
            Err(e) => Approach::Blocked(e.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Pathfind
// ---------------------------------------------------------------------------

/// Walk to an exact coordinate.
#[derive(Debug, Clone)]
pub(crate) struct Pathfind {
    target: BlockPos,
    max_ticks: Option<u32>,
    ticks: u32,
}

impl Pathfind {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let target = task.position()?;
        let max_ticks = task.opt_u32_param("max_ticks")?;
        Ok((
            Self {
                target,
                max_ticks,
                ticks: 0,
            },
            format!("walk to {target}"),
        ))
    }
}

impl Behavior for Pathfind {
    fn start(&mut self, ctx: &ActionContext<'_>) -> Step {
        if self.max_ticks.is_none() {
            let distance = ctx
                .world
                .agent_position(ctx.agent)
                .map_or(0, |p| p.chebyshev_distance(self.target));
            self.max_ticks = Some(distance.saturating_mul(3).saturating_add(16));
        }
        Step::Continue
    }

    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        self.ticks = self.ticks.saturating_add(1);
        match ctx.world.step_toward(ctx.agent, self.target) {
            Ok(MoveStatus::Arrived) => {
                Step::Done(ActionResult::success(format!("Arrived at {}", self.target)))
            }
            Ok(MoveStatus::Moving) if self.max_ticks.is_some_and(|max| self.ticks >= max) => {
                Step::Done(ActionResult::failure(format!(
                    "Could not reach {} in {} ticks",
                    self.target, self.ticks
                )))
            }
            Ok(MoveStatus::Moving) => Step::Continue,
            Ok(MoveStatus::Blocked) => Step::Done(ActionResult::failure(format!(
                "Path to {} is blocked",
                self.target
            ))),
            Err(e) => Step::Done(ActionResult::failure(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Follow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum FollowTarget {
    Entity(EntityId),
    Named(String),
    NearestRecognized,
}

/// Stay close to another entity.
#[derive(Debug, Clone)]
pub(crate) struct Follow {
    target: FollowTarget,
    radius: u32,
    ticks: Option<u32>,
    elapsed: u32,
    locked: Option<EntityId>,
    /// Idle following waits for someone to show up instead of failing.
    patient: bool,
}

impl Follow {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let query = task.str_param("target")?;
        let target = query
            .parse::<EntityId>()
            .map_or_else(|_| FollowTarget::Named(query.to_owned()), FollowTarget::Entity);
        let ticks = task.opt_u32_param("ticks")?;
        let description = ticks.map_or_else(
            || format!("follow {query}"),
            |t| format!("follow {query} for {t} ticks"),
        );
        Ok((
            Self {
                target,
                radius: FOLLOW_SEARCH_RADIUS,
                ticks,
                elapsed: 0,
                locked: None,
                patient: false,
            },
            description,
        ))
    }

    pub(crate) const fn nearest_recognized(radius: u32) -> Self {
        Self {
            target: FollowTarget::NearestRecognized,
            radius,
            ticks: None,
            elapsed: 0,
            locked: None,
            patient: true,
        }
    }

    fn resolve(&mut self, ctx: &ActionContext<'_>) -> Option<EntitySnapshot> {
        if let Some(found) = self.locked.and_then(|id| ctx.world.entity(id)) {
            return Some(found);
        }
        self.locked = None;
        let found = match &self.target {
            FollowTarget::Entity(id) => ctx.world.entity(*id),
            FollowTarget::Named(query) => {
                nearest_entity(ctx.world, ctx.agent, self.radius, |e| e.matches(query))
            }
            FollowTarget::NearestRecognized => {
                nearest_entity(ctx.world, ctx.agent, self.radius, |e| {
                    e.category.is_recognized()
                })
            }
        }?;
        self.locked = Some(found.id);
        Some(found)
    }

    fn describe_target(&self) -> String {
        match &self.target {
            FollowTarget::Entity(id) => id.to_string(),
            FollowTarget::Named(name) => name.clone(),
            FollowTarget::NearestRecognized => "anyone".to_owned(),
        }
    }
}

impl Behavior for Follow {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let Some(target) = self.resolve(ctx) else {
            if self.patient {
                return Step::Continue;
            }
            return Step::Done(
                ActionResult::failure(format!("Lost track of {}", self.describe_target()))
                    .with_replanning(false),
            );
        };

        let near = ctx
            .world
            .agent_position(ctx.agent)
            .is_some_and(|p| p.within(target.position, FOLLOW_DISTANCE));
        if !near {
            // A blocked step is retried next tick; the target may move.
            let _ = ctx.world.step_toward(ctx.agent, target.position);
        }

        self.elapsed = self.elapsed.saturating_add(1);
        match self.ticks {
            Some(limit) if self.elapsed >= limit => Step::Done(ActionResult::success(format!(
                "Followed {} for {} ticks",
                target.name, self.elapsed
            ))),
            _ => Step::Continue,
        }
    }
}
