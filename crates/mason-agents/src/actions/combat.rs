//! Attack, kill, defend, and spawn.
//!
//! Attack and kill share [`Hunt`]: attack gives up when its one target gets
//! away, kill keeps searching until it has defeated `count` targets.

use mason_types::{
    ActionResult, BlockPos, EntityCategory, EntityId, EntitySnapshot, Task, TaskParamError,
};
use mason_world::{AttackOutcome, WorldError, nearest_entity};
use tracing::debug;

use super::movement::{Approach, Walker};
use super::{ActionContext, Behavior, Step};

/// How far an agent looks for something to attack.
const HUNT_RADIUS: u32 = 24;

/// How far around its ward a defender looks for hostiles.
const GUARD_RADIUS: u32 = 12;

/// How close a defender stays to its ward between fights.
const GUARD_DISTANCE: u32 = 3;

/// Quiet ticks before a defend task from a planner considers its ward safe.
pub const DEFAULT_CALM_TICKS: u32 = 40;

// ---------------------------------------------------------------------------
// Engagement
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Engagement {
    Pursuing,
    Defeated,
    Lost,
    Blocked(String),
}

/// Chase `target` and swing once it is in reach.
fn engage(ctx: &ActionContext<'_>, walker: &mut Walker, target: EntityId) -> Engagement {
    let Some(snapshot) = ctx.world.entity(target) else {
        return Engagement::Lost;
    };
    match walker.approach(ctx, snapshot.position, ctx.world.reach()) {
        Approach::Moving => return Engagement::Pursuing,
        Approach::Blocked(reason) => return Engagement::Blocked(reason),
        Approach::InReach => {}
    }
    match ctx.world.attack(ctx.agent, target) {
        Ok(AttackOutcome::Defeated) => Engagement::Defeated,
        Ok(AttackOutcome::Hit { remaining_health }) => {
            debug!(agent = %ctx.agent, target = %target, remaining_health, "hit");
            Engagement::Pursuing
        }
        Ok(AttackOutcome::OutOfReach) => Engagement::Pursuing,
        Err(WorldError::EntityNotFound(_)) => Engagement::Lost,
        Err(e) => Engagement::Blocked(e.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Hunt (attack / kill)
// ---------------------------------------------------------------------------

/// Find and defeat entities of one kind.
#[derive(Debug, Clone)]
pub(crate) struct Hunt {
    kind: String,
    count: u32,
    defeated: u32,
    persistent: bool,
    target: Option<EntityId>,
    walker: Walker,
}

impl Hunt {
    pub(crate) fn attack_from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let kind = task.str_param("target")?.to_ascii_lowercase();
        let description = format!("attack {kind}");
        Ok((Self::new(kind, 1, false), description))
    }

    pub(crate) fn kill_from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let kind = task.str_param("target")?.to_ascii_lowercase();
        let count = task.u32_param_or("count", 1)?.max(1);
        let description = format!("kill {count} {kind}");
        Ok((Self::new(kind, count, true), description))
    }

    fn new(kind: String, count: u32, persistent: bool) -> Self {
        Self {
            kind,
            count,
            defeated: 0,
            persistent,
            target: None,
            walker: Walker::default(),
        }
    }

    fn acquire(&self, ctx: &ActionContext<'_>) -> Option<EntitySnapshot> {
        nearest_entity(ctx.world, ctx.agent, HUNT_RADIUS, |e| {
            e.matches(&self.kind) && e.category != EntityCategory::Player
        })
    }
}

impl Behavior for Hunt {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let target = match self.target {
            Some(id) => id,
            None => {
                let Some(found) = self.acquire(ctx) else {
                    let message = if self.defeated == 0 {
                        format!("No {} within {HUNT_RADIUS} blocks", self.kind)
                    } else {
                        format!("Defeated {}/{} {}, no more nearby", self.defeated, self.count, self.kind)
                    };
                    return Step::Done(ActionResult::failure(message));
                };
                self.walker.reset();
                self.target = Some(found.id);
                found.id
            }
        };

        match engage(ctx, &mut self.walker, target) {
            Engagement::Pursuing => Step::Continue,
            Engagement::Defeated => {
                self.defeated = self.defeated.saturating_add(1);
                self.target = None;
                if self.defeated >= self.count {
                    Step::Done(ActionResult::success(format!(
                        "Defeated {} {}",
                        self.defeated, self.kind
                    )))
                } else {
                    Step::Continue
                }
            }
            Engagement::Lost if self.persistent => {
                self.target = None;
                Step::Continue
            }
            Engagement::Lost => Step::Done(
                ActionResult::failure(format!("The {} got away", self.kind)).with_replanning(false),
            ),
            Engagement::Blocked(reason) => Step::Done(ActionResult::failure(reason)),
        }
    }
}

// ---------------------------------------------------------------------------
// Defend
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
enum Ward {
    Resolved { id: EntityId, name: String },
    Named(String),
}

/// Protect an entity until its surroundings stay quiet.
#[derive(Debug, Clone)]
pub(crate) struct Defend {
    ward: Ward,
    calm_ticks: u32,
    calm: u32,
    threat: Option<EntityId>,
    walker: Walker,
}

impl Defend {
    pub(crate) fn new(ward: EntityId, name: &str, calm_ticks: u32) -> Self {
        Self::with_ward(
            Ward::Resolved {
                id: ward,
                name: name.to_owned(),
            },
            calm_ticks,
        )
    }

    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let query = task.str_param("entity")?;
        let calm_ticks = task.u32_param_or("calm_ticks", DEFAULT_CALM_TICKS)?;
        let ward = query.parse::<EntityId>().map_or_else(
            |_| Ward::Named(query.to_owned()),
            |id| Ward::Resolved {
                id,
                name: query.to_owned(),
            },
        );
        Ok((Self::with_ward(ward, calm_ticks), format!("defend {query}")))
    }

    const fn with_ward(ward: Ward, calm_ticks: u32) -> Self {
        Self {
            ward,
            calm_ticks,
            calm: 0,
            threat: None,
            walker: Walker::new(),
        }
    }

    fn ward_name(&self) -> &str {
        match &self.ward {
            Ward::Resolved { name, .. } | Ward::Named(name) => name,
        }
    }
}

impl Behavior for Defend {
    fn start(&mut self, ctx: &ActionContext<'_>) -> Step {
        if let Ward::Named(query) = &self.ward {
            let Some(found) = nearest_entity(ctx.world, ctx.agent, HUNT_RADIUS, |e| e.matches(query))
            else {
                return Step::Done(
                    ActionResult::failure(format!("Cannot find {query} to defend"))
                        .with_replanning(false),
                );
            };
            self.ward = Ward::Resolved {
                id: found.id,
                name: found.name,
            };
        }
        Step::Continue
    }

    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let Ward::Resolved { id, .. } = &self.ward else {
            return Step::Continue;
        };
        let Some(ward) = ctx.world.entity(*id) else {
            return Step::Done(
                ActionResult::failure(format!("{} is gone", self.ward_name()))
                    .with_replanning(false),
            );
        };

        if let Some(threat) = self.threat {
            match engage(ctx, &mut self.walker, threat) {
                Engagement::Pursuing => return Step::Continue,
                Engagement::Defeated | Engagement::Lost => self.threat = None,
                Engagement::Blocked(reason) => {
                    debug!(agent = %ctx.agent, %reason, "cannot reach attacker");
                    self.threat = None;
                }
            }
            self.calm = 0;
            return Step::Continue;
        }

        let threat = ctx
            .world
            .entities_near(ward.position, GUARD_RADIUS)
            .into_iter()
            .find(|e| e.is_alive() && e.category == EntityCategory::Hostile);
        if let Some(threat) = threat {
            self.walker.reset();
            self.threat = Some(threat.id);
            self.calm = 0;
            return Step::Continue;
        }

        // Stay by the ward while it is quiet.
        let _ = self.walker.approach(ctx, ward.position, GUARD_DISTANCE);
        self.walker.reset();
        self.calm = self.calm.saturating_add(1);
        if self.calm >= self.calm_ticks {
            return Step::Done(ActionResult::success(format!("{} is safe", ward.name)));
        }
        Step::Continue
    }
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Summon an entity.
#[derive(Debug, Clone)]
pub(crate) struct Spawn {
    kind: String,
    position: Option<BlockPos>,
}

impl Spawn {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let kind = task.str_param("entity")?.to_ascii_lowercase();
        let position = task.opt_position()?;
        let description = position.map_or_else(
            || format!("spawn {kind}"),
            |pos| format!("spawn {kind} at {pos}"),
        );
        Ok((Self { kind, position }, description))
    }
}

impl Behavior for Spawn {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let Some(position) = self.position.or_else(|| {
            ctx.world
                .agent_position(ctx.agent)
                .map(|p| p.offset(2, 0, 0))
        }) else {
            return Step::Done(ActionResult::failure("Nowhere to spawn"));
        };
        Step::Done(match ctx.world.spawn_entity(&self.kind, position) {
            Ok(_) => ActionResult::success(format!("Spawned {} at {position}", self.kind)),
            Err(e) => ActionResult::failure(e.to_string()),
        })
    }
}
