//! Mine, place, and gather.

use mason_types::{ActionResult, BlockPos, MaterialId, Task, TaskParamError};
use mason_world::WorldError;
use tracing::debug;

use super::movement::{Approach, Walker};
use super::{ActionContext, Behavior, Step};

/// How far an agent looks for blocks and resource nodes.
const SEARCH_RADIUS: u32 = 32;

// ---------------------------------------------------------------------------
// Mine
// ---------------------------------------------------------------------------

/// Break a number of blocks of one material.
#[derive(Debug, Clone)]
pub(crate) struct Mine {
    material: MaterialId,
    quantity: u32,
    mined: u32,
    target: Option<BlockPos>,
    walker: Walker,
}

impl Mine {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let material = MaterialId::new(task.str_param("block")?);
        let quantity = task.u32_param_or("quantity", 1)?.max(1);
        let description = format!("mine {quantity} {material}");
        Ok((
            Self {
                material,
                quantity,
                mined: 0,
                target: None,
                walker: Walker::default(),
            },
            description,
        ))
    }

    fn shortfall(&self) -> ActionResult {
        if self.mined == 0 {
            ActionResult::failure(format!("No {} within {SEARCH_RADIUS} blocks", self.material))
        } else {
            ActionResult::failure(format!(
                "Mined {}/{} {}, none left nearby",
                self.mined, self.quantity, self.material
            ))
        }
    }
}

impl Behavior for Mine {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let target = match self.target {
            Some(pos) => pos,
            None => {
                let Some(pos) = ctx
                    .world
                    .find_nearest_block(ctx.agent, &self.material, SEARCH_RADIUS)
                else {
                    return Step::Done(self.shortfall());
                };
                self.walker.reset();
                self.target = Some(pos);
                pos
            }
        };

        match self.walker.approach(ctx, target, ctx.world.reach()) {
            Approach::Moving => return Step::Continue,
            Approach::Blocked(reason) => return Step::Done(ActionResult::failure(reason)),
            Approach::InReach => {}
        }

        self.target = None;
        match ctx.world.break_block(ctx.agent, target) {
            Ok(_) => {
                self.mined = self.mined.saturating_add(1);
                if self.mined >= self.quantity {
                    return Step::Done(ActionResult::success(format!(
                        "Mined {} {}",
                        self.mined, self.material
                    )));
                }
                Step::Continue
            }
            // Someone else got there first; look for another.
            Err(WorldError::NoBlock(_)) => {
                debug!(agent = %ctx.agent, pos = %target, "block vanished before mining");
                Step::Continue
            }
            Err(e) => Step::Done(ActionResult::failure(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Place
// ---------------------------------------------------------------------------

/// Place one block at a coordinate.
#[derive(Debug, Clone)]
pub(crate) struct Place {
    material: MaterialId,
    position: BlockPos,
    walker: Walker,
}

impl Place {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let material = MaterialId::new(task.str_param("block")?);
        let position = task.position()?;
        let description = format!("place {material} at {position}");
        Ok((
            Self {
                material,
                position,
                walker: Walker::default(),
            },
            description,
        ))
    }
}

impl Behavior for Place {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        match self.walker.approach(ctx, self.position, ctx.world.reach()) {
            Approach::Moving => Step::Continue,
            Approach::Blocked(reason) => Step::Done(ActionResult::failure(reason)),
            Approach::InReach => Step::Done(
                match ctx
                    .world
                    .place_block(ctx.agent, self.position, &self.material)
                {
                    Ok(()) => ActionResult::success(format!(
                        "Placed {} at {}",
                        self.material, self.position
                    )),
                    Err(e) => ActionResult::failure(e.to_string()),
                },
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Gather
// ---------------------------------------------------------------------------

/// Collect units from resource nodes.
#[derive(Debug, Clone)]
pub(crate) struct Gather {
    resource: MaterialId,
    quantity: u32,
    gathered: u32,
    node: Option<BlockPos>,
    walker: Walker,
}

impl Gather {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let resource = MaterialId::new(task.str_param("resource")?);
        let quantity = task.u32_param_or("quantity", 1)?.max(1);
        let description = format!("gather {quantity} {resource}");
        Ok((
            Self {
                resource,
                quantity,
                gathered: 0,
                node: None,
                walker: Walker::default(),
            },
            description,
        ))
    }
}

impl Behavior for Gather {
    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let node = match self.node {
            Some(pos) => pos,
            None => {
                let Some(pos) = ctx
                    .world
                    .find_resource(ctx.agent, &self.resource, SEARCH_RADIUS)
                else {
                    return Step::Done(ActionResult::failure(format!(
                        "Gathered {}/{} {}, no more nearby",
                        self.gathered, self.quantity, self.resource
                    )));
                };
                self.walker.reset();
                self.node = Some(pos);
                pos
            }
        };

        match self.walker.approach(ctx, node, ctx.world.reach()) {
            Approach::Moving => return Step::Continue,
            Approach::Blocked(reason) => return Step::Done(ActionResult::failure(reason)),
            Approach::InReach => {}
        }

        match ctx.world.gather(ctx.agent, &self.resource) {
            Ok(units) => {
                self.gathered = self.gathered.saturating_add(units);
                if self.gathered >= self.quantity {
                    return Step::Done(ActionResult::success(format!(
                        "Gathered {} {}",
                        self.gathered, self.resource
                    )));
                }
                Step::Continue
            }
            Err(WorldError::ResourceExhausted(_)) => {
                self.node = None;
                Step::Continue
            }
            Err(e) => Step::Done(ActionResult::failure(e.to_string())),
        }
    }
}
