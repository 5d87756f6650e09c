//! Collaborative build participation.
//!
//! A build action never owns a private plan. On start it joins the oldest
//! active build of the same structure kind, or registers a new one, and
//! from then on draws one placement at a time from the shared
//! [`BuildCoordinator`](mason_build::BuildCoordinator). Whoever draws
//! nothing once the build is exhausted retires it from the registry.

use std::sync::Arc;

use mason_build::{BlueprintSize, CollaborativeBuild, generate_blueprint};
use mason_types::{ActionResult, AgentId, BlockPos, MaterialId, Placement, Task, TaskParamError};
use mason_world::WorldError;
use tracing::{debug, info};

use super::movement::{Approach, Walker};
use super::{ActionContext, Behavior, Step};

/// What to build, as read from the task.
#[derive(Debug, Clone)]
struct BuildRequest {
    structure: String,
    origin: Option<BlockPos>,
    size: Option<BlueprintSize>,
    material: Option<String>,
    /// Explicit plan from the direct command path, bypassing blueprints.
    blocks: Option<Vec<Placement>>,
}

/// Place blocks of a shared build until it is exhausted.
#[derive(Debug)]
pub(crate) struct Build {
    request: BuildRequest,
    agent: Option<AgentId>,
    build: Option<Arc<CollaborativeBuild>>,
    current: Option<Placement>,
    walker: Walker,
    placed: u32,
    skipped: u32,
}

impl Build {
    pub(crate) fn from_task(task: &Task) -> Result<(Self, String), TaskParamError> {
        let structure = task.str_param("structure")?.to_ascii_lowercase();
        let origin = task.opt_position()?;
        let material = task.opt_str_param("material")?.map(str::to_owned);

        let width = task.opt_u32_param("width")?;
        let height = task.opt_u32_param("height")?;
        let depth = task.opt_u32_param("depth")?;
        let size = if width.is_some() || height.is_some() || depth.is_some() {
            let base = BlueprintSize::default_for(&structure).unwrap_or(BlueprintSize::new(1, 1, 1));
            Some(BlueprintSize::new(
                width.unwrap_or(base.width),
                height.unwrap_or(base.height),
                depth.unwrap_or(base.depth),
            ))
        } else {
            None
        };

        let blocks = task
            .param("blocks")
            .map(|value| {
                serde_json::from_value::<Vec<Placement>>(value.clone()).map_err(|_err| {
                    TaskParamError::Invalid {
                        key: "blocks".to_owned(),
                        expected: "a list of placements",
                    }
                })
            })
            .transpose()?;

        let description = origin.map_or_else(
            || format!("build {structure}"),
            |pos| format!("build {structure} at {pos}"),
        );
        Ok((
            Self {
                request: BuildRequest {
                    structure,
                    origin,
                    size,
                    material,
                    blocks,
                },
                agent: None,
                build: None,
                current: None,
                walker: Walker::default(),
                placed: 0,
                skipped: 0,
            },
            description,
        ))
    }

    fn join_or_register(&self, ctx: &ActionContext<'_>) -> Result<Arc<CollaborativeBuild>, String> {
        let structure = &self.request.structure;
        if let Some(active) = ctx.builds.find_active_build(structure) {
            info!(
                agent = %ctx.agent,
                build_id = active.id(),
                "Joining collaborative build"
            );
            return Ok(active);
        }

        let origin = match self.request.origin {
            Some(origin) => origin,
            None => ctx
                .world
                .agent_position(ctx.agent)
                .map(|p| p.offset(2, 0, 2))
                .ok_or_else(|| WorldError::AgentNotFound(ctx.agent).to_string())?,
        };
        let plan = match &self.request.blocks {
            Some(blocks) => blocks.clone(),
            None => {
                let material = self.request.material.as_deref().map(MaterialId::new);
                generate_blueprint(structure, origin, self.request.size, material.as_ref())
                    .map_err(|e| e.to_string())?
            }
        };
        ctx.builds
            .register_build(structure, plan, origin)
            .map_err(|e| e.to_string())
    }

    fn finish(&self, ctx: &ActionContext<'_>, build: &CollaborativeBuild) -> Step {
        if build.is_complete() && ctx.builds.complete_build(build.id()) {
            debug!(agent = %ctx.agent, build_id = build.id(), "retired finished build");
        }
        let structure = &self.request.structure;
        if self.placed == 0 && self.skipped > 0 {
            return Step::Done(ActionResult::failure(format!(
                "Could not place any blocks of the {structure}"
            )));
        }
        let skipped = if self.skipped > 0 {
            format!(", {} skipped", self.skipped)
        } else {
            String::new()
        };
        Step::Done(ActionResult::success(format!(
            "Finished building the {structure} ({} blocks placed by me, {} in total{skipped})",
            self.placed,
            build.total_placements()
        )))
    }
}

impl Behavior for Build {
    fn start(&mut self, ctx: &ActionContext<'_>) -> Step {
        self.agent = Some(ctx.agent);
        match self.join_or_register(ctx) {
            Ok(build) => {
                self.build = Some(build);
                Step::Continue
            }
            Err(reason) => Step::Done(ActionResult::failure(format!(
                "Cannot build {}: {reason}",
                self.request.structure
            ))),
        }
    }

    fn tick(&mut self, ctx: &ActionContext<'_>) -> Step {
        let Some(build) = self.build.clone() else {
            return Step::Done(ActionResult::failure("Build was never started"));
        };

        let placement = if let Some(current) = &self.current {
            current.clone()
        } else {
            let Some(next) = ctx.builds.get_next_block(&build, ctx.agent) else {
                return self.finish(ctx, &build);
            };
            self.walker.reset();
            self.current = Some(next.clone());
            next
        };

        match self.walker.approach(ctx, placement.position, ctx.world.reach()) {
            Approach::Moving => return Step::Continue,
            Approach::Blocked(reason) => {
                debug!(agent = %ctx.agent, pos = %placement.position, %reason, "skipping unreachable placement");
                self.skipped = self.skipped.saturating_add(1);
                self.current = None;
                return Step::Continue;
            }
            Approach::InReach => {}
        }

        self.current = None;
        match ctx
            .world
            .place_block(ctx.agent, placement.position, &placement.material)
        {
            Ok(()) => self.placed = self.placed.saturating_add(1),
            // Already built, by us earlier or by hand.
            Err(WorldError::Occupied { material, .. }) if material == placement.material => {}
            Err(e) => {
                debug!(agent = %ctx.agent, pos = %placement.position, error = %e, "placement failed");
                self.skipped = self.skipped.saturating_add(1);
            }
        }
        Step::Continue
    }

    fn cancel(&mut self) {
        if let (Some(build), Some(agent)) = (&self.build, self.agent) {
            build.release(agent);
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use mason_build::BuildCoordinator;
    use mason_world::{GridWorld, World};

    use super::*;

    fn drive(builders: &mut [(AgentId, Build)], world: &GridWorld, builds: &BuildCoordinator, limit: usize) -> Vec<ActionResult> {
        let mut results: Vec<Option<ActionResult>> = vec![None; builders.len()];
        for (agent, build) in builders.iter_mut() {
            let ctx = ActionContext { agent: *agent, world, builds };
            assert_eq!(build.start(&ctx), Step::Continue);
        }
        for _ in 0..limit {
            for ((agent, build), slot) in builders.iter_mut().zip(results.iter_mut()) {
                if slot.is_some() {
                    continue;
                }
                let ctx = ActionContext { agent: *agent, world, builds };
                if let Step::Done(result) = build.tick(&ctx) {
                    *slot = Some(result);
                }
            }
            if results.iter().all(Option::is_some) {
                break;
            }
        }
        results.into_iter().map(Option::unwrap).collect()
    }

    #[test]
    fn single_agent_builds_a_platform() {
        let world = GridWorld::new(2);
        let builds = BuildCoordinator::new();
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::new(0, 1, 0));

        let task = Task::new("build")
            .with("structure", "platform")
            .with_position(BlockPos::new(3, 0, 3))
            .with("width", 4)
            .with("depth", 4);
        let (build, description) = Build::from_task(&task).unwrap();
        assert_eq!(description, "build platform at (3, 0, 3)");

        let results = drive(&mut [(agent, build)], &world, &builds, 200);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(world.count_blocks(&MaterialId::new("oak_planks")), 16);
        assert!(builds.is_empty());
    }

    #[test]
    fn two_agents_share_one_house() {
        // Long reach keeps both builders in place so nothing gets skipped.
        let world = GridWorld::new(2).with_reach(8);
        let builds = BuildCoordinator::new();
        let a = AgentId::new();
        let b = AgentId::new();
        world.add_agent(a, "Ada", BlockPos::new(0, 1, 0));
        world.add_agent(b, "Bo", BlockPos::new(10, 1, 10));

        let task = Task::new("build")
            .with("structure", "house")
            .with_position(BlockPos::new(2, 0, 2))
            .with("width", 5)
            .with("height", 3)
            .with("depth", 5);
        let (first, _) = Build::from_task(&task).unwrap();
        let (second, _) = Build::from_task(&task).unwrap();

        let mut builders = [(a, first), (b, second)];
        let results = drive(&mut builders, &world, &builds, 400);
        assert!(results.iter().all(|r| r.success), "{results:?}");

        let ids: BTreeSet<String> = builders
            .iter()
            .filter_map(|(_, b)| b.build.as_ref().map(|b| b.id().to_owned()))
            .collect();
        assert_eq!(ids.len(), 1, "both agents should work on the same build");
        assert!(builders.iter().all(|(_, b)| b.placed > 0));
        let planks = MaterialId::new("oak_planks");
        assert_eq!(world.count_blocks(&planks), 25 + 48 - 2 + 25);
        assert!(builds.is_empty());
    }

    #[test]
    fn explicit_blocks_bypass_blueprints() {
        let world = GridWorld::new(2);
        let builds = BuildCoordinator::new();
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::ORIGIN);

        let blocks = serde_json::json!([
            {"position": {"x": 1, "y": 0, "z": 0}, "material": "glass"},
            {"position": {"x": 1, "y": 1, "z": 0}, "material": "glass"},
        ]);
        let task = Task::new("build").with("structure", "window").with("blocks", blocks);
        let (build, _) = Build::from_task(&task).unwrap();
        let results = drive(&mut [(agent, build)], &world, &builds, 20);
        assert!(results.iter().all(|r| r.success));
        assert_eq!(world.count_blocks(&MaterialId::new("glass")), 2);
    }

    #[test]
    fn unknown_structure_fails_on_start() {
        let world = GridWorld::new(2);
        let builds = BuildCoordinator::new();
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::ORIGIN);
        let ctx = ActionContext { agent, world: &world, builds: &builds };

        let (mut build, _) = Build::from_task(&Task::new("build").with("structure", "castle")).unwrap();
        assert!(matches!(build.start(&ctx), Step::Done(r) if !r.success));
        assert!(builds.is_empty());
    }

    #[test]
    fn malformed_blocks_are_rejected() {
        let task = Task::new("build").with("structure", "x").with("blocks", "nope");
        assert!(matches!(
            Build::from_task(&task),
            Err(TaskParamError::Invalid { .. })
        ));
    }

    #[test]
    fn cancel_releases_the_section() {
        let world = GridWorld::new(2);
        let builds = BuildCoordinator::new();
        let agent = AgentId::new();
        world.add_agent(agent, "Mason", BlockPos::ORIGIN);
        let ctx = ActionContext { agent, world: &world, builds: &builds };

        let task = Task::new("build").with("structure", "wall").with_position(BlockPos::new(1, 0, 1));
        let (mut build, _) = Build::from_task(&task).unwrap();
        build.start(&ctx);
        build.tick(&ctx);
        let shared = builds.find_active_build("wall").unwrap();
        assert!(shared.bound_section(agent).is_some());

        build.cancel();
        assert_eq!(shared.bound_section(agent), None);
    }
}
