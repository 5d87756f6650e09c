//! Scenario setup for the demo run.
//!
//! Lays a dirt floor under a seeded [`GridWorld`], spawns the configured
//! agents a few blocks apart along the x axis, and adds a player, some
//! livestock, a zombie within aggro range of the player, and a grove of
//! oak logs to gather from.

use std::sync::Arc;

use mason_core::config::DemoConfig;
use mason_types::{AgentId, BlockPos, EntityCategory, MaterialId};
use mason_world::GridWorld;
use mason_world::grid::DEFAULT_ENTITY_HEALTH;
use tracing::info;

/// Half-width of the dirt floor around the origin.
pub const GROUND_RADIUS: i32 = 24;

/// Distance between neighbouring agents at spawn.
pub const AGENT_SPACING: i32 = 4;

/// Units of wood in each oak node.
const OAK_NODE_AMOUNT: u32 = 16;

/// A populated world and the agents living in it.
#[derive(Debug)]
pub struct Scenario {
    /// The world, shared with the runtime and the tick observer.
    pub world: Arc<GridWorld>,
    /// Spawned agents with their display names, in config order.
    pub agents: Vec<(AgentId, String)>,
}

/// Build the demo world described by `demo`.
pub fn spawn_scenario(demo: &DemoConfig) -> Scenario {
    let world = GridWorld::new(demo.seed);
    world.fill(
        BlockPos::new(-GROUND_RADIUS, -1, -GROUND_RADIUS),
        BlockPos::new(GROUND_RADIUS, -1, GROUND_RADIUS),
        &MaterialId::new("dirt"),
    );

    let mut agents = Vec::with_capacity(demo.agents.len());
    let mut x = 0_i32;
    for name in &demo.agents {
        let agent = AgentId::new();
        world.add_agent(agent, name.as_str(), BlockPos::new(x, 0, 0));
        agents.push((agent, name.clone()));
        x = x.saturating_add(AGENT_SPACING);
    }

    world.add_entity(
        "Steve",
        "player",
        EntityCategory::Player,
        BlockPos::new(-4, 0, -4),
        DEFAULT_ENTITY_HEALTH,
    );
    world.add_entity(
        "zombie",
        "zombie",
        EntityCategory::Hostile,
        BlockPos::new(-14, 0, -12),
        DEFAULT_ENTITY_HEALTH,
    );
    for pos in [BlockPos::new(6, 0, -8), BlockPos::new(9, 0, -10)] {
        world.add_entity("cow", "cow", EntityCategory::Passive, pos, DEFAULT_ENTITY_HEALTH);
    }
    for pos in [BlockPos::new(-10, 0, 6), BlockPos::new(-12, 0, 9)] {
        world.add_resource_node(pos, "oak_log", OAK_NODE_AMOUNT);
    }

    info!(
        seed = demo.seed,
        agents = agents.len(),
        ground_radius = GROUND_RADIUS,
        "Scenario spawned"
    );

    Scenario {
        world: Arc::new(world),
        agents,
    }
}
