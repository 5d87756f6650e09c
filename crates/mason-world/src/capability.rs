//! The [`World`] capability trait.
//!
//! Every primitive takes `&self`: a world is shared by all agents and each
//! implementation handles its own interior synchronisation. Primitives
//! return promptly; an action that needs many world steps spreads them over
//! many ticks.

use mason_types::{AgentId, BlockPos, EntityId, EntitySnapshot, MaterialId};

use crate::error::WorldError;

/// Outcome of a single movement step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStatus {
    /// The agent stands on the target.
    Arrived,
    /// The agent moved one step and has further to go.
    Moving,
    /// No step toward the target is possible from here.
    Blocked,
}

/// Outcome of a single attack swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackOutcome {
    /// The target took damage and survived.
    Hit {
        /// Health left after the hit.
        remaining_health: u32,
    },
    /// The target died.
    Defeated,
    /// The target is too far away to hit.
    OutOfReach,
}

/// Primitive operations an action may perform on the world.
pub trait World: Send + Sync {
    /// Maximum distance (Chebyshev, in blocks) at which an agent can
    /// break, place, gather, or attack.
    fn reach(&self) -> u32 {
        4
    }

    /// Current position of an agent, if it has a body in this world.
    fn agent_position(&self, agent: AgentId) -> Option<BlockPos>;

    /// Move the agent one step toward `target`.
    fn step_toward(&self, agent: AgentId, target: BlockPos) -> Result<MoveStatus, WorldError>;

    /// The block at a position, if any.
    fn block_at(&self, pos: BlockPos) -> Option<MaterialId>;

    /// The nearest block of `material` within `radius` of the agent.
    fn find_nearest_block(
        &self,
        agent: AgentId,
        material: &MaterialId,
        radius: u32,
    ) -> Option<BlockPos>;

    /// Break a block within reach; its drop goes to the agent's inventory.
    fn break_block(&self, agent: AgentId, pos: BlockPos) -> Result<MaterialId, WorldError>;

    /// Place a block within reach at an empty position.
    fn place_block(
        &self,
        agent: AgentId,
        pos: BlockPos,
        material: &MaterialId,
    ) -> Result<(), WorldError>;

    /// The nearest resource node of `resource` within `radius` of the agent.
    fn find_resource(
        &self,
        agent: AgentId,
        resource: &MaterialId,
        radius: u32,
    ) -> Option<BlockPos>;

    /// Collect one unit from a resource node within reach. Returns the
    /// number of units collected.
    fn gather(&self, agent: AgentId, resource: &MaterialId) -> Result<u32, WorldError>;

    /// Craft up to `quantity` of `item` from the agent's inventory. Returns
    /// the number of items produced.
    fn craft(&self, agent: AgentId, item: &MaterialId, quantity: u32) -> Result<u32, WorldError>;

    /// How many of `item` the agent carries.
    fn item_count(&self, agent: AgentId, item: &MaterialId) -> u32;

    /// Living entities within `radius` of `center`, nearest first.
    fn entities_near(&self, center: BlockPos, radius: u32) -> Vec<EntitySnapshot>;

    /// Snapshot of one entity, if it is alive.
    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    /// Whether the entity has been attacked recently.
    fn is_under_attack(&self, id: EntityId) -> bool;

    /// Swing at an entity.
    fn attack(&self, agent: AgentId, target: EntityId) -> Result<AttackOutcome, WorldError>;

    /// Summon a new entity of `kind` at `position`.
    fn spawn_entity(&self, kind: &str, position: BlockPos) -> Result<EntityId, WorldError>;
}

/// The nearest entity to an agent within `radius` that satisfies `filter`.
pub fn nearest_entity(
    world: &dyn World,
    agent: AgentId,
    radius: u32,
    filter: impl Fn(&EntitySnapshot) -> bool,
) -> Option<EntitySnapshot> {
    let center = world.agent_position(agent)?;
    world
        .entities_near(center, radius)
        .into_iter()
        .find(|e| e.is_alive() && filter(e))
}
