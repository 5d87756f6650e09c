//! In-memory voxel world.
//!
//! [`GridWorld`] is a sparse block grid with agent bodies, entities, and
//! resource nodes, all behind one [`RwLock`]. It implements [`World`] so
//! actions can run against it in tests and in the engine demo.
//!
//! Hostile mobs are simulated by [`GridWorld::advance`]: each call moves
//! every hostile one step toward the nearest recognized entity in range and
//! lets adjacent hostiles swing at it. Randomness comes from a seeded RNG so
//! a given seed replays identically.

use std::collections::BTreeMap;

use mason_types::{AgentId, BlockPos, EntityCategory, EntityId, EntitySnapshot, MaterialId};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::capability::{AttackOutcome, MoveStatus, World};
use crate::crafting::recipe_for;
use crate::error::WorldError;
use crate::inventory::Inventory;

/// Default interaction reach in blocks.
pub const DEFAULT_REACH: u32 = 4;

/// Damage an agent deals per swing.
pub const AGENT_ATTACK_DAMAGE: u32 = 5;

/// Damage a hostile mob deals per successful swing.
pub const MOB_ATTACK_DAMAGE: u32 = 2;

/// Distance at which hostiles notice a recognized entity.
pub const MOB_AGGRO_RADIUS: u32 = 12;

/// How long (in world ticks) an entity counts as "under attack" after a hit.
pub const UNDER_ATTACK_WINDOW: u64 = 40;

/// Default health for spawned entities.
pub const DEFAULT_ENTITY_HEALTH: u32 = 20;

/// Maximum number of blocks an agent climbs in one step.
const MAX_STEP_UP: i32 = 2;

#[derive(Debug, Clone)]
struct AgentBody {
    name: String,
    position: BlockPos,
    inventory: Inventory,
}

#[derive(Debug, Clone)]
struct EntityRecord {
    name: String,
    kind: String,
    category: EntityCategory,
    position: BlockPos,
    health: u32,
    last_attacked_at: Option<u64>,
}

impl EntityRecord {
    fn snapshot(&self, id: EntityId) -> EntitySnapshot {
        EntitySnapshot {
            id,
            name: self.name.clone(),
            kind: self.kind.clone(),
            category: self.category,
            position: self.position,
            health: self.health,
        }
    }
}

#[derive(Debug, Clone)]
struct ResourceNode {
    material: MaterialId,
    remaining: u32,
}

#[derive(Debug)]
struct GridState {
    tick: u64,
    blocks: BTreeMap<BlockPos, MaterialId>,
    agents: BTreeMap<AgentId, AgentBody>,
    entities: BTreeMap<EntityId, EntityRecord>,
    resources: BTreeMap<BlockPos, ResourceNode>,
    rng: StdRng,
}

impl GridState {
    fn body(&self, agent: AgentId) -> Result<&AgentBody, WorldError> {
        self.agents.get(&agent).ok_or(WorldError::AgentNotFound(agent))
    }

    fn body_mut(&mut self, agent: AgentId) -> Result<&mut AgentBody, WorldError> {
        self.agents
            .get_mut(&agent)
            .ok_or(WorldError::AgentNotFound(agent))
    }

    fn check_reach(&self, agent: AgentId, target: BlockPos, reach: u32) -> Result<(), WorldError> {
        let distance = self.body(agent)?.position.chebyshev_distance(target);
        if distance > reach {
            return Err(WorldError::OutOfReach {
                target,
                distance,
                reach,
            });
        }
        Ok(())
    }
}

/// Sparse in-memory world implementing [`World`].
#[derive(Debug)]
pub struct GridWorld {
    state: RwLock<GridState>,
    reach: u32,
}

impl GridWorld {
    /// Create an empty world with a seeded RNG.
    pub fn new(seed: u64) -> Self {
        Self {
            state: RwLock::new(GridState {
                tick: 0,
                blocks: BTreeMap::new(),
                agents: BTreeMap::new(),
                entities: BTreeMap::new(),
                resources: BTreeMap::new(),
                rng: StdRng::seed_from_u64(seed),
            }),
            reach: DEFAULT_REACH,
        }
    }

    /// Override the interaction reach.
    #[must_use]
    pub const fn with_reach(mut self, reach: u32) -> Self {
        self.reach = reach;
        self
    }

    // -------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------

    /// Give an agent a body at `position`. Replaces any existing body.
    pub fn add_agent(&self, agent: AgentId, name: impl Into<String>, position: BlockPos) {
        self.state.write().agents.insert(
            agent,
            AgentBody {
                name: name.into(),
                position,
                inventory: Inventory::default(),
            },
        );
    }

    /// Display name of an agent body.
    pub fn agent_name(&self, agent: AgentId) -> Option<String> {
        self.state.read().agents.get(&agent).map(|b| b.name.clone())
    }

    /// Set (or overwrite) a block.
    pub fn set_block(&self, pos: BlockPos, material: impl Into<MaterialId>) {
        self.state.write().blocks.insert(pos, material.into());
    }

    /// Fill the inclusive box between two corners with one material.
    pub fn fill(&self, from: BlockPos, to: BlockPos, material: &MaterialId) {
        let mut state = self.state.write();
        for x in from.x.min(to.x)..=from.x.max(to.x) {
            for y in from.y.min(to.y)..=from.y.max(to.y) {
                for z in from.z.min(to.z)..=from.z.max(to.z) {
                    state.blocks.insert(BlockPos::new(x, y, z), material.clone());
                }
            }
        }
    }

    /// Number of blocks of a material currently in the world.
    pub fn count_blocks(&self, material: &MaterialId) -> usize {
        self.state
            .read()
            .blocks
            .values()
            .filter(|m| *m == material)
            .count()
    }

    /// Add an entity and return its id.
    pub fn add_entity(
        &self,
        name: impl Into<String>,
        kind: impl Into<String>,
        category: EntityCategory,
        position: BlockPos,
        health: u32,
    ) -> EntityId {
        let id = EntityId::new();
        self.state.write().entities.insert(
            id,
            EntityRecord {
                name: name.into(),
                kind: kind.into(),
                category,
                position,
                health,
                last_attacked_at: None,
            },
        );
        id
    }

    /// Move an entity.
    pub fn move_entity(&self, id: EntityId, position: BlockPos) -> Result<(), WorldError> {
        let mut state = self.state.write();
        let record = state
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        record.position = position;
        Ok(())
    }

    /// Record that an entity was just hit, without dealing damage.
    pub fn mark_attacked(&self, id: EntityId) -> Result<(), WorldError> {
        let mut state = self.state.write();
        let tick = state.tick;
        let record = state
            .entities
            .get_mut(&id)
            .ok_or(WorldError::EntityNotFound(id))?;
        record.last_attacked_at = Some(tick);
        Ok(())
    }

    /// Add a resource node holding `amount` units.
    pub fn add_resource_node(&self, pos: BlockPos, material: impl Into<MaterialId>, amount: u32) {
        self.state.write().resources.insert(
            pos,
            ResourceNode {
                material: material.into(),
                remaining: amount,
            },
        );
    }

    /// Put items straight into an agent's inventory.
    pub fn give_item(&self, agent: AgentId, item: &MaterialId, amount: u32) -> Result<(), WorldError> {
        self.state.write().body_mut(agent)?.inventory.add(item, amount)
    }

    /// Current world tick.
    pub fn tick(&self) -> u64 {
        self.state.read().tick
    }

    // -------------------------------------------------------------------
    // Simulation
    // -------------------------------------------------------------------

    /// Advance the mob simulation by one world tick.
    pub fn advance(&self) {
        let mut guard = self.state.write();
        let state = &mut *guard;
        state.tick = state.tick.saturating_add(1);
        let tick = state.tick;

        let targets: Vec<(EntityId, BlockPos)> = state
            .entities
            .iter()
            .filter(|(_, e)| e.category.is_recognized() && e.health > 0)
            .map(|(id, e)| (*id, e.position))
            .collect();

        let hostiles: Vec<EntityId> = state
            .entities
            .iter()
            .filter(|(_, e)| e.category == EntityCategory::Hostile && e.health > 0)
            .map(|(id, _)| *id)
            .collect();

        let mut hits: Vec<EntityId> = Vec::new();
        for hostile_id in hostiles {
            let Some(hostile) = state.entities.get_mut(&hostile_id) else {
                continue;
            };
            let nearest = targets
                .iter()
                .filter(|(_, pos)| hostile.position.within(*pos, MOB_AGGRO_RADIUS))
                .min_by_key(|(id, pos)| (hostile.position.distance_squared(*pos), *id));
            let Some((target_id, target_pos)) = nearest.copied() else {
                continue;
            };
            if hostile.position.chebyshev_distance(target_pos) <= 1 {
                if state.rng.random_bool(0.5) {
                    hits.push(target_id);
                }
            } else {
                hostile.position = hostile.position.step_toward(target_pos);
            }
        }

        for target_id in hits {
            if let Some(target) = state.entities.get_mut(&target_id) {
                target.last_attacked_at = Some(tick);
                let floor = u32::from(target.category == EntityCategory::Player);
                target.health = target.health.saturating_sub(MOB_ATTACK_DAMAGE).max(floor);
                debug!(entity = %target_id, health = target.health, "mob hit");
            }
        }

        state.entities.retain(|_, e| e.health > 0);
    }
}

/// What breaking a block leaves in the inventory.
fn drop_for(material: &MaterialId) -> MaterialId {
    match material.as_str() {
        "stone" => MaterialId::new("cobblestone"),
        "grass_block" => MaterialId::new("dirt"),
        "coal_ore" => MaterialId::new("coal"),
        _ => material.clone(),
    }
}

/// Category a freshly spawned entity of `kind` belongs to.
fn category_for(kind: &str) -> EntityCategory {
    match kind {
        "zombie" | "skeleton" | "spider" | "creeper" | "witch" => EntityCategory::Hostile,
        "wolf" | "villager" | "iron_golem" => EntityCategory::Companion,
        "player" => EntityCategory::Player,
        _ => EntityCategory::Passive,
    }
}

impl World for GridWorld {
    fn reach(&self) -> u32 {
        self.reach
    }

    fn agent_position(&self, agent: AgentId) -> Option<BlockPos> {
        self.state.read().agents.get(&agent).map(|b| b.position)
    }

    fn step_toward(&self, agent: AgentId, target: BlockPos) -> Result<MoveStatus, WorldError> {
        let mut state = self.state.write();
        let position = state.body(agent)?.position;
        if position == target {
            return Ok(MoveStatus::Arrived);
        }
        let next = position.step_toward(target);
        let free = (0..=MAX_STEP_UP)
            .map(|dy| next.offset(0, dy, 0))
            .find(|candidate| !state.blocks.contains_key(candidate));
        let Some(free) = free else {
            return Ok(MoveStatus::Blocked);
        };
        state.body_mut(agent)?.position = free;
        if free == target {
            Ok(MoveStatus::Arrived)
        } else {
            Ok(MoveStatus::Moving)
        }
    }

    fn block_at(&self, pos: BlockPos) -> Option<MaterialId> {
        self.state.read().blocks.get(&pos).cloned()
    }

    fn find_nearest_block(
        &self,
        agent: AgentId,
        material: &MaterialId,
        radius: u32,
    ) -> Option<BlockPos> {
        let state = self.state.read();
        let origin = state.agents.get(&agent)?.position;
        state
            .blocks
            .iter()
            .filter(|(pos, m)| *m == material && origin.within(**pos, radius))
            .map(|(pos, _)| *pos)
            .min_by_key(|pos| (origin.distance_squared(*pos), *pos))
    }

    fn break_block(&self, agent: AgentId, pos: BlockPos) -> Result<MaterialId, WorldError> {
        let mut state = self.state.write();
        state.check_reach(agent, pos, self.reach)?;
        let material = state
            .blocks
            .get(&pos)
            .cloned()
            .ok_or(WorldError::NoBlock(pos))?;
        let drop = drop_for(&material);
        state.body_mut(agent)?.inventory.add(&drop, 1)?;
        state.blocks.remove(&pos);
        Ok(material)
    }

    fn place_block(
        &self,
        agent: AgentId,
        pos: BlockPos,
        material: &MaterialId,
    ) -> Result<(), WorldError> {
        let mut state = self.state.write();
        state.check_reach(agent, pos, self.reach)?;
        if let Some(existing) = state.blocks.get(&pos) {
            return Err(WorldError::Occupied {
                pos,
                material: existing.clone(),
            });
        }
        state.blocks.insert(pos, material.clone());
        Ok(())
    }

    fn find_resource(
        &self,
        agent: AgentId,
        resource: &MaterialId,
        radius: u32,
    ) -> Option<BlockPos> {
        let state = self.state.read();
        let origin = state.agents.get(&agent)?.position;
        state
            .resources
            .iter()
            .filter(|(pos, node)| {
                node.material == *resource && node.remaining > 0 && origin.within(**pos, radius)
            })
            .map(|(pos, _)| *pos)
            .min_by_key(|pos| (origin.distance_squared(*pos), *pos))
    }

    fn gather(&self, agent: AgentId, resource: &MaterialId) -> Result<u32, WorldError> {
        let mut state = self.state.write();
        let origin = state.body(agent)?.position;
        let reach = self.reach;
        let node_pos = state
            .resources
            .iter()
            .filter(|(pos, node)| {
                node.material == *resource && node.remaining > 0 && origin.within(**pos, reach)
            })
            .map(|(pos, _)| *pos)
            .min_by_key(|pos| (origin.distance_squared(*pos), *pos))
            .ok_or_else(|| WorldError::ResourceExhausted(resource.clone()))?;

        state.body_mut(agent)?.inventory.add(resource, 1)?;
        if let Some(node) = state.resources.get_mut(&node_pos) {
            node.remaining = node.remaining.saturating_sub(1);
            if node.remaining == 0 {
                state.resources.remove(&node_pos);
            }
        }
        Ok(1)
    }

    fn craft(&self, agent: AgentId, item: &MaterialId, quantity: u32) -> Result<u32, WorldError> {
        let recipe = recipe_for(item).ok_or_else(|| WorldError::NoRecipe(item.clone()))?;
        let mut state = self.state.write();
        let body = state.body_mut(agent)?;

        let wanted = recipe.batches_for(quantity);
        let affordable = recipe
            .inputs
            .iter()
            .map(|(input, need)| body.inventory.count(input).checked_div(*need).unwrap_or(0))
            .min()
            .unwrap_or(0);
        let batches = wanted.min(affordable);

        if batches == 0 {
            let (input, need) = recipe
                .inputs
                .iter()
                .find(|(input, need)| !body.inventory.has(input, **need))
                .map_or_else(|| (item.clone(), 1), |(i, n)| (i.clone(), *n));
            return Err(WorldError::InsufficientItem {
                available: body.inventory.count(&input),
                item: input,
                requested: need,
            });
        }

        for (input, need) in &recipe.inputs {
            let total = need.checked_mul(batches).ok_or(WorldError::ArithmeticOverflow)?;
            body.inventory.remove(input, total)?;
        }
        let produced = recipe
            .output_quantity
            .checked_mul(batches)
            .ok_or(WorldError::ArithmeticOverflow)?;
        body.inventory.add(&recipe.output, produced)?;
        Ok(produced)
    }

    fn item_count(&self, agent: AgentId, item: &MaterialId) -> u32 {
        self.state
            .read()
            .agents
            .get(&agent)
            .map_or(0, |b| b.inventory.count(item))
    }

    fn entities_near(&self, center: BlockPos, radius: u32) -> Vec<EntitySnapshot> {
        let state = self.state.read();
        let mut found: Vec<EntitySnapshot> = state
            .entities
            .iter()
            .filter(|(_, e)| e.health > 0 && center.within(e.position, radius))
            .map(|(id, e)| e.snapshot(*id))
            .collect();
        found.sort_by_key(|e| (center.distance_squared(e.position), e.id));
        found
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.state
            .read()
            .entities
            .get(&id)
            .filter(|e| e.health > 0)
            .map(|e| e.snapshot(id))
    }

    fn is_under_attack(&self, id: EntityId) -> bool {
        let state = self.state.read();
        state
            .entities
            .get(&id)
            .and_then(|e| e.last_attacked_at)
            .is_some_and(|at| state.tick.saturating_sub(at) <= UNDER_ATTACK_WINDOW)
    }

    fn attack(&self, agent: AgentId, target: EntityId) -> Result<AttackOutcome, WorldError> {
        let mut state = self.state.write();
        let tick = state.tick;
        let origin = state.body(agent)?.position;
        let record = state
            .entities
            .get_mut(&target)
            .ok_or(WorldError::EntityNotFound(target))?;
        if origin.chebyshev_distance(record.position) > self.reach {
            return Ok(AttackOutcome::OutOfReach);
        }
        record.health = record.health.saturating_sub(AGENT_ATTACK_DAMAGE);
        record.last_attacked_at = Some(tick);
        if record.health == 0 {
            state.entities.remove(&target);
            return Ok(AttackOutcome::Defeated);
        }
        Ok(AttackOutcome::Hit {
            remaining_health: record.health,
        })
    }

    fn spawn_entity(&self, kind: &str, position: BlockPos) -> Result<EntityId, WorldError> {
        let kind = kind.trim().to_ascii_lowercase();
        let category = category_for(&kind);
        Ok(self.add_entity(kind.clone(), kind, category, position, DEFAULT_ENTITY_HEALTH))
    }
}
