//! Error types for the `mason-world` crate.

use mason_types::{AgentId, BlockPos, EntityId, MaterialId};

/// Errors returned by world primitives.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// The agent has no body in this world.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The entity does not exist (or has died).
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    /// The target is farther away than the interaction reach.
    #[error("{target} is out of reach ({distance} blocks, reach {reach})")]
    OutOfReach {
        /// What the agent tried to interact with.
        target: BlockPos,
        /// Chebyshev distance to the target.
        distance: u32,
        /// Maximum interaction distance.
        reach: u32,
    },

    /// There is no block at the position.
    #[error("no block at {0}")]
    NoBlock(BlockPos),

    /// The position already holds a block.
    #[error("{pos} is occupied by {material}")]
    Occupied {
        /// The occupied position.
        pos: BlockPos,
        /// The block already there.
        material: MaterialId,
    },

    /// The agent does not hold enough of an item.
    #[error("insufficient {item}: wanted {requested}, have {available}")]
    InsufficientItem {
        /// The item.
        item: MaterialId,
        /// Quantity requested.
        requested: u32,
        /// Quantity held.
        available: u32,
    },

    /// Adding items would exceed carry capacity.
    #[error("inventory full: adding {attempted} {item} exceeds capacity {capacity}")]
    InventoryFull {
        /// The item being added.
        item: MaterialId,
        /// Quantity being added.
        attempted: u32,
        /// Maximum carried item count.
        capacity: u32,
    },

    /// No recipe produces the requested item.
    #[error("no recipe for {0}")]
    NoRecipe(MaterialId),

    /// No resource node of the material is within reach.
    #[error("no {0} to gather nearby")]
    ResourceExhausted(MaterialId),

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
