//! Read-only snapshots of world entities.

use serde::{Deserialize, Serialize};

use crate::enums::EntityCategory;
use crate::geometry::BlockPos;
use crate::ids::EntityId;

/// A point-in-time view of a non-agent entity, as reported by the world.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Entity identifier.
    pub id: EntityId,
    /// Display name (player name, or the kind for unnamed mobs).
    pub name: String,
    /// Entity kind (`"player"`, `"zombie"`, `"cow"`).
    pub kind: String,
    /// Broad category.
    pub category: EntityCategory,
    /// Current position.
    pub position: BlockPos,
    /// Remaining health; zero means dead.
    pub health: u32,
}

impl EntitySnapshot {
    /// Whether the entity is still alive.
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Whether the entity matches a name or kind query (case-insensitive).
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.name.eq_ignore_ascii_case(query) || self.kind.eq_ignore_ascii_case(query)
    }
}
