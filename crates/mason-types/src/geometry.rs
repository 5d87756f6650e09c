//! Block coordinates, material identifiers, and build placements.

use serde::{Deserialize, Serialize};

/// An integer block coordinate. `y` is the vertical axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    /// East-west axis.
    pub x: i32,
    /// Vertical axis (grows upward).
    pub y: i32,
    /// North-south axis.
    pub z: i32,
}

impl BlockPos {
    /// The world origin.
    pub const ORIGIN: Self = Self::new(0, 0, 0);

    /// Create a block position.
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Translate by the given deltas, saturating at the `i32` range.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32, dz: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
            z: self.z.saturating_add(dz),
        }
    }

    /// Squared euclidean distance, widened to avoid overflow.
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x).saturating_sub(i64::from(other.x));
        let dy = i64::from(self.y).saturating_sub(i64::from(other.y));
        let dz = i64::from(self.z).saturating_sub(i64::from(other.z));
        dx.saturating_mul(dx)
            .saturating_add(dy.saturating_mul(dy))
            .saturating_add(dz.saturating_mul(dz))
    }

    /// Largest per-axis distance (number of diagonal steps between the two).
    pub fn chebyshev_distance(self, other: Self) -> u32 {
        let dx = self.x.abs_diff(other.x);
        let dy = self.y.abs_diff(other.y);
        let dz = self.z.abs_diff(other.z);
        dx.max(dy).max(dz)
    }

    /// Whether `other` lies within `radius` blocks on every axis.
    pub fn within(self, other: Self, radius: u32) -> bool {
        self.chebyshev_distance(other) <= radius
    }

    /// The neighbouring position one step closer to `target` on every axis.
    #[must_use]
    pub const fn step_toward(self, target: Self) -> Self {
        Self {
            x: self.x.saturating_add((target.x.saturating_sub(self.x)).signum()),
            y: self.y.saturating_add((target.y.saturating_sub(self.y)).signum()),
            z: self.z.saturating_add((target.z.saturating_sub(self.z)).signum()),
        }
    }
}

impl core::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Identifier of a block or item material (`"oak_planks"`, `"cobblestone"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaterialId(String);

impl MaterialId {
    /// Create a material identifier, normalised to lowercase.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(name.as_ref().trim().to_ascii_lowercase())
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MaterialId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl core::fmt::Display for MaterialId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One block to be placed as part of a build plan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Where the block goes.
    pub position: BlockPos,
    /// What the block is made of.
    pub material: MaterialId,
}

impl Placement {
    /// Create a placement.
    pub const fn new(position: BlockPos, material: MaterialId) -> Self {
        Self { position, material }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_toward_moves_one_block_per_axis() {
        let from = BlockPos::new(0, 5, 0);
        let to = BlockPos::new(3, 5, -2);
        assert_eq!(from.step_toward(to), BlockPos::new(1, 5, -1));
        assert_eq!(to.step_toward(to), to);
    }

    #[test]
    fn chebyshev_distance_is_max_axis() {
        let a = BlockPos::new(0, 0, 0);
        let b = BlockPos::new(3, -7, 2);
        assert_eq!(a.chebyshev_distance(b), 7);
        assert!(a.within(b, 7));
        assert!(!a.within(b, 6));
    }

    #[test]
    fn material_ids_are_normalised() {
        assert_eq!(MaterialId::new(" Oak_Planks "), MaterialId::from("oak_planks"));
    }
}
