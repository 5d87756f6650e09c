//! The world capability consumed by Mason actions.
//!
//! Actions never touch world state directly; they call the primitive
//! operations on the [`World`] trait (movement, block mutation, crafting,
//! combat, entity queries) and react to the completion or failure signal.
//! The scheduling core treats these primitives as opaque.
//!
//! # Modules
//!
//! - [`capability`] -- The [`World`] trait and its result types.
//! - [`crafting`] -- Static crafting recipe table.
//! - [`error`] -- Error types for world operations ([`WorldError`]).
//! - [`grid`] -- [`GridWorld`], an in-memory voxel world with a small mob
//!   simulation, used by tests and the engine demo.
//! - [`inventory`] -- Per-agent item inventory with checked arithmetic.

pub mod capability;
pub mod crafting;
pub mod error;
pub mod grid;
pub mod inventory;

// Re-export primary types at crate root.
pub use capability::{AttackOutcome, MoveStatus, World, nearest_entity};
pub use crafting::{CraftRecipe, recipe_for};
pub use error::WorldError;
pub use grid::GridWorld;
pub use inventory::Inventory;
