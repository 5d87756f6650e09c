//! Shared type definitions for Mason.
//!
//! This crate is the single source of truth for the data that flows between
//! the planner, the per-agent executors, the world capability, and the
//! collaborative build coordinator.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for agents and world entities
//! - [`enums`] -- Closed enumerations (action kinds, quadrants, entity categories)
//! - [`geometry`] -- Block coordinates, material identifiers, placements
//! - [`task`] -- Planner-produced [`Task`] with typed parameter accessors
//! - [`actions`] -- [`ActionResult`], the outcome of a finished action
//! - [`entity`] -- [`EntitySnapshot`], the read-only view of a world entity

pub mod actions;
pub mod entity;
pub mod enums;
pub mod geometry;
pub mod ids;
pub mod task;

// Re-export all public types at crate root for convenience.
pub use actions::ActionResult;
pub use entity::EntitySnapshot;
pub use enums::{ActionKind, EntityCategory, Quadrant, UnknownActionKind};
pub use geometry::{BlockPos, MaterialId, Placement};
pub use ids::{AgentId, EntityId};
pub use task::{Task, TaskParamError};
