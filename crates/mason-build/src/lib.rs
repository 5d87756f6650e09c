//! Collaborative build coordination for Mason.
//!
//! A build plan (an ordered list of block placements) is split into up to
//! four horizontal quadrants so several agents can raise one structure at
//! once without placing the same block twice.
//!
//! # Modules
//!
//! - [`partition`] -- Pure quadrant partitioning of a placement plan.
//! - [`section`] -- [`Section`], one quadrant with an atomic issue cursor.
//! - [`assigner`] -- [`SectionAssigner`], agent-to-section binding with
//!   work-stealing.
//! - [`build`] -- [`CollaborativeBuild`] and its progress snapshot.
//! - [`coordinator`] -- [`BuildCoordinator`], the concurrent build registry.
//! - [`blueprint`] -- Procedural placement plans for named structures.
//! - [`error`] -- Error types ([`BuildError`]).

pub mod assigner;
pub mod blueprint;
pub mod build;
pub mod coordinator;
pub mod error;
pub mod partition;
pub mod section;

// Re-export primary types at crate root.
pub use assigner::SectionAssigner;
pub use blueprint::{BlueprintSize, generate as generate_blueprint};
pub use build::{BuildProgress, CollaborativeBuild, SectionProgress};
pub use coordinator::BuildCoordinator;
pub use error::BuildError;
pub use partition::SpatialPartitioner;
pub use section::Section;
