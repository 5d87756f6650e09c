//! Process-wide registry of collaborative builds.
//!
//! Builds are keyed by id (`"{kind}_{unix_millis}"`, with a `_{n}` suffix if
//! two registrations land in the same millisecond). Every method takes
//! `&self`; the map is sharded so agents on different builds never contend.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use mason_types::{AgentId, BlockPos, Placement};
use tracing::{debug, info};

use crate::assigner::SectionAssigner;
use crate::build::CollaborativeBuild;
use crate::error::BuildError;
use crate::partition::SpatialPartitioner;

/// Registry of active collaborative builds.
#[derive(Debug, Default)]
pub struct BuildCoordinator {
    builds: DashMap<String, Arc<CollaborativeBuild>>,
    next_sequence: AtomicU64,
}

impl BuildCoordinator {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Partition `plan` and register it as a new build.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::EmptyPlan`] if `plan` has no placements.
    pub fn register_build(
        &self,
        structure_kind: &str,
        plan: Vec<Placement>,
        origin: BlockPos,
    ) -> Result<Arc<CollaborativeBuild>, BuildError> {
        if plan.is_empty() {
            return Err(BuildError::EmptyPlan {
                structure: structure_kind.to_owned(),
            });
        }

        let sections = SpatialPartitioner::partition(&plan);
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let base = format!("{structure_kind}_{}", Utc::now().timestamp_millis());
        let mut build = CollaborativeBuild::with_plan(
            base.clone(),
            structure_kind.to_owned(),
            origin,
            plan,
            sections,
            sequence,
        );

        let mut suffix = 1_u32;
        let build = loop {
            match self.builds.entry(build.id().to_owned()) {
                Entry::Vacant(slot) => {
                    let build = Arc::new(build);
                    slot.insert(Arc::clone(&build));
                    break build;
                }
                Entry::Occupied(_) => {
                    build.set_id(format!("{base}_{suffix}"));
                    suffix = suffix.saturating_add(1);
                }
            }
        };

        info!(
            build_id = build.id(),
            structure = structure_kind,
            placements = build.total_placements(),
            sections = build.sections().len(),
            "Registered collaborative build"
        );
        Ok(build)
    }

    /// Hand `agent` its next placement in `build`.
    ///
    /// The agent is (re)assigned to a section first; if the chosen section
    /// drains between assignment and issue, assignment is retried. Returns
    /// `None` only when the whole build has been issued.
    pub fn get_next_block(&self, build: &CollaborativeBuild, agent: AgentId) -> Option<Placement> {
        // Each retry is caused by a section completing, so the loop is bounded
        // by the section count.
        for _ in 0..=build.sections().len() {
            if build.is_complete() {
                break;
            }
            let index = SectionAssigner::assign(build, agent)?;
            if let Some(placement) = build.section(index).and_then(|s| s.issue_next()) {
                return Some(placement.clone());
            }
        }
        build.release(agent);
        None
    }

    /// The earliest-registered incomplete build of `structure_kind`, if any.
    pub fn find_active_build(&self, structure_kind: &str) -> Option<Arc<CollaborativeBuild>> {
        let prefix = format!("{structure_kind}_");
        self.builds
            .iter()
            .filter(|entry| entry.key().starts_with(&prefix) && !entry.value().is_complete())
            .filter(|entry| entry.value().structure_kind() == structure_kind)
            .min_by_key(|entry| entry.value().sequence())
            .map(|entry| Arc::clone(entry.value()))
    }

    /// Look up a build by id.
    pub fn get_build(&self, build_id: &str) -> Option<Arc<CollaborativeBuild>> {
        self.builds.get(build_id).map(|b| Arc::clone(b.value()))
    }

    /// Remove a build from the registry. Returns whether it was present.
    ///
    /// Agents still holding the build keep their `Arc`, but will draw
    /// nothing new once it is exhausted.
    pub fn complete_build(&self, build_id: &str) -> bool {
        let removed = self.builds.remove(build_id);
        if let Some((_, build)) = &removed {
            info!(
                build_id,
                participants = build.participants().len(),
                placements = build.total_placements(),
                "Collaborative build completed"
            );
        }
        removed.is_some()
    }

    /// Remove every build whose sections are all exhausted. Returns how
    /// many were removed.
    pub fn cleanup_completed_builds(&self) -> usize {
        let before = self.builds.len();
        self.builds.retain(|_, build| !build.is_complete());
        let removed = before.saturating_sub(self.builds.len());
        if removed > 0 {
            debug!(removed, "Cleaned up completed builds");
        }
        removed
    }

    /// Every registered build, oldest first.
    pub fn active_builds(&self) -> Vec<Arc<CollaborativeBuild>> {
        let mut builds: Vec<Arc<CollaborativeBuild>> =
            self.builds.iter().map(|b| Arc::clone(b.value())).collect();
        builds.sort_by_key(|b| b.sequence());
        builds
    }

    /// Number of registered builds.
    pub fn len(&self) -> usize {
        self.builds.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.builds.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::thread;

    use mason_types::MaterialId;

    use super::*;

    fn grid_plan(width: i32, height: i32, depth: i32) -> Vec<Placement> {
        let mut plan = Vec::new();
        for y in 0..height {
            for x in 0..width {
                for z in 0..depth {
                    plan.push(Placement::new(BlockPos::new(x, y, z), MaterialId::new("stone")));
                }
            }
        }
        plan
    }

    #[test]
    fn register_rejects_empty_plan() {
        let coordinator = BuildCoordinator::new();
        let err = coordinator
            .register_build("house", Vec::new(), BlockPos::ORIGIN)
            .unwrap_err();
        assert!(matches!(err, BuildError::EmptyPlan { .. }));
        assert!(coordinator.is_empty());
    }

    #[test]
    fn same_millisecond_registrations_get_distinct_ids() {
        let coordinator = BuildCoordinator::new();
        let ids: BTreeSet<String> = (0..5)
            .map(|_| {
                coordinator
                    .register_build("wall", grid_plan(2, 1, 1), BlockPos::ORIGIN)
                    .unwrap()
                    .id()
                    .to_owned()
            })
            .collect();
        assert_eq!(ids.len(), 5);
        assert!(ids.iter().all(|id| id.starts_with("wall_")));
        assert_eq!(coordinator.len(), 5);
    }

    #[test]
    fn single_agent_drains_the_whole_build_once() {
        let coordinator = BuildCoordinator::new();
        let plan = grid_plan(4, 2, 4);
        let build = coordinator
            .register_build("platform", plan.clone(), BlockPos::ORIGIN)
            .unwrap();
        let agent = AgentId::new();

        let mut issued = Vec::new();
        while let Some(p) = coordinator.get_next_block(&build, agent) {
            issued.push(p);
        }
        assert_eq!(issued.len(), plan.len());
        let distinct: BTreeSet<BlockPos> = issued.iter().map(|p| p.position).collect();
        assert_eq!(distinct.len(), plan.len());
        assert!(build.is_complete());
        assert!(coordinator.get_next_block(&build, agent).is_none());
        assert_eq!(build.bound_section(agent), None);
    }

    #[test]
    fn concurrent_agents_cover_the_plan_without_duplicates() {
        let coordinator = Arc::new(BuildCoordinator::new());
        let plan = grid_plan(6, 3, 6);
        let total = plan.len();
        let build = coordinator
            .register_build("house", plan, BlockPos::ORIGIN)
            .unwrap();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let coordinator = Arc::clone(&coordinator);
                let build = Arc::clone(&build);
                thread::spawn(move || {
                    let agent = AgentId::new();
                    let mut mine = Vec::new();
                    while let Some(p) = coordinator.get_next_block(&build, agent) {
                        mine.push(p.position);
                    }
                    mine
                })
            })
            .collect();

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.join().unwrap());
        }
        let distinct: BTreeSet<BlockPos> = all.iter().copied().collect();
        assert_eq!(all.len(), total);
        assert_eq!(distinct.len(), total);
        assert!(build.is_complete());
    }

    #[test]
    fn second_agent_joins_the_active_build() {
        let coordinator = BuildCoordinator::new();
        let build = coordinator
            .register_build("tower", grid_plan(3, 3, 3), BlockPos::ORIGIN)
            .unwrap();
        let first = AgentId::new();
        let second = AgentId::new();
        assert!(coordinator.get_next_block(&build, first).is_some());

        let joined = coordinator.find_active_build("tower").unwrap();
        assert_eq!(joined.id(), build.id());
        assert!(coordinator.get_next_block(&joined, second).is_some());
        assert_ne!(build.bound_section(first), build.bound_section(second));
        assert_eq!(build.participants().len(), 2);
    }

    #[test]
    fn find_active_build_prefers_oldest_and_matches_kind_exactly() {
        let coordinator = BuildCoordinator::new();
        let older = coordinator
            .register_build("wall", grid_plan(2, 1, 1), BlockPos::ORIGIN)
            .unwrap();
        let _newer = coordinator
            .register_build("wall", grid_plan(2, 1, 1), BlockPos::ORIGIN)
            .unwrap();
        let _other = coordinator
            .register_build("wall_gate", grid_plan(2, 1, 1), BlockPos::ORIGIN)
            .unwrap();

        assert_eq!(coordinator.find_active_build("wall").unwrap().id(), older.id());
        assert!(coordinator.find_active_build("house").is_none());
    }

    #[test]
    fn complete_builds_are_skipped_and_cleaned_up() {
        let coordinator = BuildCoordinator::new();
        let build = coordinator
            .register_build("platform", grid_plan(1, 1, 1), BlockPos::ORIGIN)
            .unwrap();
        let agent = AgentId::new();
        assert!(coordinator.get_next_block(&build, agent).is_some());
        assert!(build.is_complete());
        assert!(coordinator.find_active_build("platform").is_none());

        assert_eq!(coordinator.cleanup_completed_builds(), 1);
        assert_eq!(coordinator.cleanup_completed_builds(), 0);
        assert!(coordinator.get_build(build.id()).is_none());
    }

    #[test]
    fn complete_build_reports_presence() {
        let coordinator = BuildCoordinator::new();
        let build = coordinator
            .register_build("house", grid_plan(2, 2, 2), BlockPos::ORIGIN)
            .unwrap();
        let id = build.id().to_owned();
        assert!(coordinator.complete_build(&id));
        assert!(!coordinator.complete_build(&id));
        assert!(coordinator.active_builds().is_empty());
    }
}
