//! Agent-to-section assignment with work-stealing.
//!
//! An agent keeps its binding while the bound section still has placements.
//! Otherwise it is rebound:
//!
//! 1. the lowest-indexed incomplete section nobody is bound to, else
//! 2. the incomplete section with the most remaining placements (ties go to
//!    the lower index), joining whoever is already there, else
//! 3. nothing: the build is finished and the agent is unbound.
//!
//! Decisions are made under the build's roster lock, but section cursors keep
//! moving underneath, so two agents can briefly pile onto the same section.
//! That only affects balance; the atomic cursor still prevents duplicate
//! placements.

use std::collections::{BTreeMap, BTreeSet};

use mason_types::AgentId;
use tracing::debug;

use crate::build::CollaborativeBuild;
use crate::section::Section;

/// Chooses which section of a build an agent works on.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionAssigner;

impl SectionAssigner {
    /// Bind `agent` to a section of `build` and return its index, or `None`
    /// when every section is complete.
    pub fn assign(build: &CollaborativeBuild, agent: AgentId) -> Option<usize> {
        let mut roster = build.roster.lock();

        if let Some(current) = roster.bindings.get(&agent).copied() {
            if build.section(current).is_some_and(|s| !s.is_complete()) {
                return Some(current);
            }
            roster.bindings.remove(&agent);
        }

        let choice = Self::select(build.sections(), &roster.bindings);
        if let Some(index) = choice {
            roster.bindings.insert(agent, index);
            roster.participants.insert(agent);
            debug!(
                build_id = build.id(),
                agent = %agent,
                section = index,
                "Agent bound to section"
            );
        }
        choice
    }

    /// Pure selection policy over a set of sections and existing bindings.
    pub fn select(sections: &[Section], bindings: &BTreeMap<AgentId, usize>) -> Option<usize> {
        let claimed: BTreeSet<usize> = bindings.values().copied().collect();

        if let Some(unclaimed) = sections
            .iter()
            .find(|s| !s.is_complete() && !claimed.contains(&s.index()))
        {
            return Some(unclaimed.index());
        }

        sections
            .iter()
            .filter(|s| !s.is_complete())
            .max_by(|a, b| {
                a.remaining()
                    .cmp(&b.remaining())
                    .then_with(|| b.index().cmp(&a.index()))
            })
            .map(Section::index)
    }
}
