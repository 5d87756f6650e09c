//! A collaborative build in progress.
//!
//! [`CollaborativeBuild`] bundles the full plan, its quadrant sections, and
//! the roster of agents working on it. Sections are shared lock-free through
//! their atomic cursors; the roster (agent-to-section bindings plus the set
//! of every agent that ever took part) sits behind a mutex because binding
//! decisions read several sections at once.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use mason_types::{AgentId, BlockPos, Placement, Quadrant};
use parking_lot::Mutex;

use crate::section::Section;

/// Agent bookkeeping for one build.
#[derive(Debug, Default)]
pub(crate) struct Roster {
    /// Agent -> index of the section it is working on. Not injective.
    pub(crate) bindings: BTreeMap<AgentId, usize>,
    /// Every agent that has been bound at least once.
    pub(crate) participants: BTreeSet<AgentId>,
}

/// One structure being raised by one or more agents.
#[derive(Debug)]
pub struct CollaborativeBuild {
    id: String,
    structure_kind: String,
    origin: BlockPos,
    full_plan: Vec<Placement>,
    sections: Vec<Section>,
    pub(crate) roster: Mutex<Roster>,
    sequence: u64,
    created_at: DateTime<Utc>,
}

impl CollaborativeBuild {
    /// Assemble a build from already-partitioned sections.
    ///
    /// The full plan is the concatenation of the sections' placements, so
    /// the partition invariant holds by construction.
    pub fn from_sections(
        id: impl Into<String>,
        structure_kind: impl Into<String>,
        origin: BlockPos,
        sections: Vec<Section>,
    ) -> Self {
        let full_plan = sections
            .iter()
            .flat_map(|s| s.placements().iter().cloned())
            .collect();
        Self::with_plan(id.into(), structure_kind.into(), origin, full_plan, sections, 0)
    }

    pub(crate) fn with_plan(
        id: String,
        structure_kind: String,
        origin: BlockPos,
        full_plan: Vec<Placement>,
        sections: Vec<Section>,
        sequence: u64,
    ) -> Self {
        Self {
            id,
            structure_kind,
            origin,
            full_plan,
            sections,
            roster: Mutex::new(Roster::default()),
            sequence,
            created_at: Utc::now(),
        }
    }

    pub(crate) fn set_id(&mut self, id: String) {
        self.id = id;
    }

    /// Unique id: structure kind plus creation timestamp.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The structure kind this build raises (`"house"`).
    pub fn structure_kind(&self) -> &str {
        &self.structure_kind
    }

    /// Origin the plan was generated around.
    pub const fn origin(&self) -> BlockPos {
        self.origin
    }

    /// Every placement in the build, in plan order.
    pub fn full_plan(&self) -> &[Placement] {
        &self.full_plan
    }

    /// The quadrant sections, indexed from zero.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// One section by index.
    pub fn section(&self, index: usize) -> Option<&Section> {
        self.sections.get(index)
    }

    /// Registration order within the owning coordinator.
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }

    /// When the build was registered.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether every section has issued all its placements.
    pub fn is_complete(&self) -> bool {
        self.sections.iter().all(Section::is_complete)
    }

    /// Total placements across all sections.
    pub fn total_placements(&self) -> usize {
        self.full_plan.len()
    }

    /// Placements issued so far across all sections.
    pub fn issued_placements(&self) -> usize {
        self.sections
            .iter()
            .fold(0_usize, |acc, s| acc.saturating_add(s.issued()))
    }

    /// The section an agent is currently bound to.
    pub fn bound_section(&self, agent: AgentId) -> Option<usize> {
        self.roster.lock().bindings.get(&agent).copied()
    }

    /// How many agents are bound to each section, by index.
    pub fn agents_per_section(&self) -> Vec<usize> {
        let roster = self.roster.lock();
        let mut counts = vec![0_usize; self.sections.len()];
        for index in roster.bindings.values() {
            if let Some(count) = counts.get_mut(*index) {
                *count = count.saturating_add(1);
            }
        }
        counts
    }

    /// Every agent that has worked on this build.
    pub fn participants(&self) -> Vec<AgentId> {
        self.roster.lock().participants.iter().copied().collect()
    }

    /// Drop an agent's binding (the agent stopped or was preempted).
    pub fn release(&self, agent: AgentId) -> Option<usize> {
        self.roster.lock().bindings.remove(&agent)
    }

    /// A point-in-time progress snapshot.
    pub fn progress(&self) -> BuildProgress {
        let agents = self.agents_per_section();
        let sections = self
            .sections
            .iter()
            .map(|s| SectionProgress {
                index: s.index(),
                quadrant: s.quadrant(),
                total: s.len(),
                issued: s.issued(),
                agents: agents.get(s.index()).copied().unwrap_or(0),
            })
            .collect();
        BuildProgress {
            build_id: self.id.clone(),
            structure_kind: self.structure_kind.clone(),
            total: self.total_placements(),
            issued: self.issued_placements(),
            participants: self.roster.lock().participants.len(),
            complete: self.is_complete(),
            sections,
        }
    }
}

/// Progress of one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionProgress {
    /// Section index.
    pub index: usize,
    /// Quadrant covered.
    pub quadrant: Quadrant,
    /// Placements in the section.
    pub total: usize,
    /// Placements issued.
    pub issued: usize,
    /// Agents currently bound.
    pub agents: usize,
}

/// Progress of a whole build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildProgress {
    /// Build id.
    pub build_id: String,
    /// Structure kind.
    pub structure_kind: String,
    /// Placements in the plan.
    pub total: usize,
    /// Placements issued.
    pub issued: usize,
    /// Agents that have taken part.
    pub participants: usize,
    /// Whether every placement has been issued.
    pub complete: bool,
    /// Per-section breakdown.
    pub sections: Vec<SectionProgress>,
}

impl BuildProgress {
    /// Issued share of the plan as a whole percentage (0--100).
    pub fn percent(&self) -> usize {
        if self.total == 0 {
            return 100;
        }
        self.issued
            .saturating_mul(100)
            .checked_div(self.total)
            .unwrap_or(100)
    }
}
