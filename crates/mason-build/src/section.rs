//! One quadrant of a collaborative build.
//!
//! A [`Section`] owns its placements (bottom-to-top) and a cursor counting
//! how many have been handed out. The cursor is the only mutable state and
//! it only moves forward, one compare-and-swap at a time, so concurrent
//! callers of [`Section::issue_next`] never receive the same placement and
//! never run past the end.

use std::sync::atomic::{AtomicUsize, Ordering};

use mason_types::{Placement, Quadrant};

/// A spatial quadrant of a build with an atomic issue cursor.
#[derive(Debug)]
pub struct Section {
    index: usize,
    quadrant: Quadrant,
    placements: Vec<Placement>,
    cursor: AtomicUsize,
}

impl Section {
    /// Create a section. Placements are issued in the order given.
    pub const fn new(index: usize, quadrant: Quadrant, placements: Vec<Placement>) -> Self {
        Self {
            index,
            quadrant,
            placements,
            cursor: AtomicUsize::new(0),
        }
    }

    /// Position of this section within its build.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Which quadrant of the footprint this section covers.
    pub const fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    /// All placements, in issue order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Number of placements.
    pub fn len(&self) -> usize {
        self.placements.len()
    }

    /// Whether the section has no placements at all.
    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Placements handed out so far.
    pub fn issued(&self) -> usize {
        self.cursor.load(Ordering::Acquire).min(self.placements.len())
    }

    /// Placements not yet handed out.
    pub fn remaining(&self) -> usize {
        self.placements.len().saturating_sub(self.issued())
    }

    /// Whether every placement has been issued.
    pub fn is_complete(&self) -> bool {
        self.cursor.load(Ordering::Acquire) >= self.placements.len()
    }

    /// Atomically claim the next placement. Returns `None` once exhausted.
    pub fn issue_next(&self) -> Option<&Placement> {
        let len = self.placements.len();
        let slot = self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if current < len {
                    current.checked_add(1)
                } else {
                    None
                }
            })
            .ok()?;
        self.placements.get(slot)
    }
}
