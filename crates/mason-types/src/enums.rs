//! Enumeration types shared across the Mason workspace.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Action kinds
// ---------------------------------------------------------------------------

/// The closed set of capabilities an agent can execute.
///
/// Planner output names one of these per task. Anything outside this set is
/// rejected at dispatch time and the task is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Walk to a target coordinate.
    Pathfind,
    /// Break blocks of a given material.
    Mine,
    /// Place a single block.
    Place,
    /// Craft items from inventory materials.
    Craft,
    /// Attack a single hostile of a given kind.
    Attack,
    /// Hunt a number of entities of a given kind.
    Kill,
    /// Summon an entity into the world.
    Spawn,
    /// Follow another entity.
    Follow,
    /// Collect a loose resource.
    Gather,
    /// Contribute to a (possibly shared) structure.
    Build,
    /// Protect an entity from attackers.
    Defend,
}

impl ActionKind {
    /// Every action kind, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Pathfind,
        Self::Mine,
        Self::Place,
        Self::Craft,
        Self::Attack,
        Self::Kill,
        Self::Spawn,
        Self::Follow,
        Self::Gather,
        Self::Build,
        Self::Defend,
    ];

    /// The canonical lowercase name used in planner output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pathfind => "pathfind",
            Self::Mine => "mine",
            Self::Place => "place",
            Self::Craft => "craft",
            Self::Attack => "attack",
            Self::Kill => "kill",
            Self::Spawn => "spawn",
            Self::Follow => "follow",
            Self::Gather => "gather",
            Self::Build => "build",
            Self::Defend => "defend",
        }
    }

    /// Whether a running action of this kind must not be interrupted by
    /// defense preemption.
    pub const fn is_preemption_protected(self) -> bool {
        matches!(self, Self::Build | Self::Defend | Self::Craft)
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not match any [`ActionKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action kind: {0}")]
pub struct UnknownActionKind(pub String);

impl core::str::FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| UnknownActionKind(needle.to_owned()))
    }
}

// ---------------------------------------------------------------------------
// Quadrants
// ---------------------------------------------------------------------------

/// One horizontal quadrant of a build footprint.
///
/// West means `x <= center_x`, north means `z <= center_z`. Ties land on
/// the west/north side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quadrant {
    /// `x <= cx`, `z <= cz`.
    NW,
    /// `x > cx`, `z <= cz`.
    NE,
    /// `x <= cx`, `z > cz`.
    SW,
    /// `x > cx`, `z > cz`.
    SE,
}

impl Quadrant {
    /// All quadrants in section-index order.
    pub const ALL: [Self; 4] = [Self::NW, Self::NE, Self::SW, Self::SE];

    /// Classify a horizontal coordinate against a footprint center.
    pub const fn classify(x: i32, z: i32, center_x: i32, center_z: i32) -> Self {
        match (x <= center_x, z <= center_z) {
            (true, true) => Self::NW,
            (false, true) => Self::NE,
            (true, false) => Self::SW,
            (false, false) => Self::SE,
        }
    }

    /// Short label (`"NW"`, `"NE"`, `"SW"`, `"SE"`).
    pub const fn label(self) -> &'static str {
        match self {
            Self::NW => "NW",
            Self::NE => "NE",
            Self::SW => "SW",
            Self::SE => "SE",
        }
    }
}

impl core::fmt::Display for Quadrant {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Entity categories
// ---------------------------------------------------------------------------

/// Broad classification of a non-agent entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    /// A human player. Agents follow and guard players.
    Player,
    /// A friendly non-player entity agents also recognize and guard.
    Companion,
    /// A monster that attacks players and companions.
    Hostile,
    /// Livestock and other neutral creatures.
    Passive,
}

impl EntityCategory {
    /// Entities an agent recognizes: idle agents follow them and defense
    /// preemption protects them.
    pub const fn is_recognized(self) -> bool {
        matches!(self, Self::Player | Self::Companion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_kind_parses_case_insensitively() {
        assert_eq!("Mine".parse::<ActionKind>().ok(), Some(ActionKind::Mine));
        assert_eq!(" build ".parse::<ActionKind>().ok(), Some(ActionKind::Build));
        assert!("teleport".parse::<ActionKind>().is_err());
    }

    #[test]
    fn every_kind_roundtrips_through_its_name() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().ok(), Some(kind));
        }
    }

    #[test]
    fn only_build_defend_craft_are_protected() {
        let protected: Vec<ActionKind> = ActionKind::ALL
            .into_iter()
            .filter(|k| k.is_preemption_protected())
            .collect();
        assert_eq!(
            protected,
            vec![ActionKind::Craft, ActionKind::Build, ActionKind::Defend]
        );
    }

    #[test]
    fn center_line_goes_north_west() {
        assert_eq!(Quadrant::classify(4, 4, 4, 4), Quadrant::NW);
        assert_eq!(Quadrant::classify(5, 4, 4, 4), Quadrant::NE);
        assert_eq!(Quadrant::classify(4, 5, 4, 4), Quadrant::SW);
        assert_eq!(Quadrant::classify(5, 5, 4, 4), Quadrant::SE);
    }
}
