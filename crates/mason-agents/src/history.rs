//! Bounded record of finished actions.

use std::collections::VecDeque;

use mason_types::{ActionKind, ActionResult};

/// One finished action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    /// Executor tick on which the result was collected.
    pub tick: u64,
    /// Kind of the finished action, if the task resolved to one.
    pub kind: Option<ActionKind>,
    /// Description of what the action set out to do.
    pub description: String,
    /// How it ended.
    pub result: ActionResult,
}

/// Ring buffer of the most recent [`HistoryEntry`] values. The oldest entry
/// is evicted when capacity is reached.
#[derive(Debug, Clone)]
pub struct ActionHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl ActionHistory {
    /// Create an empty history holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest if full.
    pub fn record(&mut self, entry: HistoryEntry) {
        if self.capacity == 0 {
            return;
        }
        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Entries, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// The most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the history is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
