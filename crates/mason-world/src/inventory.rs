//! Per-agent item inventory.
//!
//! Quantities are whole item counts bounded by a carry capacity. All
//! arithmetic is checked; an empty stack is removed from the map.

use std::collections::BTreeMap;

use mason_types::MaterialId;

use crate::error::WorldError;

/// Default carry capacity: 36 slots of 64 items.
pub const DEFAULT_CARRY_CAPACITY: u32 = 2304;

/// Items carried by one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    items: BTreeMap<MaterialId, u32>,
    capacity: u32,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CARRY_CAPACITY)
    }
}

impl Inventory {
    /// Empty inventory with the given carry capacity.
    pub const fn with_capacity(capacity: u32) -> Self {
        Self {
            items: BTreeMap::new(),
            capacity,
        }
    }

    /// Total items carried. Saturates rather than overflowing.
    pub fn total(&self) -> u32 {
        self.items
            .values()
            .fold(0_u32, |acc, qty| acc.saturating_add(*qty))
    }

    /// How many of `item` are carried.
    pub fn count(&self, item: &MaterialId) -> u32 {
        self.items.get(item).copied().unwrap_or(0)
    }

    /// Whether at least `amount` of `item` is carried.
    pub fn has(&self, item: &MaterialId, amount: u32) -> bool {
        self.count(item) >= amount
    }

    /// Add items, failing if capacity would be exceeded.
    pub fn add(&mut self, item: &MaterialId, amount: u32) -> Result<(), WorldError> {
        let new_load = self
            .total()
            .checked_add(amount)
            .ok_or(WorldError::ArithmeticOverflow)?;
        if new_load > self.capacity {
            return Err(WorldError::InventoryFull {
                item: item.clone(),
                attempted: amount,
                capacity: self.capacity,
            });
        }
        let entry = self.items.entry(item.clone()).or_insert(0);
        *entry = entry
            .checked_add(amount)
            .ok_or(WorldError::ArithmeticOverflow)?;
        Ok(())
    }

    /// Remove items, failing if not enough are carried.
    pub fn remove(&mut self, item: &MaterialId, amount: u32) -> Result<(), WorldError> {
        let available = self.count(item);
        let remaining = available
            .checked_sub(amount)
            .ok_or_else(|| WorldError::InsufficientItem {
                item: item.clone(),
                requested: amount,
                available,
            })?;
        if remaining == 0 {
            self.items.remove(item);
        } else {
            self.items.insert(item.clone(), remaining);
        }
        Ok(())
    }

    /// Read-only view of all stacks.
    pub const fn items(&self) -> &BTreeMap<MaterialId, u32> {
        &self.items
    }
}
