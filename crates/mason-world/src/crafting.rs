//! Crafting recipes.
//!
//! A static recipe table mapping craftable outputs to their input materials.
//! Used by [`GridWorld::craft`](crate::GridWorld).

use std::collections::BTreeMap;

use mason_types::MaterialId;

// ---------------------------------------------------------------------------
// CraftRecipe
// ---------------------------------------------------------------------------

/// A single crafting recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CraftRecipe {
    /// The item produced.
    pub output: MaterialId,
    /// How many items one craft produces.
    pub output_quantity: u32,
    /// Input materials consumed per craft (item -> quantity).
    pub inputs: BTreeMap<MaterialId, u32>,
}

impl CraftRecipe {
    /// Number of crafts needed to produce at least `quantity` items.
    pub const fn batches_for(&self, quantity: u32) -> u32 {
        if self.output_quantity == 0 {
            return 0;
        }
        quantity.div_ceil(self.output_quantity)
    }
}

fn recipe(output: &str, output_quantity: u32, inputs: &[(&str, u32)]) -> CraftRecipe {
    CraftRecipe {
        output: MaterialId::new(output),
        output_quantity,
        inputs: inputs
            .iter()
            .map(|(name, qty)| (MaterialId::new(name), *qty))
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Recipe Table
// ---------------------------------------------------------------------------

/// Look up the recipe for an item. `None` means it is not craftable.
pub fn recipe_for(item: &MaterialId) -> Option<CraftRecipe> {
    let r = match item.as_str() {
        "oak_planks" => recipe("oak_planks", 4, &[("oak_log", 1)]),
        "stick" => recipe("stick", 4, &[("oak_planks", 2)]),
        "crafting_table" => recipe("crafting_table", 1, &[("oak_planks", 4)]),
        "torch" => recipe("torch", 4, &[("coal", 1), ("stick", 1)]),
        "furnace" => recipe("furnace", 1, &[("cobblestone", 8)]),
        "wooden_pickaxe" => recipe("wooden_pickaxe", 1, &[("oak_planks", 3), ("stick", 2)]),
        "stone_pickaxe" => recipe("stone_pickaxe", 1, &[("cobblestone", 3), ("stick", 2)]),
        "stone_sword" => recipe("stone_sword", 1, &[("cobblestone", 2), ("stick", 1)]),
        "chest" => recipe("chest", 1, &[("oak_planks", 8)]),
        _ => return None,
    };
    Some(r)
}
