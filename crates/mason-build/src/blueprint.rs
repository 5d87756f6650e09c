//! Procedural placement plans for named structures.
//!
//! The origin is the structure's minimum corner: plans extend toward +x, +y
//! and +z from it. Plans are emitted layer by layer from the ground up, but
//! callers should not rely on that; the partitioner re-sorts every section.

use mason_types::{BlockPos, MaterialId, Placement};

use crate::error::BuildError;

/// Largest accepted extent on any axis.
pub const MAX_EXTENT: u32 = 64;

/// Structures with a blueprint.
pub const STRUCTURES: [&str; 4] = ["house", "tower", "wall", "platform"];

/// Extent of a structure: `width` along x, `height` along y, `depth` along z.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlueprintSize {
    /// Extent along x.
    pub width: u32,
    /// Extent along y. For a house this counts wall layers, excluding floor
    /// and roof.
    pub height: u32,
    /// Extent along z.
    pub depth: u32,
}

impl BlueprintSize {
    /// Create a size.
    pub const fn new(width: u32, height: u32, depth: u32) -> Self {
        Self {
            width,
            height,
            depth,
        }
    }

    /// The size used when a request names none.
    pub fn default_for(structure: &str) -> Option<Self> {
        match structure {
            "house" => Some(Self::new(7, 4, 7)),
            "tower" => Some(Self::new(3, 8, 3)),
            "wall" => Some(Self::new(8, 3, 1)),
            "platform" => Some(Self::new(5, 1, 5)),
            _ => None,
        }
    }
}

/// The material used when a request names none.
pub fn default_material(structure: &str) -> Option<MaterialId> {
    let name = match structure {
        "house" | "platform" => "oak_planks",
        "tower" => "cobblestone",
        "wall" => "stone_bricks",
        _ => return None,
    };
    Some(MaterialId::new(name))
}

/// Generate the placement plan for `structure` at `origin`.
///
/// # Errors
///
/// [`BuildError::UnknownStructure`] for a structure with no blueprint, and
/// [`BuildError::InvalidDimensions`] when an extent is zero, above
/// [`MAX_EXTENT`], or too small to leave a hollow interior.
pub fn generate(
    structure: &str,
    origin: BlockPos,
    size: Option<BlueprintSize>,
    material: Option<&MaterialId>,
) -> Result<Vec<Placement>, BuildError> {
    let structure = structure.trim().to_ascii_lowercase();
    let (Some(default_size), Some(default_mat)) = (
        BlueprintSize::default_for(&structure),
        default_material(&structure),
    ) else {
        return Err(BuildError::UnknownStructure(structure));
    };
    let size = size.unwrap_or(default_size);
    let material = material.cloned().unwrap_or(default_mat);
    let extent = Extent::validate(&structure, size)?;

    let mut plan = Vec::new();
    match structure.as_str() {
        "house" => house(&mut plan, origin, extent, &material),
        "tower" => tower(&mut plan, origin, extent, &material),
        "wall" | "platform" => solid(&mut plan, origin, extent, &material),
        _ => return Err(BuildError::UnknownStructure(structure)),
    }
    Ok(plan)
}

/// A validated size in signed block units.
#[derive(Debug, Clone, Copy)]
struct Extent {
    width: i32,
    height: i32,
    depth: i32,
}

impl Extent {
    fn validate(structure: &str, size: BlueprintSize) -> Result<Self, BuildError> {
        let hollow = matches!(structure, "house" | "tower");
        let invalid = |reason: String| BuildError::InvalidDimensions {
            structure: structure.to_owned(),
            reason,
        };

        for (axis, value) in [
            ("width", size.width),
            ("height", size.height),
            ("depth", size.depth),
        ] {
            if value == 0 || value > MAX_EXTENT {
                return Err(invalid(format!("{axis} must be between 1 and {MAX_EXTENT}")));
            }
        }
        if hollow && (size.width < 3 || size.depth < 3) {
            return Err(invalid("width and depth must be at least 3".to_owned()));
        }

        let signed = |v: u32| {
            i32::try_from(v)
                .ok()
                .ok_or_else(|| invalid("extent overflow".to_owned()))
        };
        Ok(Self {
            width: signed(size.width)?,
            height: signed(size.height)?,
            depth: signed(size.depth)?,
        })
    }

    const fn on_rim(self, dx: i32, dz: i32) -> bool {
        dx == 0 || dz == 0 || dx == self.width.saturating_sub(1) || dz == self.depth.saturating_sub(1)
    }
}

fn push_layer(
    plan: &mut Vec<Placement>,
    origin: BlockPos,
    dy: i32,
    extent: Extent,
    material: &MaterialId,
    keep: impl Fn(i32, i32) -> bool,
) {
    for dz in 0..extent.depth {
        for dx in 0..extent.width {
            if keep(dx, dz) {
                plan.push(Placement::new(origin.offset(dx, dy, dz), material.clone()));
            }
        }
    }
}

/// Floor, hollow walls with a two-high door on the north face, flat roof.
fn house(plan: &mut Vec<Placement>, origin: BlockPos, extent: Extent, material: &MaterialId) {
    let door_x = extent.width / 2;
    push_layer(plan, origin, 0, extent, material, |_, _| true);
    for dy in 1..=extent.height {
        let in_doorway = dy <= 2;
        push_layer(plan, origin, dy, extent, material, |dx, dz| {
            extent.on_rim(dx, dz) && !(in_doorway && dz == 0 && dx == door_x)
        });
    }
    push_layer(
        plan,
        origin,
        extent.height.saturating_add(1),
        extent,
        material,
        |_, _| true,
    );
}

/// Hollow square shaft.
fn tower(plan: &mut Vec<Placement>, origin: BlockPos, extent: Extent, material: &MaterialId) {
    for dy in 0..extent.height {
        push_layer(plan, origin, dy, extent, material, |dx, dz| {
            extent.on_rim(dx, dz)
        });
    }
}

/// Solid box (a wall is a thin one, a platform a flat one).
fn solid(plan: &mut Vec<Placement>, origin: BlockPos, extent: Extent, material: &MaterialId) {
    for dy in 0..extent.height {
        push_layer(plan, origin, dy, extent, material, |_, _| true);
    }
}
